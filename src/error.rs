use thiserror::Error;

/// Errors produced while interpreting chapter content.
///
/// All of these are recoverable: the renderer logs and degrades (skipped
/// node, omitted link) instead of aborting sibling rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    /// A `ref` node's `loc` attribute did not contain a book and chapter.
    #[error("malformed loc reference {0:?}")]
    MalformedLoc(String),

    /// A `char` node's `strong` attribute was not a concordance code.
    #[error("invalid Strong's code {0:?}")]
    InvalidStrongs(String),

    /// A highlight color was not a 6-digit hex value.
    #[error("invalid hex color {0:?}")]
    InvalidColor(String),
}
