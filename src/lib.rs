//! Structured scripture content model and verse-selection/highlight engine.
//!
//! The chapter tree arrives from a content-fetching collaborator as a
//! tagged-union JSON payload; everything mutable (selection, highlight
//! overlays, notes) lives alongside the immutable tree, keyed by node and
//! verse ids. [`session::ChapterSession`] ties the pieces together for one
//! chapter of reading.

pub mod content;
pub mod error;
pub mod highlight;
pub mod notes;
pub mod reference;
pub mod render;
pub mod selection;
pub mod session;
pub mod settings;

pub use content::{Chapter, ContentNode};
pub use error::ContentError;
pub use highlight::{Highlight, HighlightOverlay};
pub use notes::{ChapterNotes, Note};
pub use reference::{RefTarget, StrongsRef};
pub use render::{RenderContext, RenderedNode};
pub use selection::{SelectedVerseInfo, VerseSelection};
pub use session::{ChapterSession, StoreRequest};
