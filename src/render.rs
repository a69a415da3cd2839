use crate::content::{Attrs, ContentNode};
use crate::notes::{ChapterNotes, Note};
use crate::reference::{self, RefTarget, StrongsRef};
use log::warn;
use std::collections::{BTreeMap, HashMap};

/// Shared context threaded down the walk. Everything the renderer needs is
/// an explicit parameter here; deep descendants never reach for ambient
/// state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Resolved verse-id to RGBA overlay map from the highlight compositor.
    pub highlights: Option<&'a HashMap<String, String>>,
    /// The chapter's note index, for verse-marker affordances.
    pub notes: Option<&'a ChapterNotes>,
    /// Caller-supplied style class combined with each node's own style.
    pub style: Option<&'a str>,
}

/// Discriminant of a rendered unit, mirroring the content node kinds that
/// survive rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderedKind {
    Text,
    Char,
    Ref,
    Verse,
    Para,
    Note,
}

/// Verse-marker affordance: the navigable number plus every note attached
/// to the verse.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseMarker {
    pub number: u32,
    pub notes: Vec<Note>,
}

/// One rendered unit per content node: the presentation layer consumes
/// these without ever touching the raw tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub id: String,
    pub kind: RenderedKind,
    /// Leaf text for `Text` nodes.
    pub text: Option<String>,
    /// Node style combined with the context's style passthrough.
    pub style: Option<String>,
    /// Attrs normalized to `data-*` keys.
    pub attrs: BTreeMap<String, String>,
    /// Effective highlight color (RGBA) for the node's verse, if any.
    pub overlay: Option<String>,
    /// Present on `Verse` units.
    pub marker: Option<VerseMarker>,
    /// Resolved cross-reference for `Ref` units; omitted when `loc` is
    /// malformed.
    pub link: Option<RefTarget>,
    /// Strong's affordance for `Char` units carrying a `strong` attr.
    pub strongs: Option<StrongsRef>,
    /// True for footnote containers, which render out-of-line and
    /// contribute no inline text.
    pub out_of_line: bool,
    pub children: Vec<RenderedNode>,
}

impl RenderedNode {
    fn new(id: &str, kind: RenderedKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            text: None,
            style: None,
            attrs: BTreeMap::new(),
            overlay: None,
            marker: None,
            link: None,
            strongs: None,
            out_of_line: false,
            children: Vec::new(),
        }
    }
}

/// Walks a content tree and produces one rendered unit per node, recursing
/// into containers. Unknown node kinds are skipped with a diagnostic; a new
/// content payload must never abort the rendering of its siblings.
pub fn render_nodes(nodes: &[ContentNode], ctx: &RenderContext) -> Vec<RenderedNode> {
    nodes
        .iter()
        .filter_map(|node| render_node(node, ctx))
        .collect()
}

fn render_node(node: &ContentNode, ctx: &RenderContext) -> Option<RenderedNode> {
    match node {
        ContentNode::Text {
            id,
            verse_id,
            text,
            style,
            attrs,
            ..
        } => {
            let mut unit = base_unit(id, RenderedKind::Text, style, attrs, ctx);
            unit.text = Some(text.clone());
            unit.overlay = lookup_overlay(ctx, verse_id);
            Some(unit)
        }
        ContentNode::Char {
            id,
            verse_id,
            style,
            attrs,
            contents,
            ..
        } => {
            let mut unit = base_unit(id, RenderedKind::Char, style, attrs, ctx);
            unit.overlay = lookup_overlay(ctx, verse_id);
            if let Some(code) = attrs.get("strong") {
                match reference::parse_strongs(code) {
                    Ok(strongs) => unit.strongs = Some(strongs),
                    Err(err) => warn!("char node {id}: {err}"),
                }
            }
            unit.children = render_nodes(contents, ctx);
            Some(unit)
        }
        ContentNode::Ref { id, style, attrs } => {
            let mut unit = base_unit(id, RenderedKind::Ref, style, attrs, ctx);
            match attrs.get("loc") {
                Some(loc) => match reference::parse_loc(loc) {
                    Ok(target) => unit.link = Some(target),
                    // Link omitted rather than rendering a broken one;
                    // siblings are unaffected.
                    Err(err) => warn!("ref node {id}: {err}"),
                },
                None => warn!("ref node {id} has no loc attribute"),
            }
            Some(unit)
        }
        ContentNode::Verse {
            id,
            verse_id,
            number,
            attrs,
        } => {
            let mut unit = base_unit(id, RenderedKind::Verse, &None, attrs, ctx);
            unit.overlay = lookup_overlay(ctx, verse_id);
            let notes = ctx
                .notes
                .map(|n| n.for_verse(verse_id).into_iter().cloned().collect())
                .unwrap_or_default();
            unit.marker = Some(VerseMarker {
                number: *number,
                notes,
            });
            Some(unit)
        }
        ContentNode::Para {
            id,
            style,
            attrs,
            contents,
        } => {
            let mut unit = base_unit(id, RenderedKind::Para, style, attrs, ctx);
            unit.children = render_nodes(contents, ctx);
            Some(unit)
        }
        ContentNode::Note {
            id,
            style,
            attrs,
            contents,
        } => {
            let mut unit = base_unit(id, RenderedKind::Note, style, attrs, ctx);
            unit.out_of_line = true;
            unit.children = render_nodes(contents, ctx);
            Some(unit)
        }
        ContentNode::Unknown => {
            warn!("skipping content node of unknown kind");
            None
        }
    }
}

fn base_unit(
    id: &str,
    kind: RenderedKind,
    style: &Option<String>,
    attrs: &Attrs,
    ctx: &RenderContext,
) -> RenderedNode {
    let mut unit = RenderedNode::new(id, kind);
    unit.style = combine_styles(ctx.style, style.as_deref());
    unit.attrs = normalize_attrs(attrs);
    unit
}

fn lookup_overlay(ctx: &RenderContext, verse_id: &str) -> Option<String> {
    ctx.highlights.and_then(|map| map.get(verse_id).cloned())
}

fn combine_styles(passthrough: Option<&str>, own: Option<&str>) -> Option<String> {
    match (own, passthrough) {
        (Some(own), Some(passthrough)) => Some(format!("{own} {passthrough}")),
        (Some(own), None) => Some(own.to_string()),
        (None, Some(passthrough)) => Some(passthrough.to_string()),
        (None, None) => None,
    }
}

/// Prefixes attr keys with `data-` unless already prefixed. Deterministic
/// and idempotent: normalizing an already-normalized map is the identity.
/// The source node is never mutated.
pub fn normalize_attrs(attrs: &Attrs) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|(key, value)| {
            let key = if key.starts_with("data-") {
                key.clone()
            } else {
                format!("data-{key}")
            };
            (key, value.clone())
        })
        .collect()
}
