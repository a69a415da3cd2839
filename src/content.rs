use crate::reference::RefTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute bag carried by every content node. `data-*` keys pass through
/// to the rendered unit; the rest are normalized by the renderer.
pub type Attrs = BTreeMap<String, String>;

/// One node of the parsed scripture markup for a chapter.
///
/// The tree is immutable once deserialized from the data layer. All mutable
/// reader state (selection, highlight overlays) lives alongside it, keyed by
/// `id`/`verse_id`, never inside the tree. `id` is unique across the chapter
/// and is the join key for selection, highlighting and anchoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ContentNode {
    /// Leaf run of typeset text belonging to one verse.
    Text {
        id: String,
        verse_id: String,
        verse_number: u32,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
    },
    /// Inline span wrapping child nodes. `attrs["strong"]` optionally holds
    /// a Strong's concordance code.
    Char {
        id: String,
        verse_id: String,
        verse_number: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
        #[serde(default)]
        contents: Vec<ContentNode>,
    },
    /// Cross-reference leaf. `attrs["loc"]` encodes
    /// `"<bookAbbr> <chapter>[:<verse>]"`.
    Ref {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
    },
    /// Verse start marker. Participates in selection and notes but carries
    /// no text of its own.
    Verse {
        id: String,
        verse_id: String,
        number: u32,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
    },
    /// Block container.
    Para {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
        #[serde(default)]
        contents: Vec<ContentNode>,
    },
    /// Footnote/study-note container, rendered out-of-line. Contributes no
    /// inline text.
    Note {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        #[serde(default, skip_serializing_if = "Attrs::is_empty")]
        attrs: Attrs,
        #[serde(default)]
        contents: Vec<ContentNode>,
    },
    /// Forward-compatibility fallback: scripture data may add node kinds
    /// before this crate learns about them. The walker logs and skips these.
    #[serde(other)]
    Unknown,
}

impl ContentNode {
    pub fn id(&self) -> Option<&str> {
        match self {
            ContentNode::Text { id, .. }
            | ContentNode::Char { id, .. }
            | ContentNode::Ref { id, .. }
            | ContentNode::Verse { id, .. }
            | ContentNode::Para { id, .. }
            | ContentNode::Note { id, .. } => Some(id),
            ContentNode::Unknown => None,
        }
    }

    pub fn verse_id(&self) -> Option<&str> {
        match self {
            ContentNode::Text { verse_id, .. }
            | ContentNode::Char { verse_id, .. }
            | ContentNode::Verse { verse_id, .. } => Some(verse_id),
            _ => None,
        }
    }

    pub fn verse_number(&self) -> Option<u32> {
        match self {
            ContentNode::Text { verse_number, .. } | ContentNode::Char { verse_number, .. } => {
                Some(*verse_number)
            }
            ContentNode::Verse { number, .. } => Some(*number),
            _ => None,
        }
    }

    pub fn contents(&self) -> Option<&[ContentNode]> {
        match self {
            ContentNode::Char { contents, .. }
            | ContentNode::Para { contents, .. }
            | ContentNode::Note { contents, .. } => Some(contents),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            ContentNode::Text { attrs, .. }
            | ContentNode::Char { attrs, .. }
            | ContentNode::Ref { attrs, .. }
            | ContentNode::Verse { attrs, .. }
            | ContentNode::Para { attrs, .. }
            | ContentNode::Note { attrs, .. } => Some(attrs),
            ContentNode::Unknown => None,
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, ContentNode::Note { .. })
    }
}

/// One chapter as delivered by the content-fetching collaborator: identity,
/// the content tree and adjacent-chapter records for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter identity; highlight overlays are scoped by this and never
    /// carried across navigation.
    pub id: String,
    /// Book abbreviation used in reference titles, e.g. "John".
    pub book: String,
    pub number: u32,
    pub contents: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<RefTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<RefTarget>,
}

/// Document-order ids of every selectable node (`text`/`char`/`verse`)
/// belonging to `verse_id`. Footnote subtrees are excluded: they render
/// out-of-line and never participate in selection.
pub fn verse_content_ids(nodes: &[ContentNode], verse_id: &str) -> Vec<String> {
    let mut ids = Vec::new();
    collect_content_ids(nodes, verse_id, &mut ids);
    ids
}

fn collect_content_ids(nodes: &[ContentNode], verse_id: &str, out: &mut Vec<String>) {
    for node in nodes {
        if node.is_note() {
            continue;
        }
        if node.verse_id() == Some(verse_id) {
            if let Some(id) = node.id() {
                out.push(id.to_string());
            }
        }
        if let Some(children) = node.contents() {
            collect_content_ids(children, verse_id, out);
        }
    }
}

/// The verse's display text: every `text` leaf of the verse concatenated in
/// document order with no separator, trimmed. Footnote subtrees contribute
/// nothing.
pub fn verse_plain_text(nodes: &[ContentNode], verse_id: &str) -> String {
    let mut text = String::new();
    collect_plain_text(nodes, verse_id, &mut text);
    text.trim().to_string()
}

fn collect_plain_text(nodes: &[ContentNode], verse_id: &str, out: &mut String) {
    for node in nodes {
        if node.is_note() {
            continue;
        }
        if let ContentNode::Text {
            verse_id: vid,
            text,
            ..
        } = node
        {
            if vid == verse_id {
                out.push_str(text);
            }
        }
        if let Some(children) = node.contents() {
            collect_plain_text(children, verse_id, out);
        }
    }
}

/// Verse numbers present in the chapter, in document order of their markers.
pub fn chapter_verse_numbers(nodes: &[ContentNode]) -> Vec<u32> {
    let mut numbers = Vec::new();
    collect_verse_numbers(nodes, &mut numbers);
    numbers
}

fn collect_verse_numbers(nodes: &[ContentNode], out: &mut Vec<u32>) {
    for node in nodes {
        if let ContentNode::Verse { number, .. } = node {
            out.push(*number);
        }
        if let Some(children) = node.contents() {
            collect_verse_numbers(children, out);
        }
    }
}

/// Denormalized verse number of `verse_id`, read off the first node that
/// carries it.
pub fn verse_number_of(nodes: &[ContentNode], verse_id: &str) -> Option<u32> {
    for node in nodes {
        if node.verse_id() == Some(verse_id) {
            if let Some(number) = node.verse_number() {
                return Some(number);
            }
        }
        if let Some(children) = node.contents() {
            if let Some(number) = verse_number_of(children, verse_id) {
                return Some(number);
            }
        }
    }
    None
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_para;
    use super::*;

    #[test]
    fn test_verse_content_ids_document_order() {
        let tree = vec![sample_para()];
        assert_eq!(
            verse_content_ids(&tree, "john.3.16"),
            vec!["v16-marker", "t1", "c1", "t2"]
        );
        assert_eq!(verse_content_ids(&tree, "john.3.17"), vec!["v17-marker", "t3"]);
    }

    #[test]
    fn test_verse_plain_text_skips_footnotes() {
        let tree = vec![sample_para()];
        assert_eq!(
            verse_plain_text(&tree, "john.3.16"),
            "For God so loved the world, that he gave"
        );
        assert!(!verse_plain_text(&tree, "john.3.16").contains("footnote"));
    }

    #[test]
    fn test_chapter_verse_numbers_and_lookup() {
        let tree = vec![sample_para()];
        assert_eq!(chapter_verse_numbers(&tree), vec![16, 17]);
        assert_eq!(verse_number_of(&tree, "john.3.17"), Some(17));
        assert_eq!(verse_number_of(&tree, "john.3.99"), None);
    }

    #[test]
    fn test_deserialize_tagged_tree() {
        let json = r#"
        [
            {
                "type": "para",
                "id": "p1",
                "style": "p",
                "contents": [
                    { "type": "verse", "id": "m1", "verseId": "john.3.16", "number": 16 },
                    {
                        "type": "text",
                        "id": "t1",
                        "verseId": "john.3.16",
                        "verseNumber": 16,
                        "text": "For God so loved the world"
                    },
                    {
                        "type": "ref",
                        "id": "r1",
                        "attrs": { "loc": "GEN 1:1" }
                    }
                ]
            }
        ]"#;
        let tree: Vec<ContentNode> = serde_json::from_str(json).unwrap();
        assert_eq!(tree.len(), 1);
        let para = &tree[0];
        assert_eq!(para.id(), Some("p1"));
        let children = para.contents().unwrap();
        assert_eq!(children.len(), 3);
        assert!(matches!(children[0], ContentNode::Verse { number: 16, .. }));
        assert_eq!(
            children[2].attrs().unwrap().get("loc").map(String::as_str),
            Some("GEN 1:1")
        );
    }

    #[test]
    fn test_unknown_node_kind_deserializes() {
        let json = r#"{ "type": "sidebar", "id": "s1", "contents": [] }"#;
        let node: ContentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node, ContentNode::Unknown);
        assert_eq!(node.id(), None);
    }
}
