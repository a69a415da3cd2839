use crate::content::{self, ContentNode};
use crate::reference;
use log::warn;
use serde::{Deserialize, Serialize};

/// One verse the reader has activated, captured at activation time.
///
/// `content_ids` are the rendered node ids sharing the verse's `verse_id`,
/// in document order; `text` is the verse's display text read at the same
/// moment. Both are snapshots: the tree is immutable for the life of a
/// chapter, so they never go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVerseInfo {
    pub verse_id: String,
    pub number: u32,
    pub content_ids: Vec<String>,
    pub text: String,
}

/// Ordered set of selected verses for one reading session.
///
/// Entries keep activation order; verses selected out of chapter order (deep
/// links) are supported, and sorting for display is derived by the passage
/// formatter, never stored. Mutation happens only on the interaction thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerseSelection {
    entries: Vec<SelectedVerseInfo>,
}

impl VerseSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the verse if absent, deselects it if present.
    ///
    /// Removal is stable: remaining entries keep their order. Returns true
    /// when the verse is selected after the call. Toggling a verse the tree
    /// does not contain is a logged no-op.
    pub fn toggle(&mut self, nodes: &[ContentNode], verse_id: &str) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.verse_id == verse_id) {
            self.entries.remove(pos);
            return false;
        }

        let Some(number) = content::verse_number_of(nodes, verse_id) else {
            warn!("toggle for verse {verse_id} not present in chapter, ignoring");
            return false;
        };
        self.entries.push(SelectedVerseInfo {
            verse_id: verse_id.to_string(),
            number,
            content_ids: content::verse_content_ids(nodes, verse_id),
            text: content::verse_plain_text(nodes, verse_id),
        });
        true
    }

    pub fn is_selected(&self, verse_id: &str) -> bool {
        self.entries.iter().any(|e| e.verse_id == verse_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in activation order.
    pub fn entries(&self) -> &[SelectedVerseInfo] {
        &self.entries
    }

    /// Order-preserving flatten of every entry's content ids. Used to test
    /// whether an exact set of nodes is fully highlighted.
    pub fn selected_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.content_ids.iter().cloned())
            .collect()
    }

    /// Verse ids in activation order, the unit persistence intents speak in.
    pub fn verse_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.verse_id.clone()).collect()
    }

    /// Reconstructed passage text with `gap_marker` at discontinuities.
    pub fn passage_text(&self, gap_marker: &str) -> String {
        reference::passage_text(&self.entries, gap_marker)
    }

    /// Reference title such as `"John 3:16-18, 20"`.
    pub fn title(&self, book: &str, chapter: u32) -> String {
        reference::passage_title(book, chapter, &self.entries)
    }

    /// Explicit reset, used on navigation away from the chapter.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::john3_tree;

    #[test]
    fn test_toggle_selects_and_snapshots() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();

        assert!(selection.toggle(&tree, "john.3.16"));
        assert!(selection.is_selected("john.3.16"));
        let entry = &selection.entries()[0];
        assert_eq!(entry.number, 16);
        assert_eq!(entry.content_ids, vec!["m16", "t16"]);
        assert_eq!(entry.text, "For God so loved the world.");
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        selection.toggle(&tree, "john.3.16");
        selection.toggle(&tree, "john.3.20");
        selection.toggle(&tree, "john.3.17");
        let before = selection.clone();

        selection.toggle(&tree, "john.3.18");
        selection.toggle(&tree, "john.3.18");

        assert_eq!(selection, before);
    }

    #[test]
    fn test_removal_is_stable() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        selection.toggle(&tree, "john.3.20");
        selection.toggle(&tree, "john.3.16");
        selection.toggle(&tree, "john.3.18");

        assert!(!selection.toggle(&tree, "john.3.16"));
        let ids: Vec<&str> = selection.entries().iter().map(|e| e.verse_id.as_str()).collect();
        assert_eq!(ids, vec!["john.3.20", "john.3.18"]);
    }

    #[test]
    fn test_selected_ids_flattens_in_order_without_duplicates() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        selection.toggle(&tree, "john.3.20");
        selection.toggle(&tree, "john.3.16");

        let ids = selection.selected_ids();
        assert_eq!(ids, vec!["m20", "t20", "m16", "t16"]);

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);

        // Every entry's content ids appear, in entry order.
        for entry in selection.entries() {
            for id in &entry.content_ids {
                assert!(ids.contains(id));
            }
        }
    }

    #[test]
    fn test_unknown_verse_is_a_no_op() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        assert!(!selection.toggle(&tree, "john.3.99"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_out_of_order_selection_derives_sorted_artifacts() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        selection.toggle(&tree, "john.3.20");
        selection.toggle(&tree, "john.3.16");
        selection.toggle(&tree, "john.3.17");

        assert_eq!(selection.title("John", 3), "John 3:16-17, 20");
        let text = selection.passage_text("... ");
        assert!(text.starts_with("16 For God so loved the world."));
        assert!(text.contains("... 20 "));
        // Stored order still reflects activation.
        assert_eq!(selection.entries()[0].number, 20);
    }

    #[test]
    fn test_clear() {
        let tree = john3_tree();
        let mut selection = VerseSelection::new();
        selection.toggle(&tree, "john.3.16");
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.passage_text("... "), "");
        assert_eq!(selection.title("John", 3), "");
    }
}
