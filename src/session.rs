use crate::content::Chapter;
use crate::error::ContentError;
use crate::highlight::{Highlight, HighlightOverlay};
use crate::notes::{ChapterNotes, Note};
use crate::reference::RefTarget;
use crate::render::{self, RenderContext, RenderedNode};
use crate::selection::VerseSelection;
use crate::settings;
use log::debug;

/// Intent emitted toward the persistence collaborator. The core only needs
/// these to accept a verse-id list and eventually settle or reject; it
/// prescribes no transport.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    AddHighlights { verse_ids: Vec<String>, color: String },
    RemoveHighlights { verse_ids: Vec<String> },
    AddNote { verse_id: String, content: String },
    AddBookmark { target: RefTarget },
}

/// One chapter's reading state: the immutable content tree plus the mutable
/// selection, highlight overlay and note index that live alongside it.
///
/// Everything here runs on the interaction thread. Persistence is
/// fire-and-forget: mutating methods return a [`StoreRequest`] for the
/// external store and apply the optimistic overlay immediately; `settle`
/// and `reject` reconcile once the store answers.
pub struct ChapterSession {
    chapter: Chapter,
    selection: VerseSelection,
    overlay: HighlightOverlay,
    notes: ChapterNotes,
    gap_marker: String,
}

impl ChapterSession {
    pub fn new(chapter: Chapter, highlights: Vec<Highlight>, notes: Vec<Note>) -> Self {
        let config = settings::current();
        let overlay = HighlightOverlay::with_persisted(&chapter.id, highlights, config.overlay_alpha);
        Self {
            chapter,
            selection: VerseSelection::new(),
            overlay,
            notes: ChapterNotes::new(notes),
            gap_marker: config.gap_marker,
        }
    }

    pub fn chapter(&self) -> &Chapter {
        &self.chapter
    }

    pub fn selection(&self) -> &VerseSelection {
        &self.selection
    }

    pub fn overlay(&self) -> &HighlightOverlay {
        &self.overlay
    }

    pub fn notes(&self) -> &ChapterNotes {
        &self.notes
    }

    /// Adjacent-chapter record for the navigation collaborator.
    pub fn previous(&self) -> Option<&RefTarget> {
        self.chapter.previous.as_ref()
    }

    pub fn next(&self) -> Option<&RefTarget> {
        self.chapter.next.as_ref()
    }

    pub fn toggle_verse(&mut self, verse_id: &str) -> bool {
        self.selection.toggle(&self.chapter.contents, verse_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.selected_ids()
    }

    /// Reconstructed display text of the selection, passed verbatim to the
    /// copy/share/AI collaborators.
    pub fn selected_text(&self) -> String {
        self.selection.passage_text(&self.gap_marker)
    }

    /// Reference title of the selection, e.g. `"John 3:16-18, 20"`.
    pub fn selected_title(&self) -> String {
        self.selection.title(&self.chapter.book, self.chapter.number)
    }

    /// Applies an optimistic highlight to the selected verses and returns
    /// the persistence intent, or `None` when nothing is selected. The
    /// color is validated before any state changes.
    pub fn highlight_selection(
        &mut self,
        color: &str,
    ) -> Result<Option<(u64, StoreRequest)>, ContentError> {
        let verse_ids = self.selection.verse_ids();
        if verse_ids.is_empty() {
            return Ok(None);
        }
        let seq = self.overlay.begin_add(verse_ids.clone(), color)?;
        debug!("optimistic highlight {seq} over {} verses", verse_ids.len());
        Ok(Some((
            seq,
            StoreRequest::AddHighlights {
                verse_ids,
                color: color.to_string(),
            },
        )))
    }

    /// Optimistically removes highlights from the selected verses.
    pub fn unhighlight_selection(&mut self) -> Option<(u64, StoreRequest)> {
        let verse_ids = self.selection.verse_ids();
        if verse_ids.is_empty() {
            return None;
        }
        let seq = self.overlay.begin_remove(verse_ids.clone());
        Some((seq, StoreRequest::RemoveHighlights { verse_ids }))
    }

    /// Records a note locally so it is immediately reachable from the
    /// verse's marker, and returns the persistence intent.
    pub fn add_note(&mut self, verse_id: &str, content: &str) -> StoreRequest {
        self.notes.add(Note::new(verse_id, content));
        StoreRequest::AddNote {
            verse_id: verse_id.to_string(),
            content: content.to_string(),
        }
    }

    /// Bookmark intent for the first selected verse, or the chapter itself
    /// when nothing is selected.
    pub fn bookmark(&self) -> StoreRequest {
        let verse = self.selection.entries().first().map(|e| e.number);
        StoreRequest::AddBookmark {
            target: RefTarget {
                book: self.chapter.book.clone(),
                chapter: self.chapter.number,
                verse,
            },
        }
    }

    pub fn settle(&mut self, seq: u64) {
        self.overlay.settle(seq);
    }

    pub fn reject(&mut self, seq: u64) {
        self.overlay.reject(seq);
    }

    /// Replaces the persisted highlight layer after a refetch.
    pub fn set_persisted_highlights(&mut self, highlights: Vec<Highlight>) {
        self.overlay.set_persisted(highlights);
    }

    /// Renders the chapter with the current overlay and note state.
    pub fn render(&self) -> Vec<RenderedNode> {
        let highlights = self.overlay.resolved();
        let ctx = RenderContext {
            highlights: Some(&highlights),
            notes: Some(&self.notes),
            style: None,
        };
        render::render_nodes(&self.chapter.contents, &ctx)
    }

    /// Navigates to another chapter. Selection, notes and any in-flight
    /// optimistic overlay are dropped with the old chapter; overlays are
    /// scoped by chapter identity and never carried across navigation.
    pub fn navigate(&mut self, chapter: Chapter, highlights: Vec<Highlight>, notes: Vec<Note>) {
        debug!("navigating {} -> {}", self.chapter.id, chapter.id);
        *self = Self::new(chapter, highlights, notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::john3_chapter;

    fn session() -> ChapterSession {
        ChapterSession::new(john3_chapter(), Vec::new(), Vec::new())
    }

    fn gold(verse_id: &str) -> Highlight {
        Highlight {
            verse_id: verse_id.to_string(),
            color: "#FFD700".to_string(),
        }
    }

    #[test]
    fn test_selection_to_artifacts_cycle() {
        let mut session = session();
        assert_eq!(session.selected_text(), "");
        assert_eq!(session.selected_title(), "");

        session.toggle_verse("john.3.16");
        session.toggle_verse("john.3.18");
        session.toggle_verse("john.3.20");

        assert_eq!(session.selected_title(), "John 3:16, 18, 20");
        let text = session.selected_text();
        assert!(text.starts_with("16 For God so loved the world."));
        assert_eq!(text.matches("... ").count(), 2);

        session.toggle_verse("john.3.16");
        session.toggle_verse("john.3.18");
        session.toggle_verse("john.3.20");
        assert_eq!(session.selected_text(), "");
    }

    #[test]
    fn test_highlight_selection_emits_intent_and_overlay() {
        let mut session = session();
        session.toggle_verse("john.3.16");

        let (seq, request) = session.highlight_selection("#FFD700").unwrap().unwrap();
        assert_eq!(
            request,
            StoreRequest::AddHighlights {
                verse_ids: vec!["john.3.16".to_string()],
                color: "#FFD700".to_string(),
            }
        );
        assert!(session.overlay().resolve("john.3.16").is_some());

        // Store confirms: optimistic layer drops, refetched data governs.
        session.settle(seq);
        session.set_persisted_highlights(vec![gold("john.3.16")]);
        assert_eq!(
            session.overlay().resolve("john.3.16").unwrap(),
            "rgba(255, 215, 0, 0.55)"
        );
    }

    #[test]
    fn test_highlight_with_empty_selection_is_a_no_op() {
        let mut session = session();
        assert_eq!(session.highlight_selection("#FFD700").unwrap(), None);
        assert_eq!(session.unhighlight_selection(), None);
    }

    #[test]
    fn test_reject_rolls_back_to_persisted() {
        let mut session =
            ChapterSession::new(john3_chapter(), vec![gold("john.3.16")], Vec::new());
        session.toggle_verse("john.3.16");

        let (seq, _) = session.unhighlight_selection().unwrap();
        assert_eq!(session.overlay().resolve("john.3.16"), None);

        session.reject(seq);
        assert!(session.overlay().resolve("john.3.16").is_some());
    }

    #[test]
    fn test_render_threads_overlay_and_notes() {
        let mut session = session();
        session.add_note("john.3.16", "ponder this");
        session.toggle_verse("john.3.16");
        session.highlight_selection("#FFD700").unwrap();

        let rendered = session.render();
        let para = &rendered[0];
        let marker = para
            .children
            .iter()
            .find(|n| n.id == "m16")
            .and_then(|n| n.marker.as_ref())
            .unwrap();
        assert_eq!(marker.notes.len(), 1);
        let t16 = para.children.iter().find(|n| n.id == "t16").unwrap();
        assert!(t16.overlay.is_some());
    }

    #[test]
    fn test_navigation_drops_selection_and_pending_overlay() {
        let mut session = session();
        session.toggle_verse("john.3.16");
        session.highlight_selection("#FFD700").unwrap();
        assert!(session.overlay().has_pending());

        let mut next = john3_chapter();
        next.id = "john.4".to_string();
        next.number = 4;
        session.navigate(next, Vec::new(), Vec::new());

        assert!(session.selection().is_empty());
        assert!(!session.overlay().has_pending());
        assert_eq!(session.overlay().chapter_id(), "john.4");
        assert_eq!(session.overlay().resolve("john.3.16"), None);
    }

    #[test]
    fn test_bookmark_targets_first_selected_verse() {
        let mut session = session();
        assert_eq!(
            session.bookmark(),
            StoreRequest::AddBookmark {
                target: RefTarget {
                    book: "John".to_string(),
                    chapter: 3,
                    verse: None,
                }
            }
        );

        session.toggle_verse("john.3.18");
        session.toggle_verse("john.3.16");
        assert_eq!(
            session.bookmark(),
            StoreRequest::AddBookmark {
                target: RefTarget {
                    book: "John".to_string(),
                    chapter: 3,
                    verse: Some(18),
                }
            }
        );
    }

    #[test]
    fn test_navigation_records_exposed() {
        let session = session();
        assert_eq!(session.previous().unwrap().chapter, 2);
        assert_eq!(session.next().unwrap().chapter, 4);
    }
}
