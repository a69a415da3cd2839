use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reader-authored study note attached to a verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub verse_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(verse_id: &str, content: &str) -> Self {
        Self {
            verse_id: verse_id.to_string(),
            content: content.to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Verse-indexed note lookup for one chapter.
///
/// Notes keep their incoming order per verse, and a verse with several
/// notes exposes all of them, not just the first.
#[derive(Debug, Clone, Default)]
pub struct ChapterNotes {
    notes: Vec<Note>,
    by_verse: HashMap<String, Vec<usize>>,
}

impl ChapterNotes {
    pub fn new(notes: Vec<Note>) -> Self {
        let mut index = Self::default();
        for note in notes {
            index.add(note);
        }
        index
    }

    pub fn add(&mut self, note: Note) {
        let idx = self.notes.len();
        self.by_verse
            .entry(note.verse_id.clone())
            .or_default()
            .push(idx);
        self.notes.push(note);
    }

    pub fn for_verse(&self, verse_id: &str) -> Vec<&Note> {
        self.by_verse
            .get(verse_id)
            .map(|indices| indices.iter().map(|&i| &self.notes[i]).collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_notes_for_a_verse_are_reachable() {
        let notes = ChapterNotes::new(vec![
            Note::new("john.3.16", "first"),
            Note::new("john.3.17", "other verse"),
            Note::new("john.3.16", "second"),
        ]);

        let for_16 = notes.for_verse("john.3.16");
        assert_eq!(for_16.len(), 2);
        assert_eq!(for_16[0].content, "first");
        assert_eq!(for_16[1].content, "second");
        assert!(notes.for_verse("john.3.99").is_empty());
    }

    #[test]
    fn test_add_after_construction() {
        let mut notes = ChapterNotes::default();
        assert!(notes.is_empty());
        notes.add(Note::new("john.3.16", "late addition"));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.for_verse("john.3.16")[0].content, "late addition");
    }
}
