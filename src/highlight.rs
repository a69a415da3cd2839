use crate::error::ContentError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One persisted highlight as fetched for the chapter: a verse and the hex
/// color the reader chose for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub verse_id: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
enum MutationKind {
    Add { rgba: String },
    Remove,
}

/// An optimistic mutation that is outstanding against the persistence
/// collaborator. The sequence number records issue order; conflicts between
/// pending mutations for the same verse are won by the most recent.
#[derive(Debug, Clone, PartialEq)]
struct PendingMutation {
    seq: u64,
    verse_ids: Vec<String>,
    kind: MutationKind,
}

/// Composites persisted highlights with in-flight optimistic mutations into
/// the single effective overlay color per verse.
///
/// Layering, lowest to highest priority: persisted data, then pending
/// mutations in issue order (so a delete issued after an add wins for the
/// same verse while both are outstanding). When nothing is pending,
/// persisted data alone governs. An overlay is scoped to one chapter and is
/// rebuilt from scratch on navigation; optimistic state never crosses
/// chapters.
#[derive(Debug, Clone)]
pub struct HighlightOverlay {
    chapter_id: String,
    persisted: Vec<Highlight>,
    pending: Vec<PendingMutation>,
    next_seq: u64,
    alpha: f32,
}

impl HighlightOverlay {
    pub fn new(chapter_id: &str, alpha: f32) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            persisted: Vec::new(),
            pending: Vec::new(),
            next_seq: 0,
            alpha,
        }
    }

    pub fn with_persisted(chapter_id: &str, highlights: Vec<Highlight>, alpha: f32) -> Self {
        let mut overlay = Self::new(chapter_id, alpha);
        overlay.persisted = highlights;
        overlay
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter_id
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Replaces the persisted layer wholesale, as done after the external
    /// store confirms a mutation and the chapter's highlights are refetched.
    pub fn set_persisted(&mut self, highlights: Vec<Highlight>) {
        self.persisted = highlights;
    }

    /// Registers an optimistic "add highlight" for the given verses.
    ///
    /// The hex color is validated here, at mutation creation time, so
    /// resolution can never fail. Returns the mutation's sequence id for the
    /// eventual `settle`/`reject`.
    pub fn begin_add(
        &mut self,
        verse_ids: Vec<String>,
        hex_color: &str,
    ) -> Result<u64, ContentError> {
        let rgba = hex_to_rgba(hex_color, self.alpha)?;
        Ok(self.push_pending(verse_ids, MutationKind::Add { rgba }))
    }

    /// Registers an optimistic "remove highlight" for the given verses.
    /// Delete wins over stale adds and persisted state while pending.
    pub fn begin_remove(&mut self, verse_ids: Vec<String>) -> u64 {
        self.push_pending(verse_ids, MutationKind::Remove)
    }

    fn push_pending(&mut self, verse_ids: Vec<String>, kind: MutationKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingMutation {
            seq,
            verse_ids,
            kind,
        });
        seq
    }

    /// Drops a settled mutation's optimistic entry. The caller is expected
    /// to refetch persisted highlights and call `set_persisted`.
    pub fn settle(&mut self, seq: u64) {
        self.pending.retain(|m| m.seq != seq);
    }

    /// Rolls back a rejected mutation so the overlay reflects the
    /// last-known-good persisted state for the affected verses.
    pub fn reject(&mut self, seq: u64) {
        let before = self.pending.len();
        self.pending.retain(|m| m.seq != seq);
        if self.pending.len() < before {
            warn!(
                "highlight mutation {seq} rejected, rolled back optimistic overlay \
                 for chapter {}",
                self.chapter_id
            );
        }
    }

    /// The effective color for one verse, or `None` for no overlay.
    pub fn resolve(&self, verse_id: &str) -> Option<String> {
        self.resolved().remove(verse_id)
    }

    /// The full verse-id to RGBA map after compositing. At most one color
    /// per verse.
    pub fn resolved(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for highlight in &self.persisted {
            match hex_to_rgba(&highlight.color, self.alpha) {
                Ok(rgba) => {
                    map.insert(highlight.verse_id.clone(), rgba);
                }
                Err(err) => warn!(
                    "skipping persisted highlight for {}: {err}",
                    highlight.verse_id
                ),
            }
        }
        // Pending entries are stored in issue order, so replaying them makes
        // the most recently issued mutation's intent win per verse.
        for mutation in &self.pending {
            for verse_id in &mutation.verse_ids {
                match &mutation.kind {
                    MutationKind::Add { rgba } => {
                        map.insert(verse_id.clone(), rgba.clone());
                    }
                    MutationKind::Remove => {
                        map.remove(verse_id);
                    }
                }
            }
        }
        map
    }
}

/// Converts `#RRGGBB` (leading `#` optional, case-insensitive) to an
/// `rgba(r, g, b, a)` string with the fixed overlay alpha, keeping the
/// underlying text legible regardless of theme.
pub fn hex_to_rgba(hex: &str, alpha: f32) -> Result<String, ContentError> {
    let raw = hex.trim().trim_start_matches('#');
    if raw.len() != 6 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ContentError::InvalidColor(hex.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&raw[range], 16)
            .map_err(|_| ContentError::InvalidColor(hex.to_string()))
    };
    let r = channel(0..2)?;
    let g = channel(2..4)?;
    let b = channel(4..6)?;
    Ok(format!("rgba({r}, {g}, {b}, {alpha})"))
}
