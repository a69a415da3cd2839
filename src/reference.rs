use crate::error::ContentError;
use crate::selection::SelectedVerseInfo;
use serde::{Deserialize, Serialize};

/// A navigable scripture location resolved from a `ref` node's `loc`
/// attribute or from a chapter's prev/next records. The navigation
/// collaborator turns these into routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefTarget {
    pub book: String,
    pub chapter: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse: Option<u32>,
}

/// Original language of a Strong's concordance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginalLanguage {
    Hebrew,
    Greek,
}

/// A parsed Strong's concordance reference from a `char` node's `strong`
/// attribute, e.g. `"H1234"` or `"G77"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongsRef {
    pub language: OriginalLanguage,
    pub number: String,
}

/// Parses a `loc` value of the form `"<bookAbbr> <chapter>[:<verse>]"`.
///
/// The split is on the first space, then on `:`. A missing or non-numeric
/// chapter is an error the caller surfaces rather than producing a broken
/// link.
pub fn parse_loc(loc: &str) -> Result<RefTarget, ContentError> {
    let malformed = || ContentError::MalformedLoc(loc.to_string());

    let (book, chapter_and_verse) = loc.trim().split_once(' ').ok_or_else(malformed)?;
    if book.is_empty() {
        return Err(malformed());
    }

    let (chapter, verse) = match chapter_and_verse.split_once(':') {
        Some((chapter, verse)) => (chapter, Some(verse)),
        None => (chapter_and_verse, None),
    };
    let chapter: u32 = chapter.trim().parse().map_err(|_| malformed())?;
    let verse = match verse {
        Some(raw) => Some(raw.trim().parse().map_err(|_| malformed())?),
        None => None,
    };

    Ok(RefTarget {
        book: book.to_string(),
        chapter,
        verse,
    })
}

/// Parses a Strong's code: a leading `H` means Hebrew, any other letter
/// Greek; the number is the code with the letter stripped.
pub fn parse_strongs(code: &str) -> Result<StrongsRef, ContentError> {
    let invalid = || ContentError::InvalidStrongs(code.to_string());

    let mut chars = code.trim().chars();
    let letter = chars.next().ok_or_else(invalid)?;
    if !letter.is_ascii_alphabetic() {
        return Err(invalid());
    }
    let number: String = chars.collect();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let language = if letter.eq_ignore_ascii_case(&'H') {
        OriginalLanguage::Hebrew
    } else {
        OriginalLanguage::Greek
    };

    Ok(StrongsRef { language, number })
}

/// Collapses verse numbers into the compact human sequence used in
/// reference titles: contiguous runs become ranges, singletons stay
/// singletons, comma-space separated. `[16, 17, 18, 20]` -> `"16-18, 20"`.
///
/// The input is sorted and de-duplicated on a copy; callers may pass
/// numbers in activation order.
pub fn format_verse_sequence(numbers: &[u32]) -> String {
    let mut sorted: Vec<u32> = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i];
        let mut end = start;
        while i + 1 < sorted.len() && sorted[i + 1] == end + 1 {
            end = sorted[i + 1];
            i += 1;
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
        i += 1;
    }
    parts.join(", ")
}

/// Reconstructs the display text of a selection, in canonical verse order.
///
/// Works on a sorted copy; the caller's insertion order is untouched since
/// `selected_ids` relies on it. `gap_marker` is inserted before a verse
/// whose number does not follow its predecessor, signalling the
/// discontinuity to the reader. Empty selection yields an empty string.
pub fn passage_text(verses: &[SelectedVerseInfo], gap_marker: &str) -> String {
    let mut sorted: Vec<&SelectedVerseInfo> = verses.iter().collect();
    sorted.sort_by_key(|v| v.number);

    let mut parts: Vec<String> = Vec::with_capacity(sorted.len());
    let mut previous: Option<u32> = None;
    for verse in sorted {
        let gap = match previous {
            Some(prev) if prev + 1 != verse.number => gap_marker,
            _ => "",
        };
        parts.push(format!("{gap}{} {}", verse.number, verse.text));
        previous = Some(verse.number);
    }
    parts.join(" ").trim().to_string()
}

/// Human-readable reference title for a selection, e.g.
/// `"John 3:16-18, 20"`. Empty selection yields an empty string.
pub fn passage_title(book: &str, chapter: u32, verses: &[SelectedVerseInfo]) -> String {
    if verses.is_empty() {
        return String::new();
    }
    let numbers: Vec<u32> = verses.iter().map(|v| v.number).collect();
    format!("{book} {chapter}:{}", format_verse_sequence(&numbers))
}
