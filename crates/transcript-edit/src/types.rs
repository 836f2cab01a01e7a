/// One recognized (or hand-typed) word with its slice of the segment's
/// timeline. Times are seconds. A word belongs to exactly one segment;
/// split/merge move words wholesale, they never copy or re-time them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub speaker_id: Option<String>,
    /// `None` for words imported without a score. Hand-authored words are
    /// always `Some(1.0)`.
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// A contiguous transcript span with one speaker and per-word timestamps.
///
/// Invariants maintained by every operation in this crate:
/// - `words` partitions `[start, end]` into contiguous, non-decreasing
///   sub-intervals;
/// - `text` is the whitespace-joined form of the word texts.
///
/// Segments arrive caller-ordered by `start` and non-overlapping; this crate
/// never re-sorts them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Segment {
    pub id: String,
    #[serde(default)]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub words: Vec<Word>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub bookmarked: bool,
}

impl Segment {
    /// Whitespace-joined word texts — the canonical `text` value.
    pub fn joined_word_text(words: &[Word]) -> String {
        words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Speaker {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    specta::Type,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChapterSource {
    Manual,
    Suggested,
}

/// A named range of consecutive segments, anchored by segment **ids**.
///
/// Anchors survive reordering but not the deletion of the anchor segment
/// without a remap. `end_segment_id` and `segment_count` are derived values
/// kept in sync by the chapter operations — range queries go through
/// [`crate::chapters::resolve_ranges`], which recomputes ends dynamically
/// from the start-anchor ordering.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    pub start_segment_id: String,
    pub end_segment_id: String,
    pub segment_count: usize,
    pub created_at_ms: i64,
    pub source: ChapterSource,
}

/// Partial-update carrier for `update_chapter`. `None` fields are left
/// untouched; an empty string in `summary`/`notes` clears the field.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct ChapterPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
    #[serde(default)]
    pub end_segment_id: Option<String>,
}

/// A chapter's range resolved against the current segment order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct ChapterRange {
    pub chapter_id: String,
    pub start_index: usize,
    pub end_index: usize,
}

/// Complete snapshot of the editable state at a point in time.
///
/// This is the undo/redo contract: everything the editor restores on time
/// travel, fully materialized and independent of the live state. Produced by
/// every mutating entry point, consumed by `undo`/`redo`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct HistorySnapshot {
    pub segments: Vec<Segment>,
    pub speakers: Vec<Speaker>,
    pub tags: Vec<Tag>,
    pub chapters: Vec<Chapter>,
    pub selected_segment_id: Option<String>,
    pub selected_chapter_id: Option<String>,
    pub current_time: f64,
    pub confidence_version: u64,
}
