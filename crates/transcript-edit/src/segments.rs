//! Segment CRUD as pure functions over the current segment slice.
//!
//! Every operation either returns the replacement state or `None` for a
//! precondition violation — unknown id, out-of-range split index,
//! non-adjacent merge, no-effect edit. Nothing here panics or throws; the UI
//! is expected to pre-filter invalid actions through read-only selectors, and
//! a `None` simply means "state unchanged".
//!
//! Operations that retire segment ids (split, merge, delete) also report how
//! those ids map onto the surviving segments, keyed per anchor role, so the
//! chapter index can remap its boundaries.

use std::collections::HashMap;

use crate::align::retime_segment;
use crate::id::IdGenerator;
use crate::types::{Segment, Word};

// ── Anchor replacements ──────────────────────────────────────────────────────

/// How one retired segment id maps onto surviving segments, per anchor role.
///
/// A chapter anchor can reference a segment as its *start* or its *end*, and
/// a structural edit may move those roles to different survivors: a split
/// sends start anchors to the first half and end anchors to the second, while
/// a delete falls back to the nearest neighbor on each side.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorReplacement {
    /// Only start anchors move; end anchors are left dangling.
    StartOnly(String),
    /// Only end anchors move; start anchors are left dangling.
    EndOnly(String),
    /// Both roles move to the same fresh id (merge).
    Rename(String),
    /// The two roles diverge (split, interior delete).
    PerRole { start: String, end: String },
}

impl AnchorReplacement {
    pub fn for_start(&self) -> Option<&str> {
        match self {
            Self::StartOnly(id) | Self::Rename(id) => Some(id),
            Self::PerRole { start, .. } => Some(start),
            Self::EndOnly(_) => None,
        }
    }

    pub fn for_end(&self) -> Option<&str> {
        match self {
            Self::EndOnly(id) | Self::Rename(id) => Some(id),
            Self::PerRole { end, .. } => Some(end),
            Self::StartOnly(_) => None,
        }
    }
}

/// Replacement records from one structural edit, keyed by retired segment id.
pub type Replacements = HashMap<String, AnchorReplacement>;

// ── Text ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct TextUpdate {
    pub segment_id: String,
    pub text: String,
}

/// Re-align one segment's words to hand-edited text.
pub fn update_text(segments: &[Segment], id: &str, text: &str) -> Option<Vec<Segment>> {
    let idx = index_of(segments, id)?;
    let updated = retime_segment(&segments[idx], text)?;
    if updated == segments[idx] {
        return None;
    }
    Some(replace_at(segments, idx, updated))
}

/// Apply several text edits at once. Returns the new slice only if at least
/// one segment actually changed.
pub fn update_text_batch(segments: &[Segment], updates: &[TextUpdate]) -> Option<Vec<Segment>> {
    let mut out = segments.to_vec();
    let mut changed = false;
    for update in updates {
        let Some(idx) = index_of(&out, &update.segment_id) else {
            continue;
        };
        if let Some(updated) = retime_segment(&out[idx], &update.text) {
            if updated != out[idx] {
                out[idx] = updated;
                changed = true;
            }
        }
    }
    changed.then_some(out)
}

// ── Flags and speakers ───────────────────────────────────────────────────────

pub fn update_speaker(
    segments: &[Segment],
    id: &str,
    speaker_id: Option<&str>,
) -> Option<Vec<Segment>> {
    let idx = index_of(segments, id)?;
    let new_speaker = speaker_id.map(str::to_string);
    if segments[idx].speaker_id == new_speaker {
        return None;
    }
    let mut updated = segments[idx].clone();
    updated.speaker_id = new_speaker;
    Some(replace_at(segments, idx, updated))
}

/// Mark a segment human-verified: every word confidence becomes 1.0 and the
/// segment is flagged confirmed. Timings and text are untouched.
pub fn confirm(segments: &[Segment], id: &str) -> Option<Vec<Segment>> {
    let idx = index_of(segments, id)?;
    let mut updated = segments[idx].clone();
    updated.confirmed = true;
    for word in &mut updated.words {
        word.confidence = Some(1.0);
    }
    if updated == segments[idx] {
        return None;
    }
    Some(replace_at(segments, idx, updated))
}

pub fn toggle_bookmark(segments: &[Segment], id: &str) -> Option<Vec<Segment>> {
    let idx = index_of(segments, id)?;
    let mut updated = segments[idx].clone();
    updated.bookmarked = !updated.bookmarked;
    Some(replace_at(segments, idx, updated))
}

// ── Structural edits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SplitResult {
    pub segments: Vec<Segment>,
    pub first_id: String,
    pub second_id: String,
    pub replacements: Replacements,
    pub removed_ids: Vec<String>,
}

/// Split a segment before `word_index`. Valid only strictly inside the word
/// list: `0 < word_index < words.len()`.
pub fn split(
    segments: &[Segment],
    id: &str,
    word_index: usize,
    ids: &mut dyn IdGenerator,
) -> Option<SplitResult> {
    let idx = index_of(segments, id)?;
    let seg = &segments[idx];
    if word_index == 0 || word_index >= seg.words.len() {
        return None;
    }

    let first_words = seg.words[..word_index].to_vec();
    let second_words = seg.words[word_index..].to_vec();
    let boundary = first_words.last().map(|w| w.end)?;

    let first_id = ids.segment_id();
    let second_id = ids.segment_id();

    let first = Segment {
        id: first_id.clone(),
        end: boundary,
        text: Segment::joined_word_text(&first_words),
        words: first_words,
        ..seg.clone()
    };
    let second = Segment {
        id: second_id.clone(),
        start: second_words.first().map(|w| w.start)?,
        text: Segment::joined_word_text(&second_words),
        words: second_words,
        ..seg.clone()
    };

    let mut out = segments.to_vec();
    out.splice(idx..=idx, [first, second]);

    let replacements = Replacements::from([(
        seg.id.clone(),
        AnchorReplacement::PerRole {
            start: first_id.clone(),
            end: second_id.clone(),
        },
    )]);

    Some(SplitResult {
        segments: out,
        first_id,
        second_id,
        replacements,
        removed_ids: vec![seg.id.clone()],
    })
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub segments: Vec<Segment>,
    pub merged_id: String,
    pub replacements: Replacements,
    pub removed_ids: Vec<String>,
}

pub fn are_adjacent(segments: &[Segment], a: &str, b: &str) -> bool {
    match (index_of(segments, a), index_of(segments, b)) {
        (Some(ia), Some(ib)) => ia.abs_diff(ib) == 1,
        _ => false,
    }
}

/// Merge two index-adjacent segments into one fresh-id segment, ordered by
/// timeline position regardless of argument order.
pub fn merge(
    segments: &[Segment],
    a: &str,
    b: &str,
    ids: &mut dyn IdGenerator,
) -> Option<MergeResult> {
    let ia = index_of(segments, a)?;
    let ib = index_of(segments, b)?;
    if ia.abs_diff(ib) != 1 {
        return None;
    }

    let lo = ia.min(ib);
    let (first, second) = (&segments[lo], &segments[lo + 1]);

    let mut words = first.words.clone();
    words.extend(second.words.iter().cloned());

    let mut tag_ids = first.tag_ids.clone();
    for tag in &second.tag_ids {
        if !tag_ids.contains(tag) {
            tag_ids.push(tag.clone());
        }
    }

    let text = match (first.text.is_empty(), second.text.is_empty()) {
        (true, _) => second.text.clone(),
        (_, true) => first.text.clone(),
        _ => format!("{} {}", first.text, second.text),
    };

    let merged_id = ids.segment_id();
    let merged = Segment {
        id: merged_id.clone(),
        speaker_id: first.speaker_id.clone(),
        tag_ids,
        start: first.start,
        end: second.end,
        text,
        words,
        confirmed: first.confirmed && second.confirmed,
        bookmarked: first.bookmarked || second.bookmarked,
    };

    let removed_ids = vec![first.id.clone(), second.id.clone()];
    let replacements = Replacements::from([
        (first.id.clone(), AnchorReplacement::Rename(merged_id.clone())),
        (second.id.clone(), AnchorReplacement::Rename(merged_id.clone())),
    ]);

    let mut out = segments.to_vec();
    out.splice(lo..=lo + 1, [merged]);

    Some(MergeResult {
        segments: out,
        merged_id,
        replacements,
        removed_ids,
    })
}

/// Move a segment's boundaries. Word timings are clamped into the new range
/// with the edge words pinned to the new bounds, so the word partition
/// invariant survives without rescaling interior timings.
pub fn update_timing(segments: &[Segment], id: &str, start: f64, end: f64) -> Option<Vec<Segment>> {
    let idx = index_of(segments, id)?;
    if !(end > start) {
        return None;
    }

    let seg = &segments[idx];
    let mut words = seg.words.clone();
    let mut prev_end = start;
    for word in &mut words {
        word.start = word.start.clamp(start, end).max(prev_end);
        word.end = word.end.clamp(word.start, end);
        prev_end = word.end;
    }
    if let Some(first) = words.first_mut() {
        first.start = start;
    }
    if let Some(last) = words.last_mut() {
        last.end = end;
        last.start = last.start.min(end);
    }

    let updated = Segment {
        start,
        end,
        words,
        ..seg.clone()
    };
    if updated == *seg {
        return None;
    }
    Some(replace_at(segments, idx, updated))
}

#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub segments: Vec<Segment>,
    pub replacements: Replacements,
    pub removed_ids: Vec<String>,
}

/// Remove a segment. Start anchors fall forward to the segment that now
/// occupies the deleted index; end anchors fall back to the one before it.
/// Either side may be absent at the transcript edges.
pub fn delete(segments: &[Segment], id: &str) -> Option<DeleteResult> {
    let idx = index_of(segments, id)?;

    let after = segments.get(idx + 1).map(|s| s.id.clone());
    let before = (idx > 0).then(|| segments[idx - 1].id.clone());

    let mut replacements = Replacements::new();
    let replacement = match (after, before) {
        (Some(start), Some(end)) => Some(AnchorReplacement::PerRole { start, end }),
        (Some(start), None) => Some(AnchorReplacement::StartOnly(start)),
        (None, Some(end)) => Some(AnchorReplacement::EndOnly(end)),
        (None, None) => None,
    };
    if let Some(replacement) = replacement {
        replacements.insert(id.to_string(), replacement);
    }

    let mut out = segments.to_vec();
    out.remove(idx);

    Some(DeleteResult {
        segments: out,
        replacements,
        removed_ids: vec![id.to_string()],
    })
}

// ── Internal ─────────────────────────────────────────────────────────────────

fn index_of(segments: &[Segment], id: &str) -> Option<usize> {
    segments.iter().position(|s| s.id == id)
}

fn replace_at(segments: &[Segment], idx: usize, updated: Segment) -> Vec<Segment> {
    let mut out = segments.to_vec();
    out[idx] = updated;
    out
}
