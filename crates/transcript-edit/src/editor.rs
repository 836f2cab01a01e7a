//! The stateful editing shell.
//!
//! `TranscriptEditor` owns the live state and wires the pure cores together:
//! every mutation entry point computes its replacement state through
//! [`crate::segments`] / [`crate::chapters`], applies anchor replacements to
//! the chapter index, invalidates stale suggestions, and ends with exactly
//! one history push. Precondition violations are silent no-ops — the UI
//! pre-filters invalid actions through the read-only selectors, and a `false`
//! / `None` return means "state unchanged".

use std::time::{SystemTime, UNIX_EPOCH};

use crate::chapters;
use crate::error::LoadError;
use crate::history::History;
use crate::id::{IdGenerator, UuidIdGen};
use crate::segments::{self, Replacements, TextUpdate};
use crate::suggestions::{Suggestion, SuggestionBox, SuggestionPayload, SuggestionStatus};
use crate::types::{
    Chapter, ChapterPatch, ChapterRange, ChapterSource, HistorySnapshot, Segment, Speaker, Tag,
};

pub struct TranscriptEditor {
    segments: Vec<Segment>,
    speakers: Vec<Speaker>,
    tags: Vec<Tag>,
    chapters: Vec<Chapter>,
    selected_segment_id: Option<String>,
    selected_chapter_id: Option<String>,
    current_time: f64,
    confidence_version: u64,
    history: History,
    suggestions: SuggestionBox,
    ids: Box<dyn IdGenerator>,
}

impl TranscriptEditor {
    pub fn new() -> Self {
        Self::with_ids(UuidIdGen)
    }

    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        let mut editor = Self {
            segments: Vec::new(),
            speakers: Vec::new(),
            tags: Vec::new(),
            chapters: Vec::new(),
            selected_segment_id: None,
            selected_chapter_id: None,
            current_time: 0.0,
            confidence_version: 0,
            history: History::default(),
            suggestions: SuggestionBox::default(),
            ids: Box::new(ids),
        };
        let baseline = editor.snapshot();
        editor.history.reset(baseline);
        editor
    }

    // ── Loading ─────────────────────────────────────────────────────────────

    /// Replace the entire editable state with a freshly imported transcript.
    ///
    /// Segments arriving without an id are assigned one. Chapters whose
    /// anchors do not resolve against the imported segments are dropped.
    /// History restarts from this state; pending suggestions are discarded.
    pub fn load_transcript(
        &mut self,
        mut segments: Vec<Segment>,
        speakers: Vec<Speaker>,
        tags: Vec<Tag>,
        chapters: Vec<Chapter>,
    ) -> Result<(), LoadError> {
        for segment in &mut segments {
            if segment.id.is_empty() {
                segment.id = self.ids.segment_id();
            }
            if !(segment.start.is_finite() && segment.end.is_finite()) {
                return Err(LoadError::NonFiniteTiming(segment.id.clone()));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for segment in &segments {
            if !seen.insert(segment.id.as_str()) {
                return Err(LoadError::DuplicateSegmentId(segment.id.clone()));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for chapter in &chapters {
            if !seen.insert(chapter.id.as_str()) {
                return Err(LoadError::DuplicateChapterId(chapter.id.clone()));
            }
        }

        let chapters = chapters::remap_and_filter(&chapters, &Replacements::new(), &segments);

        tracing::info!(
            segments = segments.len(),
            chapters = chapters.len(),
            "transcript_loaded"
        );

        self.segments = segments;
        self.speakers = speakers;
        self.tags = tags;
        self.chapters = chapters;
        self.selected_segment_id = None;
        self.selected_chapter_id = None;
        self.current_time = 0.0;
        self.confidence_version = 0;
        self.suggestions.clear();
        let baseline = self.snapshot();
        self.history.reset(baseline);
        Ok(())
    }

    // ── Segment mutations ───────────────────────────────────────────────────

    pub fn update_segment_text(&mut self, id: &str, text: &str) -> bool {
        let Some(updated) = segments::update_text(&self.segments, id, text) else {
            tracing::debug!(segment = id, "update_text_noop");
            return false;
        };
        self.segments = updated;
        self.confidence_version += 1;
        self.commit();
        true
    }

    pub fn update_segment_texts_batch(&mut self, updates: &[TextUpdate]) -> bool {
        let Some(updated) = segments::update_text_batch(&self.segments, updates) else {
            return false;
        };
        self.segments = updated;
        self.confidence_version += 1;
        self.commit();
        true
    }

    pub fn update_segment_speaker(&mut self, id: &str, speaker_id: Option<&str>) -> bool {
        let Some(updated) = segments::update_speaker(&self.segments, id, speaker_id) else {
            return false;
        };
        self.segments = updated;
        self.commit();
        true
    }

    pub fn confirm_segment(&mut self, id: &str) -> bool {
        let Some(updated) = segments::confirm(&self.segments, id) else {
            return false;
        };
        self.segments = updated;
        self.confidence_version += 1;
        self.commit();
        true
    }

    pub fn toggle_segment_bookmark(&mut self, id: &str) -> bool {
        let Some(updated) = segments::toggle_bookmark(&self.segments, id) else {
            return false;
        };
        self.segments = updated;
        self.commit();
        true
    }

    pub fn update_segment_timing(&mut self, id: &str, start: f64, end: f64) -> bool {
        let Some(updated) = segments::update_timing(&self.segments, id, start, end) else {
            tracing::debug!(segment = id, "update_timing_rejected");
            return false;
        };
        self.segments = updated;
        self.commit();
        true
    }

    /// Split a segment before `word_index`. Returns the two fresh ids
    /// `(first, second)`, or `None` for an edge or unknown index.
    pub fn split_segment(&mut self, id: &str, word_index: usize) -> Option<(String, String)> {
        let Some(result) = segments::split(&self.segments, id, word_index, self.ids.as_mut())
        else {
            tracing::debug!(segment = id, word_index, "split_rejected");
            return None;
        };
        self.segments = result.segments;
        self.apply_replacements(&result.replacements, &result.removed_ids);
        self.commit();
        Some((result.first_id, result.second_id))
    }

    /// Merge two index-adjacent segments. Returns the merged segment's fresh
    /// id, or `None` when the pair is not adjacent.
    pub fn merge_segments(&mut self, a: &str, b: &str) -> Option<String> {
        let Some(result) = segments::merge(&self.segments, a, b, self.ids.as_mut()) else {
            tracing::debug!(first = a, second = b, "merge_rejected");
            return None;
        };
        self.segments = result.segments;
        self.apply_replacements(&result.replacements, &result.removed_ids);
        self.commit();
        Some(result.merged_id)
    }

    pub fn delete_segment(&mut self, id: &str) -> bool {
        let Some(result) = segments::delete(&self.segments, id) else {
            return false;
        };
        self.segments = result.segments;
        // a chapter living entirely inside the deleted segment is dropped,
        // not remapped into an inverted range
        self.chapters
            .retain(|c| !(c.start_segment_id == id && c.end_segment_id == id));
        self.apply_replacements(&result.replacements, &result.removed_ids);
        self.commit();
        true
    }

    // ── Chapter mutations ───────────────────────────────────────────────────

    pub fn start_chapter(
        &mut self,
        title: &str,
        start_segment_id: &str,
        tag_ids: Vec<String>,
    ) -> Option<String> {
        self.start_chapter_from(title, start_segment_id, tag_ids, ChapterSource::Manual)
    }

    fn start_chapter_from(
        &mut self,
        title: &str,
        start_segment_id: &str,
        tag_ids: Vec<String>,
        source: ChapterSource,
    ) -> Option<String> {
        let outcome = chapters::start_chapter(
            &self.chapters,
            &self.segments,
            title,
            start_segment_id,
            tag_ids,
            source,
            now_ms(),
            self.ids.as_mut(),
        )?;
        if outcome.created {
            self.chapters = outcome.chapters;
            self.commit();
        }
        Some(outcome.chapter_id)
    }

    pub fn update_chapter(&mut self, id: &str, patch: &ChapterPatch) -> bool {
        let Some(updated) = chapters::update_chapter(&self.chapters, &self.segments, id, patch)
        else {
            tracing::debug!(chapter = id, "update_chapter_rejected");
            return false;
        };
        self.chapters = updated;
        self.commit();
        true
    }

    pub fn move_chapter_start(&mut self, id: &str, new_start_segment_id: &str) -> bool {
        let Some(updated) =
            chapters::move_chapter_start(&self.chapters, &self.segments, id, new_start_segment_id)
        else {
            tracing::debug!(chapter = id, "move_chapter_start_rejected");
            return false;
        };
        self.chapters = updated;
        self.commit();
        true
    }

    pub fn delete_chapter(&mut self, id: &str) -> bool {
        let Some(updated) = chapters::delete_chapter(&self.chapters, id) else {
            return false;
        };
        self.chapters = updated;
        if self.selected_chapter_id.as_deref() == Some(id) {
            self.selected_chapter_id = None;
        }
        self.commit();
        true
    }

    pub fn clear_chapters(&mut self) -> bool {
        let Some(updated) = chapters::clear(&self.chapters) else {
            return false;
        };
        self.chapters = updated;
        self.selected_chapter_id = None;
        self.commit();
        true
    }

    // ── History ─────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Select a segment (or clear with `None`). Unknown ids clear the
    /// selection. Never pushes history.
    pub fn select_segment(&mut self, id: Option<&str>) {
        self.selected_segment_id = id
            .filter(|id| self.segments.iter().any(|s| s.id == *id))
            .map(str::to_string);
        self.amend_selection();
    }

    pub fn select_chapter(&mut self, id: Option<&str>) {
        self.selected_chapter_id = id
            .filter(|id| self.chapters.iter().any(|c| c.id == *id))
            .map(str::to_string);
        self.amend_selection();
    }

    pub fn set_current_time(&mut self, time: f64) {
        self.current_time = time.max(0.0);
        self.amend_selection();
    }

    // ── Suggestions ─────────────────────────────────────────────────────────

    pub fn add_suggestions(&mut self, payloads: Vec<SuggestionPayload>) -> Vec<String> {
        self.suggestions.add(payloads, self.ids.as_mut())
    }

    pub fn dismiss_suggestion(&mut self, id: &str) -> bool {
        self.suggestions.dismiss(id)
    }

    /// Apply a pending suggestion through the normal mutation entry points.
    ///
    /// A suggestion referencing a segment id retired since it was produced is
    /// marked invalidated and refused — an out-of-band producer can never
    /// apply against state it has not seen.
    pub fn accept_suggestion(&mut self, id: &str) -> bool {
        let (status, payload) = match self.suggestions.get(id) {
            Some(s) => (s.status, s.payload.clone()),
            None => return false,
        };
        if status != SuggestionStatus::Pending {
            return false;
        }

        let stale = payload
            .segment_ids()
            .iter()
            .any(|sid| !self.segments.iter().any(|s| s.id == *sid));
        if stale {
            self.suggestions.mark(id, SuggestionStatus::Invalidated);
            tracing::warn!(suggestion = id, "suggestion_stale_on_accept");
            return false;
        }

        let applied = match payload {
            SuggestionPayload::Speaker {
                segment_id,
                speaker_id,
            } => self.update_segment_speaker(&segment_id, Some(&speaker_id)),
            SuggestionPayload::Revision { segment_id, text } => {
                self.update_segment_text(&segment_id, &text)
            }
            SuggestionPayload::Merge { segment_ids } => self.merge_run(&segment_ids),
            SuggestionPayload::Chapter {
                title,
                start_segment_id,
                tag_ids,
            } => self
                .start_chapter_from(&title, &start_segment_id, tag_ids, ChapterSource::Suggested)
                .is_some(),
        };

        let outcome = if applied {
            SuggestionStatus::Accepted
        } else {
            SuggestionStatus::Invalidated
        };
        self.suggestions.mark(id, outcome);
        applied
    }

    fn merge_run(&mut self, segment_ids: &[String]) -> bool {
        let Some(mut current) = segment_ids.first().cloned() else {
            return false;
        };
        let mut merged_any = false;
        for next in &segment_ids[1..] {
            match self.merge_segments(&current, next) {
                Some(merged) => {
                    current = merged;
                    merged_any = true;
                }
                None => return false,
            }
        }
        merged_any
    }

    // ── Selectors ───────────────────────────────────────────────────────────

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Effective chapter ranges under the dynamic end-resolution policy.
    pub fn chapter_ranges(&self) -> Vec<ChapterRange> {
        chapters::resolve_ranges(&self.chapters, &self.segments)
    }

    /// The chapter whose effective range contains the given segment.
    pub fn chapter_at(&self, segment_id: &str) -> Option<&Chapter> {
        let index = self.segments.iter().position(|s| s.id == segment_id)?;
        let range = self
            .chapter_ranges()
            .into_iter()
            .find(|r| r.start_index <= index && index <= r.end_index)?;
        self.chapter(&range.chapter_id)
    }

    pub fn can_merge(&self, a: &str, b: &str) -> bool {
        segments::are_adjacent(&self.segments, a, b)
    }

    pub fn can_split(&self, id: &str, word_index: usize) -> bool {
        self.segment(id)
            .is_some_and(|s| word_index > 0 && word_index < s.words.len())
    }

    pub fn selected_segment_id(&self) -> Option<&str> {
        self.selected_segment_id.as_deref()
    }

    pub fn selected_chapter_id(&self) -> Option<&str> {
        self.selected_chapter_id.as_deref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn confidence_version(&self) -> u64 {
        self.confidence_version
    }

    pub fn suggestions(&self) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter()
    }

    /// Fully materialized copy of the editable state, as recorded in history
    /// and consumed by persistence.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            segments: self.segments.clone(),
            speakers: self.speakers.clone(),
            tags: self.tags.clone(),
            chapters: self.chapters.clone(),
            selected_segment_id: self.selected_segment_id.clone(),
            selected_chapter_id: self.selected_chapter_id.clone(),
            current_time: self.current_time,
            confidence_version: self.confidence_version,
        }
    }

    // ── Internal ────────────────────────────────────────────────────────────

    fn commit(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        self.segments = snapshot.segments;
        self.speakers = snapshot.speakers;
        self.tags = snapshot.tags;
        self.chapters = snapshot.chapters;
        self.selected_segment_id = snapshot.selected_segment_id;
        self.selected_chapter_id = snapshot.selected_chapter_id;
        self.current_time = snapshot.current_time;
        self.confidence_version = snapshot.confidence_version;
    }

    /// Post-processing shared by every segment mutation that retires ids:
    /// remap chapter anchors, follow the selection to its successor, and
    /// invalidate pending suggestions that reference retired ids.
    fn apply_replacements(&mut self, replacements: &Replacements, removed_ids: &[String]) {
        self.chapters = chapters::remap_and_filter(&self.chapters, replacements, &self.segments);

        if self
            .selected_chapter_id
            .as_ref()
            .is_some_and(|id| !self.chapters.iter().any(|c| &c.id == id))
        {
            self.selected_chapter_id = None;
        }

        if let Some(selected) = self.selected_segment_id.clone() {
            if removed_ids.contains(&selected) {
                self.selected_segment_id = replacements
                    .get(&selected)
                    .and_then(|r| r.for_start().or_else(|| r.for_end()))
                    .map(str::to_string);
            }
        }

        let invalidated = self.suggestions.invalidate_referencing(removed_ids);
        if !invalidated.is_empty() {
            tracing::debug!(suggestions = ?invalidated, "suggestions_invalidated");
        }
    }

    fn amend_selection(&mut self) {
        self.history.amend_selection(
            self.selected_segment_id.clone(),
            self.selected_chapter_id.clone(),
            self.current_time,
        );
    }
}

impl Default for TranscriptEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
