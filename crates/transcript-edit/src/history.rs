//! Bounded linear undo/redo over fully materialized state snapshots.
//!
//! Every mutating editor operation ends with exactly one `push`. Undoing and
//! then mutating discards the redo tail; exceeding the cap evicts the oldest
//! entries. Selection-only changes amend the current entry in place so
//! browsing the transcript never pollutes the undo stack.

use crate::types::HistorySnapshot;

/// Maximum retained snapshots. Undo cannot travel past the oldest one.
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistorySnapshot>,
    cursor: usize,
}

impl History {
    /// Start over with a single baseline entry.
    pub fn reset(&mut self, baseline: HistorySnapshot) {
        self.entries = vec![baseline];
        self.cursor = 0;
    }

    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > MAX_HISTORY {
            let excess = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..excess);
            self.cursor -= excess;
        }
    }

    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&HistorySnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the current entry's selection fields in place. Browsing is
    /// not an edit; it must not create or destroy redo state.
    pub fn amend_selection(
        &mut self,
        selected_segment_id: Option<String>,
        selected_chapter_id: Option<String>,
        current_time: f64,
    ) {
        if let Some(entry) = self.entries.get_mut(self.cursor) {
            entry.selected_segment_id = selected_segment_id;
            entry.selected_chapter_id = selected_chapter_id;
            entry.current_time = current_time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(version: u64) -> HistorySnapshot {
        HistorySnapshot {
            confidence_version: version,
            ..Default::default()
        }
    }

    fn history_with(n: u64) -> History {
        let mut h = History::default();
        h.reset(snap(0));
        for v in 1..=n {
            h.push(snap(v));
        }
        h
    }

    #[test]
    fn undo_and_redo_walk_the_stack() {
        let mut h = history_with(2);
        assert!(h.can_undo());
        assert!(!h.can_redo());

        assert_eq!(h.undo().unwrap().confidence_version, 1);
        assert_eq!(h.undo().unwrap().confidence_version, 0);
        assert!(h.undo().is_none());

        assert_eq!(h.redo().unwrap().confidence_version, 1);
        assert_eq!(h.redo().unwrap().confidence_version, 2);
        assert!(h.redo().is_none());
    }

    #[test]
    fn push_discards_the_redo_tail() {
        let mut h = history_with(3);
        h.undo();
        h.undo();
        h.push(snap(9));
        assert!(!h.can_redo());
        assert_eq!(h.len(), 3);
        assert_eq!(h.undo().unwrap().confidence_version, 1);
    }

    #[test]
    fn cap_evicts_the_oldest_entries() {
        let mut h = History::default();
        h.reset(snap(0));
        for v in 1..=(MAX_HISTORY as u64 + 10) {
            h.push(snap(v));
        }
        assert_eq!(h.len(), MAX_HISTORY);

        // walk all the way back: the oldest retained snapshot is not 0
        let mut oldest = 0;
        while let Some(entry) = h.undo() {
            oldest = entry.confidence_version;
        }
        assert_eq!(oldest, 11);
        assert!(!h.can_undo());
    }

    #[test]
    fn amend_selection_does_not_grow_the_stack() {
        let mut h = history_with(1);
        h.amend_selection(Some("s1".to_string()), None, 3.5);
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());

        h.undo();
        let redone = h.redo().unwrap();
        assert_eq!(redone.selected_segment_id.as_deref(), Some("s1"));
        assert_eq!(redone.current_time, 3.5);
    }
}
