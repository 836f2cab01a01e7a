//! Pending AI-suggestion tracking.
//!
//! Suggestion producers run out-of-band and only ever mutate state by
//! eventually invoking the synchronous editor entry points once a decision is
//! made. This store tracks what they have proposed and enforces the ordering
//! guarantee: a suggestion referencing a segment id retired by an intervening
//! edit is marked `Invalidated` before it can ever be accepted.

use crate::id::IdGenerator;

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
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Dismissed,
    /// A referenced segment id was retired by a split/merge/delete before the
    /// suggestion was acted on. Terminal; acceptance is refused.
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionPayload {
    Speaker {
        segment_id: String,
        speaker_id: String,
    },
    /// Adjacent segments proposed for merging, in timeline order.
    Merge {
        segment_ids: Vec<String>,
    },
    Chapter {
        title: String,
        start_segment_id: String,
        tag_ids: Vec<String>,
    },
    Revision {
        segment_id: String,
        text: String,
    },
}

impl SuggestionPayload {
    /// Every segment id this suggestion references.
    pub fn segment_ids(&self) -> Vec<&str> {
        match self {
            Self::Speaker { segment_id, .. } | Self::Revision { segment_id, .. } => {
                vec![segment_id.as_str()]
            }
            Self::Merge { segment_ids } => segment_ids.iter().map(String::as_str).collect(),
            Self::Chapter {
                start_segment_id, ..
            } => vec![start_segment_id.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
pub struct Suggestion {
    pub id: String,
    pub status: SuggestionStatus,
    pub payload: SuggestionPayload,
}

#[derive(Debug, Default)]
pub struct SuggestionBox {
    items: Vec<Suggestion>,
}

impl SuggestionBox {
    pub fn add(
        &mut self,
        payloads: Vec<SuggestionPayload>,
        ids: &mut dyn IdGenerator,
    ) -> Vec<String> {
        payloads
            .into_iter()
            .map(|payload| {
                let id = ids.suggestion_id();
                self.items.push(Suggestion {
                    id: id.clone(),
                    status: SuggestionStatus::Pending,
                    payload,
                });
                id
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Suggestion> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.items.iter()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Suggestion> {
        self.items
            .iter()
            .filter(|s| s.status == SuggestionStatus::Pending)
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        self.set_status(id, SuggestionStatus::Pending, SuggestionStatus::Dismissed)
    }

    pub(crate) fn mark(&mut self, id: &str, status: SuggestionStatus) {
        if let Some(s) = self.items.iter_mut().find(|s| s.id == id) {
            s.status = status;
        }
    }

    /// Mark every pending suggestion that references one of `removed_ids` as
    /// invalidated. Returns the affected suggestion ids so the caller can
    /// surface them — pruning is observable, never silent.
    pub fn invalidate_referencing(&mut self, removed_ids: &[String]) -> Vec<String> {
        if removed_ids.is_empty() {
            return Vec::new();
        }
        let mut invalidated = Vec::new();
        for s in &mut self.items {
            if s.status != SuggestionStatus::Pending {
                continue;
            }
            if s.payload
                .segment_ids()
                .iter()
                .any(|id| removed_ids.iter().any(|r| r == id))
            {
                s.status = SuggestionStatus::Invalidated;
                invalidated.push(s.id.clone());
            }
        }
        invalidated
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn set_status(&mut self, id: &str, from: SuggestionStatus, to: SuggestionStatus) -> bool {
        match self.items.iter_mut().find(|s| s.id == id) {
            Some(s) if s.status == from => {
                s.status = to;
                true
            }
            _ => false,
        }
    }
}
