pub mod align;
pub mod chapters;
pub mod editor;
mod error;
pub mod history;
pub mod id;
pub mod segments;
pub mod suggestions;
pub mod types;

pub use align::retime_segment;
pub use editor::TranscriptEditor;
pub use error::LoadError;
pub use history::{History, MAX_HISTORY};
pub use id::{IdGenerator, SequentialIdGen, UuidIdGen};
pub use segments::{AnchorReplacement, Replacements, TextUpdate};
pub use suggestions::{Suggestion, SuggestionBox, SuggestionPayload, SuggestionStatus};
pub use types::{
    Chapter, ChapterPatch, ChapterRange, ChapterSource, HistorySnapshot, Segment, Speaker, Tag,
    Word,
};
