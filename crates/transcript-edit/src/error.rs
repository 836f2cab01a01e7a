/// Import-boundary failures. Editing operations never raise these — invalid
/// edits are silent no-ops — but a malformed transcript handed to
/// `load_transcript` is a caller bug worth surfacing.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("duplicate segment id: {0}")]
    DuplicateSegmentId(String),
    #[error("duplicate chapter id: {0}")]
    DuplicateChapterId(String),
    #[error("segment {0} has non-finite timing")]
    NonFiniteTiming(String),
}
