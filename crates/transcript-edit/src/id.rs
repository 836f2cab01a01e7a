/// Id minting seam for everything this crate creates: segments (split/merge
/// products, imports without ids), chapters, and suggestions.
///
/// Production code uses [`UuidIdGen`]; tests use [`SequentialIdGen`] so ids
/// are stable across runs and assertable by value.
pub trait IdGenerator: Send + Sync {
    fn segment_id(&mut self) -> String;
    fn chapter_id(&mut self) -> String;
    fn suggestion_id(&mut self) -> String;
}

pub struct UuidIdGen;

impl Default for UuidIdGen {
    fn default() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGen {
    fn segment_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn chapter_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn suggestion_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic per-namespace counters (`seg-0`, `ch-0`, `sug-0`, …) for
/// tests and golden snapshots where reproducible ids are required.
pub struct SequentialIdGen {
    segments: u64,
    chapters: u64,
    suggestions: u64,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self {
            segments: 0,
            chapters: 0,
            suggestions: 0,
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGen {
    fn segment_id(&mut self) -> String {
        let id = self.segments;
        self.segments += 1;
        format!("seg-{id}")
    }

    fn chapter_id(&mut self) -> String {
        let id = self.chapters;
        self.chapters += 1;
        format!("ch-{id}")
    }

    fn suggestion_id(&mut self) -> String {
        let id = self.suggestions;
        self.suggestions += 1;
        format!("sug-{id}")
    }
}
