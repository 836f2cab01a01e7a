//! Chapter-to-segment-range maintenance.
//!
//! Chapters are anchored by segment **ids**, joined to the segment list
//! through freshly built id→index maps — no pointers, no cached indices, so
//! nothing here goes stale when segments split, merge or disappear.
//!
//! The *effective* end of a chapter is derived, not stored: chapters are
//! ordered by resolved start index and each one runs to the instant before
//! the next chapter's start (the last one runs to the end of the transcript).
//! Stored `end_segment_id`/`segment_count` are kept in sync as derived
//! values. This dynamic resolution is self-healing across edits and is pinned
//! by tests.

use std::collections::{HashMap, HashSet};

use crate::id::IdGenerator;
use crate::segments::Replacements;
use crate::types::{Chapter, ChapterPatch, ChapterRange, ChapterSource, Segment};

// ── Resolution ───────────────────────────────────────────────────────────────

fn index_map(segments: &[Segment]) -> HashMap<&str, usize> {
    segments
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect()
}

/// Resolve every chapter to its effective segment-index range, ordered by
/// start index. Chapters whose start anchor is unknown are skipped.
pub fn resolve_ranges(chapters: &[Chapter], segments: &[Segment]) -> Vec<ChapterRange> {
    if segments.is_empty() {
        return Vec::new();
    }
    let index = index_map(segments);

    let mut starts: Vec<(usize, &Chapter)> = chapters
        .iter()
        .filter_map(|c| index.get(c.start_segment_id.as_str()).map(|&i| (i, c)))
        .collect();
    starts.sort_by_key(|(i, _)| *i);

    let last = segments.len() - 1;
    let start_indices: Vec<usize> = starts.iter().map(|(i, _)| *i).collect();
    starts
        .iter()
        .enumerate()
        .map(|(k, (start_index, chapter))| ChapterRange {
            chapter_id: chapter.id.clone(),
            start_index: *start_index,
            end_index: start_indices
                .get(k + 1)
                .map_or(last, |next| next.saturating_sub(1)),
        })
        .collect()
}

/// Recompute every `segment_count` from the stored anchors. Applied after
/// segment-shape changes; stored end ids are left alone so gaps opened by
/// `delete_chapter` survive.
pub fn refresh_counts(chapters: &[Chapter], segments: &[Segment]) -> Vec<Chapter> {
    let index = index_map(segments);
    chapters
        .iter()
        .map(|c| {
            let mut c = c.clone();
            if let (Some(&s), Some(&e)) = (
                index.get(c.start_segment_id.as_str()),
                index.get(c.end_segment_id.as_str()),
            ) {
                c.segment_count = (e + 1).saturating_sub(s);
            }
            c
        })
        .collect()
}

/// Rewrite stored ends and counts from the dynamic resolution and order the
/// collection by start index. Chapters with an unknown start anchor are
/// dropped.
pub fn normalize(chapters: &[Chapter], segments: &[Segment]) -> Vec<Chapter> {
    if segments.is_empty() {
        return Vec::new();
    }
    let ranges = resolve_ranges(chapters, segments);
    let by_id: HashMap<&str, &Chapter> = chapters.iter().map(|c| (c.id.as_str(), c)).collect();

    ranges
        .iter()
        .filter_map(|r| {
            let mut c = (*by_id.get(r.chapter_id.as_str())?).clone();
            c.end_segment_id = segments[r.end_index].id.clone();
            c.segment_count = (r.end_index + 1).saturating_sub(r.start_index);
            Some(c)
        })
        .collect()
}

/// True when the stored anchor ranges are invalid: an anchor that does not
/// resolve, an inverted range, or two chapters overlapping.
pub fn ranges_overlap(chapters: &[Chapter], segments: &[Segment]) -> bool {
    let index = index_map(segments);
    let mut ranges = Vec::with_capacity(chapters.len());
    for c in chapters {
        let (Some(&start), Some(&end)) = (
            index.get(c.start_segment_id.as_str()),
            index.get(c.end_segment_id.as_str()),
        ) else {
            return true;
        };
        if end < start {
            return true;
        }
        ranges.push((start, end));
    }
    ranges.sort_unstable();
    ranges.windows(2).any(|w| w[1].0 <= w[0].1)
}

// ── Operations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StartChapterOutcome {
    pub chapters: Vec<Chapter>,
    pub chapter_id: String,
    /// False when a chapter already started at the requested segment and the
    /// collection was returned unchanged.
    pub created: bool,
}

/// Start a chapter at a segment. The immediately preceding chapter (if it
/// reaches that far) is trimmed to end just before the new one; the new
/// chapter extends forward to just before the next chapter or to the end of
/// the transcript. The whole operation is rejected if the result would
/// overlap.
pub fn start_chapter(
    chapters: &[Chapter],
    segments: &[Segment],
    title: &str,
    start_segment_id: &str,
    tag_ids: Vec<String>,
    source: ChapterSource,
    created_at_ms: i64,
    ids: &mut dyn IdGenerator,
) -> Option<StartChapterOutcome> {
    let title = title.trim();
    if segments.is_empty() || title.is_empty() {
        return None;
    }
    let index = index_map(segments);
    let &start_index = index.get(start_segment_id)?;

    if let Some(existing) = chapters.iter().find(|c| c.start_segment_id == start_segment_id) {
        return Some(StartChapterOutcome {
            chapters: chapters.to_vec(),
            chapter_id: existing.id.clone(),
            created: false,
        });
    }

    let mut out = chapters.to_vec();
    let ranges = resolve_ranges(&out, segments);

    // trim the preceding chapter when it reaches into the new one
    if let Some(prev) = ranges
        .iter()
        .filter(|r| r.start_index < start_index)
        .next_back()
    {
        if prev.end_index >= start_index {
            if let Some(c) = out.iter_mut().find(|c| c.id == prev.chapter_id) {
                c.end_segment_id = segments[start_index - 1].id.clone();
            }
        }
    }

    let end_index = ranges
        .iter()
        .find(|r| r.start_index > start_index)
        .map_or(segments.len() - 1, |next| next.start_index - 1);

    let chapter_id = ids.chapter_id();
    out.push(Chapter {
        id: chapter_id.clone(),
        title: title.to_string(),
        summary: None,
        notes: None,
        tag_ids,
        start_segment_id: start_segment_id.to_string(),
        end_segment_id: segments[end_index].id.clone(),
        segment_count: 0,
        created_at_ms,
        source,
    });

    let out = refresh_counts(&out, segments);
    if ranges_overlap(&out, segments) {
        return None;
    }

    Some(StartChapterOutcome {
        chapters: out,
        chapter_id,
        created: true,
    })
}

/// Apply field changes to one chapter, rejecting a blank title and any edit
/// that would make the stored ranges overlap.
pub fn update_chapter(
    chapters: &[Chapter],
    segments: &[Segment],
    id: &str,
    patch: &ChapterPatch,
) -> Option<Vec<Chapter>> {
    let idx = chapters.iter().position(|c| c.id == id)?;

    let mut out = chapters.to_vec();
    let chapter = &mut out[idx];

    if let Some(title) = &patch.title {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        chapter.title = title.to_string();
    }
    if let Some(summary) = &patch.summary {
        chapter.summary = (!summary.trim().is_empty()).then(|| summary.clone());
    }
    if let Some(notes) = &patch.notes {
        chapter.notes = (!notes.trim().is_empty()).then(|| notes.clone());
    }
    if let Some(tag_ids) = &patch.tag_ids {
        chapter.tag_ids = tag_ids.clone();
    }
    if let Some(end_segment_id) = &patch.end_segment_id {
        chapter.end_segment_id = end_segment_id.clone();
    }

    let out = refresh_counts(&out, segments);
    if ranges_overlap(&out, segments) {
        return None;
    }
    (out != chapters).then_some(out)
}

/// Relocate only a chapter's start anchor. Rejected when the new start would
/// cross a neighboring chapter's start, collide with another chapter's start,
/// or reference an unknown segment. All ranges are then recomputed from the
/// new start ordering.
pub fn move_chapter_start(
    chapters: &[Chapter],
    segments: &[Segment],
    id: &str,
    new_start_segment_id: &str,
) -> Option<Vec<Chapter>> {
    let idx = chapters.iter().position(|c| c.id == id)?;
    let index = index_map(segments);
    let &new_start = index.get(new_start_segment_id)?;

    if chapters
        .iter()
        .any(|c| c.id != id && c.start_segment_id == new_start_segment_id)
    {
        return None;
    }

    let ranges = resolve_ranges(chapters, segments);
    let pos = ranges.iter().position(|r| r.chapter_id == id)?;
    if pos > 0 && new_start <= ranges[pos - 1].start_index {
        return None;
    }
    if let Some(next) = ranges.get(pos + 1) {
        if new_start >= next.start_index {
            return None;
        }
    }

    let mut out = chapters.to_vec();
    out[idx].start_segment_id = new_start_segment_id.to_string();
    let out = normalize(&out, segments);
    if ranges_overlap(&out, segments) {
        return None;
    }
    (out != chapters).then_some(out)
}

/// Remove a chapter. Neighbors are left exactly as stored — a gap in the
/// stored ranges is permitted, and the dynamic resolution will flow the
/// preceding chapter over it.
pub fn delete_chapter(chapters: &[Chapter], id: &str) -> Option<Vec<Chapter>> {
    let idx = chapters.iter().position(|c| c.id == id)?;
    let mut out = chapters.to_vec();
    out.remove(idx);
    Some(out)
}

pub fn clear(chapters: &[Chapter]) -> Option<Vec<Chapter>> {
    (!chapters.is_empty()).then(Vec::new)
}

/// Substitute replaced anchor ids role-by-role, then drop every chapter left
/// with an anchor that no longer resolves to a current segment. Counts are
/// refreshed; stored ends are otherwise left alone.
pub fn remap_and_filter(
    chapters: &[Chapter],
    replacements: &Replacements,
    segments: &[Segment],
) -> Vec<Chapter> {
    let live: HashSet<&str> = segments.iter().map(|s| s.id.as_str()).collect();

    let remapped: Vec<Chapter> = chapters
        .iter()
        .filter_map(|c| {
            let mut c = c.clone();
            if let Some(r) = replacements.get(&c.start_segment_id) {
                if let Some(id) = r.for_start() {
                    c.start_segment_id = id.to_string();
                }
            }
            if let Some(r) = replacements.get(&c.end_segment_id) {
                if let Some(id) = r.for_end() {
                    c.end_segment_id = id.to_string();
                }
            }
            (live.contains(c.start_segment_id.as_str()) && live.contains(c.end_segment_id.as_str()))
                .then_some(c)
        })
        .collect();

    refresh_counts(&remapped, segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIdGen;
    use crate::segments;
    use crate::types::Word;

    fn seg(id: &str, start: f64, end: f64) -> Segment {
        Segment {
            id: id.to_string(),
            speaker_id: None,
            tag_ids: vec![],
            start,
            end,
            text: "hello there".to_string(),
            words: vec![
                Word {
                    text: "hello".to_string(),
                    start,
                    end: (start + end) / 2.0,
                    speaker_id: None,
                    confidence: Some(0.9),
                },
                Word {
                    text: "there".to_string(),
                    start: (start + end) / 2.0,
                    end,
                    speaker_id: None,
                    confidence: Some(0.9),
                },
            ],
            confirmed: false,
            bookmarked: false,
        }
    }

    fn four_segments() -> Vec<Segment> {
        vec![
            seg("s1", 0.0, 2.0),
            seg("s2", 2.0, 4.0),
            seg("s3", 4.0, 6.0),
            seg("s4", 6.0, 8.0),
        ]
    }

    fn start(
        chapters: &[Chapter],
        segments: &[Segment],
        title: &str,
        at: &str,
        ids: &mut SequentialIdGen,
    ) -> StartChapterOutcome {
        start_chapter(
            chapters,
            segments,
            title,
            at,
            vec![],
            ChapterSource::Manual,
            0,
            ids,
        )
        .unwrap()
    }

    #[test]
    fn first_chapter_spans_the_whole_transcript() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let out = start(&[], &segments, "Intro", "s1", &mut ids);
        assert!(out.created);
        assert_eq!(out.chapters.len(), 1);
        let c = &out.chapters[0];
        assert_eq!(c.start_segment_id, "s1");
        assert_eq!(c.end_segment_id, "s4");
        assert_eq!(c.segment_count, 4);
    }

    #[test]
    fn new_chapter_trims_its_predecessor() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let one = start(&[], &segments, "Intro", "s1", &mut ids);
        let two = start(&one.chapters, &segments, "Main", "s3", &mut ids);

        assert_eq!(two.chapters.len(), 2);
        let intro = &two.chapters[0];
        let main = &two.chapters[1];
        assert_eq!(intro.end_segment_id, "s2");
        assert_eq!(intro.segment_count, 2);
        assert_eq!(main.start_segment_id, "s3");
        assert_eq!(main.end_segment_id, "s4");
        assert_eq!(main.segment_count, 2);
    }

    #[test]
    fn starting_at_an_existing_start_returns_that_chapter() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let one = start(&[], &segments, "Intro", "s1", &mut ids);
        let again = start(&one.chapters, &segments, "Other title", "s1", &mut ids);
        assert!(!again.created);
        assert_eq!(again.chapter_id, one.chapter_id);
        assert_eq!(again.chapters, one.chapters);
    }

    #[test]
    fn start_chapter_preconditions() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        assert!(
            start_chapter(
                &[],
                &[],
                "Intro",
                "s1",
                vec![],
                ChapterSource::Manual,
                0,
                &mut ids
            )
            .is_none()
        );
        assert!(
            start_chapter(
                &[],
                &segments,
                "   ",
                "s1",
                vec![],
                ChapterSource::Manual,
                0,
                &mut ids
            )
            .is_none()
        );
        assert!(
            start_chapter(
                &[],
                &segments,
                "Intro",
                "missing",
                vec![],
                ChapterSource::Manual,
                0,
                &mut ids
            )
            .is_none()
        );
    }

    #[test]
    fn middle_chapter_stops_before_the_next_one() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Outro", "s4", &mut ids);
        let c = start(&b.chapters, &segments, "Main", "s2", &mut ids);

        let main = c
            .chapters
            .iter()
            .find(|ch| ch.id == c.chapter_id)
            .unwrap();
        assert_eq!(main.end_segment_id, "s3");
        assert_eq!(main.segment_count, 2);
    }

    #[test]
    fn update_chapter_patches_and_validates() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let one = start(&[], &segments, "Intro", "s1", &mut ids);

        assert!(
            update_chapter(
                &one.chapters,
                &segments,
                &one.chapter_id,
                &ChapterPatch {
                    title: Some("  ".to_string()),
                    ..Default::default()
                }
            )
            .is_none()
        );

        let patched = update_chapter(
            &one.chapters,
            &segments,
            &one.chapter_id,
            &ChapterPatch {
                title: Some("Renamed".to_string()),
                summary: Some("What happened".to_string()),
                end_segment_id: Some("s2".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(patched[0].title, "Renamed");
        assert_eq!(patched[0].summary.as_deref(), Some("What happened"));
        assert_eq!(patched[0].segment_count, 2);

        // clearing a summary with an empty string
        let cleared = update_chapter(
            &patched,
            &segments,
            &one.chapter_id,
            &ChapterPatch {
                summary: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cleared[0].summary, None);

        // an unknown end anchor cannot pass validation
        assert!(
            update_chapter(
                &one.chapters,
                &segments,
                &one.chapter_id,
                &ChapterPatch {
                    end_segment_id: Some("missing".to_string()),
                    ..Default::default()
                }
            )
            .is_none()
        );
    }

    #[test]
    fn update_chapter_rejects_overlap() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Main", "s3", &mut ids);

        // extending Intro over Main's range must be rejected wholesale
        let intro_id = &b.chapters[0].id;
        assert!(
            update_chapter(
                &b.chapters,
                &segments,
                intro_id,
                &ChapterPatch {
                    end_segment_id: Some("s4".to_string()),
                    ..Default::default()
                }
            )
            .is_none()
        );
    }

    #[test]
    fn move_start_renormalizes_both_sides() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Main", "s3", &mut ids);
        let main_id = b.chapter_id.clone();

        let moved = move_chapter_start(&b.chapters, &segments, &main_id, "s2").unwrap();
        assert_eq!(moved[0].end_segment_id, "s1");
        assert_eq!(moved[0].segment_count, 1);
        assert_eq!(moved[1].start_segment_id, "s2");
        assert_eq!(moved[1].segment_count, 3);
    }

    #[test]
    fn move_start_rejections() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Main", "s3", &mut ids);
        let main_id = b.chapter_id.clone();
        let intro_id = b.chapters[0].id.clone();

        // crossing the previous chapter's start
        assert!(move_chapter_start(&b.chapters, &segments, &main_id, "s1").is_none());
        // colliding with another chapter's start
        assert!(move_chapter_start(&b.chapters, &segments, &intro_id, "s3").is_none());
        // crossing the next chapter's start
        assert!(move_chapter_start(&b.chapters, &segments, &intro_id, "s4").is_none());
        // unknown segment
        assert!(move_chapter_start(&b.chapters, &segments, &main_id, "missing").is_none());
        // no-effect move
        assert!(move_chapter_start(&b.chapters, &segments, &main_id, "s3").is_none());
    }

    #[test]
    fn deleting_a_chapter_leaves_a_stored_gap() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Main", "s2", &mut ids);
        let c = start(&b.chapters, &segments, "Outro", "s4", &mut ids);
        let main_id = b.chapter_id.clone();

        let out = delete_chapter(&c.chapters, &main_id).unwrap();
        assert_eq!(out.len(), 2);
        // neighbors keep their stored anchors untouched
        assert_eq!(out[0].end_segment_id, "s1");
        assert_eq!(out[1].start_segment_id, "s4");

        // but the dynamic resolution flows Intro over the gap
        let ranges = resolve_ranges(&out, &segments);
        assert_eq!(ranges[0].end_index, 2);
    }

    #[test]
    fn dynamic_end_wins_over_stale_stored_end() {
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let a = start(&[], &segments, "Intro", "s1", &mut ids);
        let b = start(&a.chapters, &segments, "Main", "s3", &mut ids);

        // simulate a stale stored end left behind by an external edit
        let mut chapters = b.chapters.clone();
        chapters[0].end_segment_id = "s1".to_string();

        let ranges = resolve_ranges(&chapters, &segments);
        assert_eq!(ranges[0].start_index, 0);
        // dynamic policy: Intro still runs to the instant before Main
        assert_eq!(ranges[0].end_index, 1);
    }

    #[test]
    fn split_remaps_only_the_start_role() {
        let segments = vec![seg("s1", 0.0, 2.0), seg("s2", 2.0, 4.0)];
        let mut ids = SequentialIdGen::new();
        let out = start(&[], &segments, "Intro", "s1", &mut ids);
        assert_eq!(out.chapters[0].end_segment_id, "s2");

        let split = segments::split(&segments, "s1", 1, &mut ids).unwrap();
        let remapped = remap_and_filter(&out.chapters, &split.replacements, &split.segments);

        assert_eq!(remapped.len(), 1);
        assert_eq!(remapped[0].start_segment_id, split.first_id);
        assert_eq!(remapped[0].end_segment_id, "s2");
        assert_eq!(remapped[0].segment_count, 3);
    }

    #[test]
    fn dangling_anchors_drop_the_chapter() {
        let segments = vec![seg("s1", 0.0, 2.0)];
        let mut ids = SequentialIdGen::new();
        let out = start(&[], &segments, "Intro", "s1", &mut ids);

        // the sole segment disappears with nothing to fall back on
        let deleted = segments::delete(&segments, "s1").unwrap();
        let remapped = remap_and_filter(&out.chapters, &deleted.replacements, &deleted.segments);
        assert!(remapped.is_empty());
    }

    #[test]
    fn clear_reports_whether_anything_was_dropped() {
        assert!(clear(&[]).is_none());
        let segments = four_segments();
        let mut ids = SequentialIdGen::new();
        let out = start(&[], &segments, "Intro", "s1", &mut ids);
        assert_eq!(clear(&out.chapters), Some(vec![]));
    }
}
