//! # Word retiming
//!
//! When a segment's text is retyped by hand there is no audio re-analysis to
//! lean on — new per-word timestamps have to be synthesized from the old
//! ones. The old word list is the sole timing oracle: words that survive the
//! edit keep their recorded times, and only the gaps between survivors are
//! interpolated.
//!
//! Survivorship is decided by a longest-common-subsequence match between the
//! old word texts and the new tokens. Token equality is case- and
//! punctuation-insensitive, so fixing `hello` to `Hello!` keeps the word's
//! timing while adopting the new spelling.
//!
//! ## Invariant
//!
//! The returned word list exactly partitions `[segment.start, segment.end]`
//! with non-decreasing, contiguous boundaries, provided the input word list
//! did.

use crate::types::{Segment, Word};

/// Recompute a segment's word list for hand-edited text.
///
/// Returns `None` when the trimmed text equals the segment's current text —
/// the caller treats that as a no-op and must not record history for it.
pub fn retime_segment(segment: &Segment, new_text: &str) -> Option<Segment> {
    let trimmed = new_text.trim();
    if trimmed == segment.text {
        return None;
    }

    let new_tokens: Vec<&str> = trimmed.split_whitespace().collect();

    let words = if segment.words.is_empty() || new_tokens.is_empty() {
        synthesize_even(segment, &new_tokens)
    } else {
        align_words(segment, &new_tokens)
    };

    Some(Segment {
        text: Segment::joined_word_text(&words),
        words,
        ..segment.clone()
    })
}

// ── Matching ─────────────────────────────────────────────────────────────────

/// Case- and punctuation-insensitive normal form used for matching.
fn normal_form(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn tokens_match(a: &str, b: &str) -> bool {
    let (na, nb) = (normal_form(a), normal_form(b));
    if na.is_empty() && nb.is_empty() {
        // pure-punctuation tokens only match verbatim
        a == b
    } else {
        na == nb
    }
}

/// LCS matched pairs `(old_index, new_index)`, in order.
///
/// `dp[i][j]` holds the LCS length of `old[i..]` vs `new[j..]`; the forward
/// walk reconstructs one maximal matching. When both DP neighbors score
/// equally the walk advances the **old** side first — this decides which word
/// keeps its recorded timing when several alignments are valid, and is pinned
/// by tests.
fn lcs_pairs(old: &[Word], new_tokens: &[&str]) -> Vec<(usize, usize)> {
    let n = old.len();
    let m = new_tokens.len();

    let mut dp = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i][j] = if tokens_match(&old[i].text, new_tokens[j]) {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if tokens_match(&old[i].text, new_tokens[j]) {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

// ── Emission ─────────────────────────────────────────────────────────────────

fn align_words(segment: &Segment, new_tokens: &[&str]) -> Vec<Word> {
    let old = &segment.words;
    let pairs = lcs_pairs(old, new_tokens);

    let mut out: Vec<Word> = Vec::with_capacity(new_tokens.len());
    let (mut oi, mut nj) = (0usize, 0usize);

    for &(mi, mj) in &pairs {
        emit_run(segment, oi..mi, &new_tokens[nj..mj], Some(mi), &mut out);

        // matched: keep recorded timing and confidence, adopt the new text
        let o = &old[mi];
        out.push(Word {
            text: new_tokens[mj].to_string(),
            start: o.start,
            end: o.end,
            speaker_id: o.speaker_id.clone(),
            confidence: o.confidence,
        });

        oi = mi + 1;
        nj = mj + 1;
    }
    emit_run(
        segment,
        oi..old.len(),
        &new_tokens[nj..new_tokens.len()],
        None,
        &mut out,
    );

    clamp_edges(segment, &mut out);
    out
}

/// Interpolate one run of unmatched new tokens into `out`.
///
/// The region is bounded by the replaced old words when the old run is
/// non-empty; otherwise by the preceding emitted word and the next matched
/// old word, falling back to the segment's own edges.
fn emit_run(
    segment: &Segment,
    old_run: std::ops::Range<usize>,
    run_tokens: &[&str],
    next_match: Option<usize>,
    out: &mut Vec<Word>,
) {
    if run_tokens.is_empty() {
        return;
    }

    let (lo, hi) = if old_run.is_empty() {
        let lo = out.last().map_or(segment.start, |w| w.end);
        let hi = next_match.map_or(segment.end, |mi| segment.words[mi].start);
        (lo, hi)
    } else {
        (
            segment.words[old_run.start].start,
            segment.words[old_run.end - 1].end,
        )
    };

    let span = (hi - lo).max(0.0);
    let slot = span / run_tokens.len() as f64;
    for (k, token) in run_tokens.iter().enumerate() {
        let start = lo + slot * k as f64;
        let mut end = if k + 1 == run_tokens.len() {
            hi
        } else {
            lo + slot * (k + 1) as f64
        };
        if end < start {
            end = start;
        }
        out.push(Word {
            text: token.to_string(),
            start,
            end,
            speaker_id: segment.speaker_id.clone(),
            confidence: Some(1.0),
        });
    }
}

/// Divide `[start, end]` into equal-duration slots, one per token. Used when
/// there are no old words to align against, or no new tokens at all.
fn synthesize_even(segment: &Segment, new_tokens: &[&str]) -> Vec<Word> {
    if new_tokens.is_empty() {
        return Vec::new();
    }

    let span = (segment.end - segment.start).max(0.0);
    let slot = span / new_tokens.len() as f64;
    new_tokens
        .iter()
        .enumerate()
        .map(|(k, token)| {
            let start = segment.start + slot * k as f64;
            let end = if k + 1 == new_tokens.len() {
                segment.end
            } else {
                segment.start + slot * (k + 1) as f64
            };
            Word {
                text: token.to_string(),
                start,
                end: end.max(start),
                speaker_id: segment.speaker_id.clone(),
                confidence: Some(1.0),
            }
        })
        .collect()
}

/// Pin the first word's start and the last word's end to the segment edges so
/// edge deletions cannot leave the partition short.
fn clamp_edges(segment: &Segment, words: &mut [Word]) {
    if let Some(first) = words.first_mut() {
        first.start = segment.start;
        first.end = first.end.max(segment.start);
    }
    if let Some(last) = words.last_mut() {
        last.end = segment.end;
        last.start = last.start.min(segment.end);
    }
}
