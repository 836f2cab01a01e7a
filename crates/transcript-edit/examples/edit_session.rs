//! End-to-end walkthrough of the editing API: load a small transcript, edit
//! text, split and merge segments, annotate chapters, then undo part of it.
//!
//! ```bash
//! cargo run -p transcript-edit --example edit_session
//! ```

use transcript_edit::{
    ChapterPatch, Segment, SequentialIdGen, Speaker, TranscriptEditor, Word,
};

fn seg(id: &str, start: f64, end: f64, words: &[(&str, f64, f64)]) -> Segment {
    let words: Vec<Word> = words
        .iter()
        .map(|&(text, start, end)| Word {
            text: text.to_string(),
            start,
            end,
            speaker_id: None,
            confidence: Some(0.82),
        })
        .collect();
    Segment {
        id: id.to_string(),
        speaker_id: Some("host".to_string()),
        tag_ids: vec![],
        start,
        end,
        text: Segment::joined_word_text(&words),
        words,
        confirmed: false,
        bookmarked: false,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut editor = TranscriptEditor::with_ids(SequentialIdGen::new());

    editor.load_transcript(
        vec![
            seg(
                "s1",
                0.0,
                3.0,
                &[("welcome", 0.0, 1.0), ("back", 1.0, 2.0), ("everyone", 2.0, 3.0)],
            ),
            seg(
                "s2",
                3.0,
                6.0,
                &[("todays", 3.0, 4.0), ("topic", 4.0, 5.0), ("is", 5.0, 6.0)],
            ),
            seg("s3", 6.0, 9.0, &[("rust", 6.0, 7.5), ("editors", 7.5, 9.0)]),
        ],
        vec![Speaker {
            id: "host".to_string(),
            name: "Host".to_string(),
        }],
        vec![],
        vec![],
    )?;

    // fix a typo without losing word timings
    editor.update_segment_text("s2", "Today's topic is");

    // structural edits
    let (first, _) = editor.split_segment("s1", 2).expect("split is valid");
    let merged = editor.merge_segments("s2", "s3").expect("adjacent");
    println!("split first half {first}, merged tail {merged}");

    // chapters
    let intro = editor.start_chapter("Intro", &first, vec![]).expect("chapter");
    editor.update_chapter(
        &intro,
        &ChapterPatch {
            summary: Some("Greetings and framing".to_string()),
            ..Default::default()
        },
    );

    for range in editor.chapter_ranges() {
        println!(
            "chapter {} spans segments {}..={}",
            range.chapter_id, range.start_index, range.end_index
        );
    }

    // a couple of undos roll back the chapter work
    editor.undo();
    editor.undo();
    println!("chapters after undo: {}", editor.chapters().len());

    println!("{}", serde_json::to_string_pretty(&editor.snapshot())?);
    Ok(())
}
