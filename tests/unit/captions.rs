use super::*;
use crate::model::{Shot, VoLine};

fn manifest(shots: Vec<Shot>) -> AssetManifest {
    AssetManifest::new("m", "p", "file:///sl.json", "lock", shots)
}

#[test]
fn timestamp_format() {
    assert_eq!(format_timestamp(0), "00:00:00,000");
    assert_eq!(format_timestamp(2_000), "00:00:02,000");
    assert_eq!(format_timestamp(3_723_045), "01:02:03,045");
}

#[test]
fn untimed_line_spans_the_shot() {
    let m = manifest(vec![
        Shot::new("s1", 2_000).with_line(VoLine::new("l1", "narrator", "Hello world")),
    ]);
    assert_eq!(
        build_srt(&m),
        "1\n00:00:00,000 --> 00:00:02,000\nnarrator: Hello world\n"
    );
}

#[test]
fn short_spans_are_floored() {
    let m = manifest(vec![
        Shot::new("s1", 5_000).with_line(VoLine::new("l1", "a", "hi").with_timing(100, 300)),
    ]);
    let cues = build_cues(&m);
    assert_eq!(cues[0].start_ms, 100);
    assert_eq!(cues[0].end_ms, 1_100);
}

#[test]
fn overlapping_cues_are_pushed_apart() {
    let m = manifest(vec![
        Shot::new("s1", 4_000)
            .with_line(VoLine::new("l1", "a", "first").with_timing(0, 1_500))
            .with_line(VoLine::new("l2", "b", "second").with_timing(1_480, 3_000)),
    ]);
    let cues = build_cues(&m);
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[1].start_ms, 1_540);
    assert_eq!(cues[1].end_ms, 3_000);
    for pair in cues.windows(2) {
        assert!(pair[1].start_ms >= pair[0].end_ms + MIN_CUE_GAP_MS);
    }
    for cue in &cues {
        assert!(cue.end_ms - cue.start_ms >= MIN_CUE_DURATION_MS);
    }
}

#[test]
fn pushed_cue_keeps_the_floor() {
    let m = manifest(vec![
        Shot::new("s1", 4_000)
            .with_line(VoLine::new("l1", "a", "first").with_timing(0, 2_000))
            .with_line(VoLine::new("l2", "b", "second").with_timing(1_500, 2_600)),
    ]);
    let cues = build_cues(&m);
    assert_eq!(cues[1].start_ms, 2_040);
    assert_eq!(cues[1].end_ms, 3_040);
}

#[test]
fn offsets_are_relative_to_the_shot_start() {
    let m = manifest(vec![
        Shot::new("s1", 2_000),
        Shot::new("s2", 3_000).with_line(VoLine::new("l1", "a", "x").with_timing(500, 2_500)),
    ]);
    let cues = build_cues(&m);
    assert_eq!((cues[0].start_ms, cues[0].end_ms), (2_500, 4_500));
}

#[test]
fn cues_are_sorted_by_start() {
    let m = manifest(vec![
        Shot::new("s1", 6_000)
            .with_line(VoLine::new("late", "a", "late").with_timing(4_000, 5_500))
            .with_line(VoLine::new("early", "a", "early").with_timing(500, 2_000)),
    ]);
    let srt = build_srt(&m);
    let early = srt.find("a: early").unwrap();
    let late = srt.find("a: late").unwrap();
    assert!(early < late);
    assert!(srt.starts_with("1\n00:00:00,500 --> 00:00:02,000\n"));
}

#[test]
fn blank_text_is_skipped_and_empty_speaker_is_bare() {
    let m = manifest(vec![
        Shot::new("s1", 2_000)
            .with_line(VoLine::new("l1", "a", "   "))
            .with_line(VoLine::new("l2", "", "Just Text")),
    ]);
    assert_eq!(build_srt(&m), "1\n00:00:00,000 --> 00:00:02,000\nJust Text\n");
}

#[test]
fn no_lines_yields_empty_track() {
    let m = manifest(vec![Shot::new("s1", 2_000)]);
    assert!(build_cues(&m).is_empty());
    assert_eq!(build_srt(&m), "");
}

#[test]
fn multiple_blocks_are_separated_by_a_blank_line() {
    let m = manifest(vec![
        Shot::new("s1", 2_000).with_line(VoLine::new("l1", "A", "One")),
        Shot::new("s2", 2_000).with_line(VoLine::new("l2", "B", "Two")),
    ]);
    assert_eq!(
        build_srt(&m),
        "1\n00:00:00,000 --> 00:00:02,000\nA: One\n\n2\n00:00:02,040 --> 00:00:04,000\nB: Two\n"
    );
}

#[test]
fn write_srt_creates_empty_file_when_silent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.srt");
    let text = write_srt(&manifest(vec![Shot::new("s1", 1_000)]), &path).unwrap();
    assert_eq!(text, "");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}
