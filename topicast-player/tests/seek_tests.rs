//! Seek planner integration tests
//!
//! Tier precedence, fall-through on engine rejection, clamping, and the
//! global weighted fallback.

mod helpers;

use helpers::{global_line, line, section, timed_line, RecordingEngine};
use topicast_common::transcript::{Section, SectionStatus};
use topicast_player::playback::seek::SeekPlanner;
use topicast_player::playback::source_map::SectionSourceMap;
use topicast_player::state::PlaybackSnapshot;

fn playback(duration_ms: u64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        position_ms: 0,
        duration_ms,
        playing: true,
        current_source_index: Some(0),
    }
}

#[test]
fn test_exact_global_line_timestamp_wins_over_everything() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // The line carries valid global bounds AND relative bounds AND lives in
    // a mapped ready section; the global timestamp must win.
    let mut target = global_line("the line", 42_000, 45_000);
    target.start_ms = Some(7_000);
    target.end_ms = Some(10_000);
    let sections = vec![Section {
        audio_ms: Some(20_000),
        global_start_ms: Some(35_000),
        global_end_ms: Some(55_000),
        ..section(0, SectionStatus::Ready, vec![line("first"), target])
    }];
    let map = SectionSourceMap::build(&sections, 1);

    assert!(planner.seek_to_section_line(&sections, &map, &playback(100_000), 0, 1));
    assert_eq!(engine.seeks(), vec![(42_000, None)]);
}

#[test]
fn test_degenerate_global_bounds_fall_to_source_relative() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // end == start makes the global bounds unusable
    let mut target = global_line("the line", 42_000, 42_000);
    target.start_ms = Some(7_000);
    let sections = vec![section(
        0,
        SectionStatus::Ready,
        vec![line("first"), target],
    )];
    let map = SectionSourceMap::build(&sections, 1);

    assert!(planner.seek_to_section_line(&sections, &map, &playback(100_000), 0, 1));
    assert_eq!(engine.seeks(), vec![(7_000, Some(0))]);
}

#[test]
fn test_source_relative_weighted_estimate() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // No line timing at all; weights 10/50/5 over 6500ms put line 1 at
    // 6500 * 10/65 = 1000ms within its own chunk.
    let sections = vec![Section {
        audio_ms: Some(6_500),
        ..section(
            0,
            SectionStatus::Ready,
            vec![
                line(&"a".repeat(10)),
                line(&"b".repeat(50)),
                line(&"c".repeat(5)),
            ],
        )
    }];
    let map = SectionSourceMap::build(&sections, 1);

    assert!(planner.seek_to_section_line(&sections, &map, &playback(100_000), 0, 1));
    assert_eq!(engine.seeks(), vec![(1_000, Some(0))]);
}

#[test]
fn test_rejected_source_seek_falls_through_to_absolute() {
    let engine = RecordingEngine::new();
    engine.reject_source_seeks(true);
    let planner = SeekPlanner::new(engine.clone());

    let sections = vec![Section {
        audio_ms: Some(6_500),
        global_start_ms: Some(30_000),
        ..section(
            0,
            SectionStatus::Ready,
            vec![timed_line("first", 0, 2_000), timed_line("second", 2_000, 6_500)],
        )
    }];
    let map = SectionSourceMap::build(&sections, 1);

    assert!(planner.seek_to_section_line(&sections, &map, &playback(100_000), 0, 1));
    // Source-relative (2000, Some(0)) was rejected; the accepted seek is
    // section start + line start.
    assert_eq!(engine.seeks(), vec![(32_000, None)]);
}

#[test]
fn test_section_start_plus_weighted_estimate() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // Section not mapped (chunk not queued yet), no line timing, but the
    // section declares its global start and bounds.
    let sections = vec![Section {
        global_start_ms: Some(10_000),
        global_end_ms: Some(16_500),
        ..section(
            0,
            SectionStatus::Generated,
            vec![
                line(&"a".repeat(10)),
                line(&"b".repeat(50)),
                line(&"c".repeat(5)),
            ],
        )
    }];
    let map = SectionSourceMap::build(&sections, 0);

    assert!(planner.seek_to_section_line(&sections, &map, &playback(100_000), 0, 1));
    // 10_000 + 6500 * 10/65
    assert_eq!(engine.seeks(), vec![(11_000, None)]);
}

#[test]
fn test_offsets_clamp_to_player_duration() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    let sections = vec![section(
        0,
        SectionStatus::Ready,
        vec![global_line("late line", 90_000, 95_000)],
    )];
    let map = SectionSourceMap::default();

    // Player only knows about 60s of audio so far
    assert!(planner.seek_to_section_line(&sections, &map, &playback(60_000), 0, 0));
    assert_eq!(engine.seeks(), vec![(60_000, None)]);
}

#[test]
fn test_untimed_transcript_uses_global_weighted_fallback() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // No timing anywhere, nothing queued: the only handle is the flattened
    // weight distribution against the known player duration.
    let sections = vec![
        section(
            0,
            SectionStatus::Generated,
            vec![line(&"a".repeat(30)), line(&"b".repeat(30))],
        ),
        section(
            1,
            SectionStatus::Generated,
            vec![line(&"c".repeat(30)), line(&"d".repeat(30))],
        ),
    ];
    let map = SectionSourceMap::default();

    assert!(planner.seek_to_section_line(&sections, &map, &playback(120_000), 1, 0));
    // Prefix weight 60 of 120 -> half the duration
    assert_eq!(engine.seeks(), vec![(60_000, None)]);
}

#[test]
fn test_all_tiers_exhausted_performs_no_seek() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    // No timing, nothing queued, and the player duration is unknown.
    let sections = vec![section(0, SectionStatus::Generated, vec![line("only")])];
    let map = SectionSourceMap::default();

    assert!(!planner.seek_to_section_line(&sections, &map, &playback(0), 0, 0));
    assert!(engine.seeks().is_empty());
}

#[test]
fn test_out_of_range_targets_are_no_ops() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    let sections = vec![section(0, SectionStatus::Ready, vec![line("only")])];
    let map = SectionSourceMap::build(&sections, 1);
    let pb = playback(10_000);

    assert!(!planner.seek_to_section_line(&sections, &map, &pb, 7, 0));
    assert!(!planner.seek_to_section_line(&sections, &map, &pb, 0, 5));
    assert!(!planner.seek_to_global_line(&sections, &map, &pb, 1));
    assert!(engine.seeks().is_empty());
}

#[test]
fn test_global_line_seek_prefers_exact_timestamps() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    let sections = vec![
        section(0, SectionStatus::Ready, vec![line("a"), line("b")]),
        section(
            1,
            SectionStatus::Ready,
            vec![global_line("target", 21_000, 24_000)],
        ),
    ];
    let map = SectionSourceMap::build(&sections, 2);

    // Global ordinal 2 is the first line of section 1
    assert!(planner.seek_to_global_line(&sections, &map, &playback(60_000), 2));
    assert_eq!(engine.seeks(), vec![(21_000, None)]);
}

#[test]
fn test_global_line_seek_walks_to_owning_section() {
    let engine = RecordingEngine::new();
    let planner = SeekPlanner::new(engine.clone());

    let sections = vec![
        section(0, SectionStatus::Ready, vec![line("a"), line("b")]),
        Section {
            audio_ms: Some(8_000),
            ..section(
                1,
                SectionStatus::Ready,
                vec![line(&"c".repeat(20)), line(&"d".repeat(20))],
            )
        },
    ];
    let map = SectionSourceMap::build(&sections, 2);

    // Ordinal 3 -> section 1, local line 1 -> source-relative weighted
    // estimate: 8000 * 20/40 = 4000 within source 1.
    assert!(planner.seek_to_global_line(&sections, &map, &playback(60_000), 3));
    assert_eq!(engine.seeks(), vec![(4_000, Some(1))]);
}
