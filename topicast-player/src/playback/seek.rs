//! Seek planning
//!
//! Turns a "jump to this line" intent into the most precise engine seek
//! achievable, degrading through the same precision tiers as resolution:
//! exact per-line absolute timestamps, a source-relative offset within the
//! owning chunk, section-start arithmetic, and finally a weighted estimate
//! over the flattened transcript. A rejected engine command falls through
//! to the next tier; exhausting every tier performs no seek at all.
//!
//! Callers pass the section/map/playback snapshots taken at the moment the
//! intent was issued; a racing queue mutation makes the target at worst
//! slightly stale, never an error.

use std::sync::Arc;

use tracing::{debug, warn};
use topicast_common::timing;
use topicast_common::transcript::{Line, Section};

use crate::engine::AudioEngine;
use crate::playback::source_map::SectionSourceMap;
use crate::state::PlaybackSnapshot;

/// Plans and issues seek commands against snapshots of current state
pub struct SeekPlanner {
    engine: Arc<dyn AudioEngine>,
}

impl SeekPlanner {
    pub fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self { engine }
    }

    /// Seek to a line addressed by (section, line) indices.
    ///
    /// Returns whether a seek command was accepted; out-of-range targets
    /// are a no-op.
    pub fn seek_to_section_line(
        &self,
        sections: &[Section],
        source_map: &SectionSourceMap,
        playback: &PlaybackSnapshot,
        section_index: u32,
        line_index: usize,
    ) -> bool {
        let Some(section) = sections.iter().find(|s| s.section_index == section_index) else {
            debug!("Seek target section {} unknown, no-op", section_index);
            return false;
        };
        let Some(line) = section.lines.get(line_index) else {
            debug!(
                "Seek target line {} out of range in section {}, no-op",
                line_index, section_index
            );
            return false;
        };

        // Exact per-line absolute timestamps always win.
        if let Some((start, _)) = line.global_bounds() {
            if self.try_seek(clamp_offset(start, playback), None) {
                return true;
            }
        }

        if self.seek_within_section(section, source_map, playback, section_index, line_index) {
            return true;
        }

        // Last resort: the line's global ordinal against the whole episode.
        let ordinal = global_ordinal(sections, section_index, line_index);
        self.seek_by_global_estimate(sections, playback, ordinal)
    }

    /// Seek to a line addressed by its index in the flattened transcript.
    pub fn seek_to_global_line(
        &self,
        sections: &[Section],
        source_map: &SectionSourceMap,
        playback: &PlaybackSnapshot,
        global_index: usize,
    ) -> bool {
        let Some((section, line_index)) = locate_global_line(sections, global_index) else {
            debug!("Global line {} out of range, no-op", global_index);
            return false;
        };
        let line = &section.lines[line_index];

        if let Some((start, _)) = line.global_bounds() {
            if self.try_seek(clamp_offset(start, playback), None) {
                return true;
            }
        }

        if self.seek_within_section(
            section,
            source_map,
            playback,
            section.section_index,
            line_index,
        ) {
            return true;
        }

        self.seek_by_global_estimate(sections, playback, global_index)
    }

    /// Source-relative and section-start tiers, shared by both entry points.
    fn seek_within_section(
        &self,
        section: &Section,
        source_map: &SectionSourceMap,
        playback: &PlaybackSnapshot,
        section_index: u32,
        line_index: usize,
    ) -> bool {
        let line = &section.lines[line_index];

        // Source-relative: the owning chunk is physically queued, so a
        // local offset lands exactly even without global timestamps.
        if let Some(source_index) = source_map.source_for_section(section_index) {
            let local = line.start_ms.unwrap_or_else(|| {
                weighted_line_offset(section, line_index, best_section_duration(section, playback))
            });
            if self.try_seek(clamp_offset(local, playback), Some(source_index)) {
                return true;
            }
        }

        // Absolute arithmetic from the declared section start.
        if let Some(section_start) = section.global_start_ms {
            if let Some(line_start) = line.start_ms {
                if self.try_seek(clamp_offset(section_start + line_start, playback), None) {
                    return true;
                }
            }
            let estimate =
                weighted_line_offset(section, line_index, best_section_duration(section, playback));
            if self.try_seek(clamp_offset(section_start + estimate, playback), None) {
                return true;
            }
        }

        false
    }

    /// Weight every line of the episode and scale by the player duration.
    fn seek_by_global_estimate(
        &self,
        sections: &[Section],
        playback: &PlaybackSnapshot,
        global_index: usize,
    ) -> bool {
        if playback.duration_ms == 0 {
            debug!("No player duration for global estimate, no-op");
            return false;
        }
        let mut prefix = 0u64;
        let mut total = 0u64;
        let mut seen = 0usize;
        for section in sections {
            for line in &section.lines {
                let weight = timing::line_weight(&line.text);
                if seen < global_index {
                    prefix += weight;
                }
                total += weight;
                seen += 1;
            }
        }
        if global_index >= seen {
            return false;
        }
        let offset = timing::estimate_offset_ms(prefix, total.max(1), playback.duration_ms);
        self.try_seek(clamp_offset(offset, playback), None)
    }

    /// Issue one seek command; a rejection is logged and reported as a
    /// tier miss, never propagated.
    fn try_seek(&self, offset_ms: u64, source_index: Option<usize>) -> bool {
        match self.engine.seek(offset_ms, source_index) {
            Ok(()) => {
                debug!(
                    "Seek issued: {}ms (source index {:?})",
                    offset_ms, source_index
                );
                true
            }
            Err(e) => {
                warn!(
                    "Seek to {}ms (source index {:?}) rejected, falling through: {}",
                    offset_ms, source_index, e
                );
                false
            }
        }
    }
}

/// Clamp into `[0, duration_ms]` when the player duration is known.
fn clamp_offset(offset_ms: u64, playback: &PlaybackSnapshot) -> u64 {
    if playback.duration_ms > 0 {
        offset_ms.min(playback.duration_ms)
    } else {
        offset_ms
    }
}

/// Best-available duration for seek estimates: measured chunk audio, else
/// declared global bounds, else the total player duration.
fn best_section_duration(section: &Section, playback: &PlaybackSnapshot) -> u64 {
    if let Some(audio_ms) = section.audio_ms.filter(|ms| *ms > 0) {
        return audio_ms;
    }
    if let Some((start, end)) = section.global_bounds() {
        return end - start;
    }
    playback.duration_ms
}

/// Offset of `line_index` within its section under weighted distribution.
fn weighted_line_offset(section: &Section, line_index: usize, duration_ms: u64) -> u64 {
    let prefix: u64 = section.lines[..line_index]
        .iter()
        .map(|l: &Line| timing::line_weight(&l.text))
        .sum();
    let total = timing::total_weight(&section.lines);
    timing::estimate_offset_ms(prefix, total, duration_ms)
}

/// Index of (section, line) in the flattened line sequence.
fn global_ordinal(sections: &[Section], section_index: u32, line_index: usize) -> usize {
    sections
        .iter()
        .filter(|s| s.section_index < section_index)
        .map(|s| s.lines.len())
        .sum::<usize>()
        + line_index
}

/// Walk cumulative per-section line counts to the owning section.
fn locate_global_line(sections: &[Section], global_index: usize) -> Option<(&Section, usize)> {
    let mut remaining = global_index;
    for section in sections {
        if remaining < section.lines.len() {
            return Some((section, remaining));
        }
        remaining -= section.lines.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use topicast_common::transcript::SectionStatus;

    fn line(text: &str) -> Line {
        Line {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_global_ordinal_counts_preceding_sections() {
        let sections = vec![
            Section {
                section_index: 0,
                lines: vec![line("a"), line("b")],
                ..Default::default()
            },
            Section {
                section_index: 2,
                lines: vec![line("c"), line("d"), line("e")],
                ..Default::default()
            },
        ];
        assert_eq!(global_ordinal(&sections, 0, 1), 1);
        assert_eq!(global_ordinal(&sections, 2, 0), 2);
        assert_eq!(global_ordinal(&sections, 2, 2), 4);
    }

    #[test]
    fn test_locate_global_line() {
        let sections = vec![
            Section {
                section_index: 0,
                lines: vec![line("a"), line("b")],
                ..Default::default()
            },
            Section {
                section_index: 1,
                lines: vec![line("c")],
                ..Default::default()
            },
        ];
        let (section, local) = locate_global_line(&sections, 2).unwrap();
        assert_eq!(section.section_index, 1);
        assert_eq!(local, 0);
        assert!(locate_global_line(&sections, 3).is_none());
    }

    #[test]
    fn test_weighted_line_offset_matches_estimator() {
        let section = Section {
            section_index: 0,
            status: SectionStatus::Ready,
            audio_ms: Some(6_500),
            lines: vec![
                line(&"a".repeat(10)),
                line(&"b".repeat(50)),
                line(&"c".repeat(5)),
            ],
            ..Default::default()
        };
        // Prefix weight before line 1 is 10 of 65: 6500 * 10/65 = 1000
        assert_eq!(weighted_line_offset(&section, 1, 6_500), 1_000);
        assert_eq!(weighted_line_offset(&section, 0, 6_500), 0);
        // Before line 2: 60 of 65 -> 6000
        assert_eq!(weighted_line_offset(&section, 2, 6_500), 6_000);
    }

    #[test]
    fn test_best_section_duration_preference() {
        let playback = PlaybackSnapshot {
            duration_ms: 99_000,
            ..Default::default()
        };
        let with_audio = Section {
            audio_ms: Some(5_000),
            global_start_ms: Some(0),
            global_end_ms: Some(8_000),
            ..Default::default()
        };
        assert_eq!(best_section_duration(&with_audio, &playback), 5_000);

        let with_bounds = Section {
            global_start_ms: Some(2_000),
            global_end_ms: Some(8_000),
            ..Default::default()
        };
        assert_eq!(best_section_duration(&with_bounds, &playback), 6_000);

        let bare = Section::default();
        assert_eq!(best_section_duration(&bare, &playback), 99_000);
    }
}
