//! Duration-proxy weight estimation
//!
//! When exact timestamps are absent, playback position and seek targets are
//! estimated by distributing a known (or estimated) duration over lines in
//! proportion to their text length. The resolver uses this forward
//! (position -> line) and the seek planner uses it inverse (line -> offset);
//! both must share the same weight function or they disagree about where a
//! line lives.

use serde::{Deserialize, Serialize};

use crate::transcript::{Line, Section};

/// Upper clamp on a single line's weight, so one run-on line cannot swallow
/// the whole section.
pub const MAX_LINE_WEIGHT: u64 = 400;

/// Named policy for text-length duration heuristics
///
/// These constants were tuned against generated Japanese/English episode
/// scripts and are product parameters, not derived values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EstimatorPolicy {
    /// Estimated speech duration per transcript character
    pub ms_per_char: u64,
    /// Lower clamp on an estimated section duration
    pub min_section_ms: u64,
    /// Upper clamp on an estimated section duration
    pub max_section_ms: u64,
}

impl Default for EstimatorPolicy {
    fn default() -> Self {
        Self {
            ms_per_char: 65,
            min_section_ms: 4_000,
            max_section_ms: 600_000,
        }
    }
}

impl EstimatorPolicy {
    /// Best-available duration for a section.
    ///
    /// Preference order: measured chunk duration, declared global bounds,
    /// text-length heuristic (clamped).
    pub fn section_estimate_ms(&self, section: &Section) -> u64 {
        if let Some(audio_ms) = section.audio_ms.filter(|ms| *ms > 0) {
            return audio_ms;
        }
        if let Some((start, end)) = section.global_bounds() {
            return end - start;
        }
        self.text_estimate_ms(section.text_chars())
    }

    /// Heuristic duration for `chars` characters of transcript text.
    pub fn text_estimate_ms(&self, chars: usize) -> u64 {
        (chars as u64 * self.ms_per_char).clamp(self.min_section_ms, self.max_section_ms)
    }
}

/// Duration-proxy weight of one line of text.
///
/// Empty lines still get weight 1 so every line owns a nonzero slice of the
/// section and remains reachable by weighted seeks.
pub fn line_weight(text: &str) -> u64 {
    (text.trim().chars().count() as u64).clamp(1, MAX_LINE_WEIGHT)
}

/// Total weight of a run of lines, never zero.
pub fn total_weight(lines: &[Line]) -> u64 {
    lines.iter().map(|l| line_weight(&l.text)).sum::<u64>().max(1)
}

/// Offset of a weight prefix within a duration, rounded to the nearest
/// millisecond.
pub fn estimate_offset_ms(prefix_weight: u64, total_weight: u64, duration_ms: u64) -> u64 {
    let total = total_weight.max(1);
    (duration_ms as f64 * prefix_weight as f64 / total as f64).round() as u64
}
