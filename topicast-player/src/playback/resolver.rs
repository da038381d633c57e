//! Position → active (section, line) resolution
//!
//! Pure functions of the current snapshots; no state and no failure paths.
//! Three tiers of timing precision, tried in order: the engine's reported
//! source index, declared absolute section timestamps, and estimated
//! cumulative durations. Within the chosen section the same laddering
//! applies per line (absolute bounds, section-relative bounds, weighted
//! distribution over text length).

use topicast_common::timing::{self, EstimatorPolicy};
use topicast_common::transcript::Section;

use crate::playback::source_map::SectionSourceMap;
use crate::state::PlaybackSnapshot;

/// The currently spoken place in the transcript
///
/// `line_index` is `None` for a section with no lines (yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePosition {
    pub section_index: u32,
    pub line_index: Option<usize>,
}

/// Resolve the active (section, line) for the current playback position.
///
/// Returns `None` only when `sections` is empty; otherwise always a
/// best-effort answer.
pub fn resolve(
    playback: &PlaybackSnapshot,
    sections: &[Section],
    source_map: &SectionSourceMap,
    policy: &EstimatorPolicy,
) -> Option<ActivePosition> {
    if sections.is_empty() {
        return None;
    }
    let position = playback.position_ms;

    // Source-index tier: the engine tells us which queued source is
    // playing, and each queued source is a standalone file, so the raw
    // position is already local to the owning section.
    if let Some(source_index) = playback.current_source_index {
        if let Some(section_index) = source_map.section_for_source(source_index) {
            if let Some(section) = sections.iter().find(|s| s.section_index == section_index) {
                let absolute = section.global_start_ms.map(|start| start + position);
                return Some(ActivePosition {
                    section_index,
                    line_index: resolve_line(section, position, absolute, policy),
                });
            }
        }
    }

    // Absolute-timestamp tier
    if sections.iter().any(|s| s.global_bounds().is_some()) {
        return Some(resolve_by_global_bounds(position, sections, policy));
    }

    // Estimated-cumulative tier
    Some(resolve_by_estimates(position, sections, policy))
}

/// Scan declared `[global_start_ms, global_end_ms)` ranges for containment,
/// flooring to the nearest earlier section when the position falls in a gap.
fn resolve_by_global_bounds(
    position: u64,
    sections: &[Section],
    policy: &EstimatorPolicy,
) -> ActivePosition {
    for section in sections {
        if let Some((start, end)) = section.global_bounds() {
            if position >= start && position < end {
                return ActivePosition {
                    section_index: section.section_index,
                    line_index: resolve_line(
                        section,
                        position - start,
                        Some(position),
                        policy,
                    ),
                };
            }
        }
    }

    // No range contains the position: floor to the last section that starts
    // at or before it, else the first section.
    let floor = sections
        .iter()
        .filter(|s| s.global_start_ms.is_some_and(|start| start <= position))
        .last()
        .unwrap_or(&sections[0]);
    let local = floor
        .global_start_ms
        .map_or(position, |start| position.saturating_sub(start));
    ActivePosition {
        section_index: floor.section_index,
        line_index: resolve_line(floor, local, Some(position), policy),
    }
}

/// Accumulate estimated durations until the position falls inside one;
/// positions past every range select the last section.
fn resolve_by_estimates(
    position: u64,
    sections: &[Section],
    policy: &EstimatorPolicy,
) -> ActivePosition {
    let mut cursor = 0u64;
    let mut chosen = &sections[0];
    let mut local = position;
    for section in sections {
        let estimate = policy.section_estimate_ms(section);
        chosen = section;
        local = position.saturating_sub(cursor);
        if position < cursor + estimate {
            break;
        }
        cursor += estimate;
    }
    ActivePosition {
        section_index: chosen.section_index,
        line_index: resolve_line(chosen, local, None, policy),
    }
}

/// Line resolution within a chosen section.
///
/// `local` is the position relative to the section's audio; `absolute` is
/// its episode-absolute form when one can be derived.
fn resolve_line(
    section: &Section,
    local: u64,
    absolute: Option<u64>,
    policy: &EstimatorPolicy,
) -> Option<usize> {
    if section.lines.is_empty() {
        return None;
    }

    // Exact absolute per-line timestamps
    if let Some(absolute) = absolute {
        for (index, line) in section.lines.iter().enumerate() {
            if let Some((start, end)) = line.global_bounds() {
                if absolute >= start && absolute < end {
                    return Some(index);
                }
            }
        }
    }

    // Exact section-relative per-line timestamps
    for (index, line) in section.lines.iter().enumerate() {
        if let Some((start, end)) = line.relative_bounds() {
            if local >= start && local < end {
                return Some(index);
            }
        }
    }

    // Weighted distribution over text length
    let weights: Vec<u64> = section
        .lines
        .iter()
        .map(|l| timing::line_weight(&l.text))
        .collect();
    let total: u64 = weights.iter().sum::<u64>().max(1);
    let duration = policy.section_estimate_ms(section);
    let ratio = if duration == 0 {
        0.0
    } else {
        (local as f64 / duration as f64).clamp(0.0, 1.0)
    };
    let target = (total as f64 * ratio).round() as u64;

    let mut cumulative = 0u64;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= target {
            return Some(index);
        }
    }
    Some(section.lines.len() - 1)
}
