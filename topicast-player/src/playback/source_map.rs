//! Section ↔ audio source correspondence
//!
//! Chunks are enqueued one per ready section, in ascending section order,
//! so the i-th queued source belongs to the i-th ready section. The map is
//! a cheap pure function of (sections, enqueued count) and is rebuilt from
//! the current snapshot on every query; there is no cache to go stale.

use topicast_common::transcript::Section;

/// Bijection between ready `section_index` values and 0-based positions in
/// the physically queued source list
///
/// Truncated to `min(ready_sections, enqueued_chunks)`: a section can be
/// marked ready a poll before its chunk is enqueued, and a chunk is never
/// enqueued before its section is ready.
#[derive(Debug, Clone, Default)]
pub struct SectionSourceMap {
    /// `(section_index, source_position)`, ascending in both components
    entries: Vec<(u32, usize)>,
}

impl SectionSourceMap {
    pub fn build(sections: &[Section], enqueued_len: usize) -> Self {
        let mut ready: Vec<u32> = sections
            .iter()
            .filter(|s| s.is_ready())
            .map(|s| s.section_index)
            .collect();
        ready.sort_unstable();

        let limit = ready.len().min(enqueued_len);
        let entries = ready
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(position, section_index)| (section_index, position))
            .collect();
        Self { entries }
    }

    /// Queued source position owning the given section, if mapped.
    pub fn source_for_section(&self, section_index: u32) -> Option<usize> {
        self.entries
            .iter()
            .find(|(index, _)| *index == section_index)
            .map(|(_, position)| *position)
    }

    /// Section owning the given queued source position, if mapped.
    pub fn section_for_source(&self, source_position: usize) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, position)| *position == source_position)
            .map(|(index, _)| *index)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
