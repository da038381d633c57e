//! Transcript data model
//!
//! Sections and lines as emitted by the generation backend. Timing fields
//! are optional and may trail behind status: a section can be `ready` before
//! its per-line timings arrive, and early polls carry no timing at all.
//! All optional timing is modeled as `Option<u64>` milliseconds; absence is
//! never encoded as a numeric sentinel.

use serde::{Deserialize, Serialize};

/// Section generation/synthesis lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Announced by the planner, no script yet
    #[default]
    Pending,
    /// Script generation in progress
    Generating,
    /// Script complete, synthesis not yet finished
    Generated,
    /// Audio chunk synthesized and available
    Ready,
    /// Forward compatibility with stages this client does not know
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionStatus::Pending => write!(f, "pending"),
            SectionStatus::Generating => write!(f, "generating"),
            SectionStatus::Generated => write!(f, "generated"),
            SectionStatus::Ready => write!(f, "ready"),
            SectionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One spoken utterance within a section
///
/// `start_ms`/`end_ms` are relative to the start of the containing section's
/// audio chunk; `global_start_ms`/`global_end_ms` are absolute positions in
/// the full episode.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Line {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_end_ms: Option<u64>,
}

impl Line {
    /// Section-relative bounds, if both ends are present and the range is
    /// non-degenerate (end > start).
    pub fn relative_bounds(&self) -> Option<(u64, u64)> {
        match (self.start_ms, self.end_ms) {
            (Some(start), Some(end)) if end > start => Some((start, end)),
            _ => None,
        }
    }

    /// Absolute bounds, if both ends are present and end > start.
    pub fn global_bounds(&self) -> Option<(u64, u64)> {
        match (self.global_start_ms, self.global_end_ms) {
            (Some(start), Some(end)) if end > start => Some((start, end)),
            _ => None,
        }
    }

    /// Character count of the trimmed text, used as a duration proxy.
    pub fn text_chars(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// A structural unit of the transcript with its own generation/synthesis
/// lifecycle
///
/// `section_index` is stable and ascending; sections are mutated in place
/// upstream as status advances but are never reordered.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Section {
    pub section_index: u32,
    #[serde(rename = "section_title", default)]
    pub title: String,
    #[serde(default)]
    pub status: SectionStatus,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_end_ms: Option<u64>,
    /// Measured duration of the synthesized chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ms: Option<u64>,
}

impl Section {
    /// Whether a synthesized audio chunk exists for this section.
    pub fn is_ready(&self) -> bool {
        self.status == SectionStatus::Ready
    }

    /// Absolute bounds, if both ends are present and end > start.
    pub fn global_bounds(&self) -> Option<(u64, u64)> {
        match (self.global_start_ms, self.global_end_ms) {
            (Some(start), Some(end)) if end > start => Some((start, end)),
            _ => None,
        }
    }

    /// Total trimmed character count across all lines.
    pub fn text_chars(&self) -> usize {
        self.lines.iter().map(Line::text_chars).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_known_and_unknown() {
        let s: SectionStatus = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(s, SectionStatus::Ready);

        let s: SectionStatus = serde_json::from_str("\"generated\"").unwrap();
        assert_eq!(s, SectionStatus::Generated);

        // Stages this client does not know must not fail the whole poll
        let s: SectionStatus = serde_json::from_str("\"remixing\"").unwrap();
        assert_eq!(s, SectionStatus::Unknown);
    }

    #[test]
    fn test_section_deserializes_backend_record() {
        let json = r#"{
            "section_index": 2,
            "section_title": "Main developments",
            "status": "ready",
            "lines": [
                {"speaker": "Host", "text": "First line.", "start_ms": 0, "end_ms": 2100},
                {"speaker": "Guest", "text": "Second line."}
            ],
            "audio_ms": 5200,
            "chapter_id": "c1"
        }"#;
        let section: Section = serde_json::from_str(json).unwrap();
        assert_eq!(section.section_index, 2);
        assert_eq!(section.title, "Main developments");
        assert!(section.is_ready());
        assert_eq!(section.lines.len(), 2);
        assert_eq!(section.lines[0].relative_bounds(), Some((0, 2100)));
        assert_eq!(section.lines[1].relative_bounds(), None);
        assert_eq!(section.audio_ms, Some(5200));
    }

    #[test]
    fn test_degenerate_bounds_are_unusable() {
        let line = Line {
            global_start_ms: Some(3000),
            global_end_ms: Some(3000),
            ..Default::default()
        };
        assert_eq!(line.global_bounds(), None);

        let section = Section {
            global_start_ms: Some(0),
            global_end_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(section.global_bounds(), None);
    }

    #[test]
    fn test_text_chars_trims() {
        let line = Line {
            text: "  hello  ".to_string(),
            ..Default::default()
        };
        assert_eq!(line.text_chars(), 5);
    }
}
