//! Section marker extraction from video description text.

use regex::Regex;
use std::sync::OnceLock;

/// A section boundary found in a video description.
///
/// Markers are returned in the order they appear in the text and are never
/// re-sorted. A description that lists timestamps out of order yields
/// out-of-order markers, and downstream segment durations are undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMarker {
    /// Offset from the start of the audio, in seconds.
    pub offset: f64,
    /// Filesystem-safe section label.
    pub label: String,
}

static TIMESTAMP_RE: OnceLock<Regex> = OnceLock::new();

fn timestamp_re() -> &'static Regex {
    TIMESTAMP_RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}:\d{2}(?::\d{2})?)\s+(.+)").expect("valid timestamp regex")
    })
}

/// Extract `MM:SS label` / `H:MM:SS label` section markers from a description.
///
/// Returns an empty vec when nothing matches; callers treat that as
/// "timestamp strategy unavailable" and fall back to equal partitioning.
pub fn extract_timestamps(description: &str) -> Vec<SectionMarker> {
    let mut markers = Vec::new();

    for caps in timestamp_re().captures_iter(description) {
        let parts: Vec<&str> = caps[1].split(':').collect();
        let Some(offset) = clock_to_seconds(&parts) else {
            continue;
        };
        markers.push(SectionMarker {
            offset,
            label: sanitize_label(&caps[2]),
        });
    }

    markers
}

fn clock_to_seconds(parts: &[&str]) -> Option<f64> {
    let nums: Vec<u32> = parts
        .iter()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;

    match nums.as_slice() {
        [h, m, s] => Some(f64::from(h * 3600 + m * 60 + s)),
        [m, s] => Some(f64::from(m * 60 + s)),
        _ => None,
    }
}

/// Trim, replace spaces with underscores, and strip everything outside
/// `[A-Za-z0-9_]` so the label is safe to embed in a filename.
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
