//! Partition planning and segment materialization.
//!
//! Planning is pure math over the total duration; materialization invokes the
//! media backend to cut each planned segment into a standalone audio file.

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::timestamps::SectionMarker;

use super::{AudioUnit, MediaBackend, Segment};

/// Partition `[0, total_duration)` into `count` equal segments.
///
/// The last segment absorbs the rounding remainder so the durations sum to
/// `total_duration` exactly. Returns an empty plan when there is no audio
/// (`total_duration == 0`), which callers treat as an abort signal.
pub fn plan_equal_partition(total_duration: f64, count: usize) -> Vec<Segment> {
    if total_duration == 0.0 || count == 0 {
        return Vec::new();
    }

    let chunk_duration = total_duration / count as f64;

    (0..count)
        .map(|i| {
            let start = i as f64 * chunk_duration;
            let duration = if i == count - 1 {
                total_duration - start
            } else {
                chunk_duration
            };
            Segment {
                start,
                duration,
                label: None,
            }
        })
        .collect()
}

/// Partition `[0, total_duration)` along section markers.
///
/// Segment `i` runs from `markers[i].offset` to the next marker's offset, or
/// to `total_duration` for the last marker. Marker ordering is not validated;
/// out-of-order offsets produce undefined (possibly negative) durations.
pub fn plan_timestamp_partition(total_duration: f64, markers: &[SectionMarker]) -> Vec<Segment> {
    markers
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let end = markers
                .get(i + 1)
                .map_or(total_duration, |next| next.offset);
            Segment {
                start: marker.offset,
                duration: end - marker.offset,
                label: Some(marker.label.clone()),
            }
        })
        .collect()
}

/// Cut each planned segment into its own audio file under `workdir`.
///
/// A failed cut is logged and that segment dropped; the remaining segments
/// still materialize (a coverage gap is preferred over aborting the run).
/// Unit indices follow the plan, so a dropped segment leaves a hole rather
/// than renumbering its successors.
pub async fn materialize_segments(
    backend: &dyn MediaBackend,
    source: &Path,
    plan: &[Segment],
    workdir: &Path,
) -> Result<Vec<AudioUnit>> {
    std::fs::create_dir_all(workdir)?;

    info!(
        "Materializing {} segments in {}",
        plan.len(),
        workdir.display()
    );

    let mut units = Vec::with_capacity(plan.len());

    for (index, segment) in plan.iter().enumerate() {
        let file_name = match &segment.label {
            Some(label) => format!("chunk_{index}_{label}.mp3"),
            None => format!("chunk_equal_{index}.mp3"),
        };
        let path = workdir.join(file_name);

        match backend
            .cut_range(source, &path, segment.start, segment.duration)
            .await
        {
            Ok(()) => units.push(AudioUnit {
                path,
                segment: segment.clone(),
                index,
            }),
            Err(e) => warn!("Dropping segment {index}: {e}"),
        }
    }

    Ok(units)
}
