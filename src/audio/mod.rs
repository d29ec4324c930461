pub mod extract;
pub mod segment;

pub use extract::{check_ffmpeg, check_ffprobe, FfmpegBackend};
pub use segment::{materialize_segments, plan_equal_partition, plan_timestamp_partition};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A time range of the source audio to be processed as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Start offset in seconds.
    pub start: f64,
    /// Length in seconds.
    pub duration: f64,
    /// Section label, present for timestamp-based partitions.
    pub label: Option<String>,
}

impl Segment {
    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A materialized audio file corresponding to exactly one [`Segment`].
///
/// Units are transient: the pipeline deletes the file as soon as the unit's
/// transcribe and summarize calls complete, success or failure.
#[derive(Debug, Clone)]
pub struct AudioUnit {
    pub path: PathBuf,
    pub segment: Segment,
    pub index: usize,
}

/// Media decoding capabilities consumed by the pipeline.
///
/// The production implementation shells out to ffmpeg/ffprobe; tests swap in
/// a mock so orchestration logic runs without external tools.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Probed duration in seconds. Returns 0.0 when the probe fails,
    /// which callers treat as "no audio".
    fn duration(&self, audio: &Path) -> f64;

    /// Extract the audio track of a local video file into `dest`.
    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()>;

    /// Cut the range `[start, start + duration)` of `source` into a
    /// standalone audio file at `dest`.
    async fn cut_range(&self, source: &Path, dest: &Path, start: f64, duration: f64)
        -> Result<()>;
}
