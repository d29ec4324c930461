//! Pipeline orchestration: path decision, sequential unit processing,
//! merge and final resummarization, cost accounting, artifact persistence.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::audio::{
    materialize_segments, plan_equal_partition, plan_timestamp_partition, AudioUnit,
    MediaBackend, Segment,
};
use crate::config::Strategy;
use crate::error::{Result, VidsumError};
use crate::output::{artifact_path, save_markdown};
use crate::summarize::Summarizer;
use crate::timestamps::extract_timestamps;
use crate::transcribe::Transcriber;

/// Audio at or below this duration is always processed whole.
pub const SHORT_DURATION_THRESHOLD_SECS: f64 = 30.0 * 60.0;

/// Default segment count for equal partitioning.
pub const DEFAULT_CHUNK_COUNT: usize = 4;

/// Running totals of estimated external-service spend for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostLedger {
    /// Total transcription cost in USD.
    pub transcription: f64,
    /// Total summarization cost in USD, including the final merge pass.
    pub summary: f64,
}

impl CostLedger {
    pub fn add_transcription(&mut self, cost: f64) {
        self.transcription += cost;
    }

    pub fn add_summary(&mut self, cost: f64) {
        self.summary += cost;
    }

    pub fn total(&self) -> f64 {
        self.transcription + self.summary
    }
}

/// Per-unit output, appended in segment order.
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub transcript: String,
    pub summary: String,
    pub transcript_cost: f64,
    pub summary_cost: f64,
    pub label: Option<String>,
}

/// Final pipeline output.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Merged transcript (or the sole transcript on the short path).
    pub transcript: String,
    /// Merged per-unit summaries (or the sole summary on the short path).
    pub summary: String,
    /// Summary-of-summaries; `None` on the short path.
    pub final_summary: Option<String>,
    pub costs: CostLedger,
}

/// Discrete progress notifications emitted while a run advances.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Preparing,
    DurationProbed {
        seconds: f64,
    },
    Partitioned {
        units: usize,
    },
    ProcessingUnit {
        index: usize,
        total: usize,
        label: Option<String>,
    },
    Merging,
    Finished,
}

/// Observer callback for [`ProgressEvent`]s, passed into the pipeline by the
/// driver. There is no global progress state.
pub type ProgressSink = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Options chosen by the driver for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub strategy: Strategy,
    /// Segment count for equal partitioning.
    pub chunk_count: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            chunk_count: DEFAULT_CHUNK_COUNT,
        }
    }
}

/// Processes one audio unit: transcribe, then summarize.
///
/// No retries at this layer; failures propagate as `Transcription` /
/// `Summarization` errors. The caller owns unit file deletion.
pub struct UnitProcessor<'a> {
    transcriber: &'a dyn Transcriber,
    summarizer: &'a dyn Summarizer,
}

impl<'a> UnitProcessor<'a> {
    pub fn new(transcriber: &'a dyn Transcriber, summarizer: &'a dyn Summarizer) -> Self {
        Self {
            transcriber,
            summarizer,
        }
    }

    pub async fn process(&self, unit: &AudioUnit) -> Result<UnitResult> {
        let transcription = self.transcriber.transcribe(unit).await?;
        let summary = self.summarizer.summarize(&transcription.text).await?;

        Ok(UnitResult {
            transcript: transcription.text,
            summary: summary.markdown,
            transcript_cost: transcription.cost,
            summary_cost: summary.cost,
            label: unit.segment.label.clone(),
        })
    }
}

/// Removes the extracted source audio when the run ends, success or failure.
struct SourceCleanupGuard {
    path: PathBuf,
}

impl Drop for SourceCleanupGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove source audio {}: {}", self.path.display(), e);
            } else {
                debug!("Removed source audio {}", self.path.display());
            }
        }
    }
}

fn remove_unit_file(unit: &AudioUnit) {
    if let Err(e) = std::fs::remove_file(&unit.path) {
        warn!(
            "Failed to remove unit file {}: {}",
            unit.path.display(),
            e
        );
    }
}

/// The orchestrator: drives segmentation, per-unit processing, and merging
/// over injected capabilities. Processing is strictly sequential.
pub struct Pipeline<'a> {
    backend: &'a dyn MediaBackend,
    transcriber: &'a dyn Transcriber,
    summarizer: &'a dyn Summarizer,
    progress: Option<ProgressSink>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        backend: &'a dyn MediaBackend,
        transcriber: &'a dyn Transcriber,
        summarizer: &'a dyn Summarizer,
    ) -> Self {
        Self {
            backend,
            transcriber,
            summarizer,
            progress: None,
        }
    }

    /// Attach a progress observer.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.progress {
            sink(&event);
        }
    }

    /// Run the full pipeline over extracted audio.
    ///
    /// `audio_path` is deleted when this returns, success or failure. Unit
    /// files are deleted as they are processed, so at most one processed
    /// unit's file is ever retained beyond its transcribe+summarize pair.
    pub async fn run(
        &self,
        audio_path: &Path,
        description: &str,
        output_prefix: &Path,
        workdir: &Path,
        options: &PipelineOptions,
    ) -> Result<PipelineResult> {
        let _source_guard = SourceCleanupGuard {
            path: audio_path.to_path_buf(),
        };

        self.emit(ProgressEvent::Preparing);

        let total_duration = self.backend.duration(audio_path);
        if total_duration == 0.0 {
            return Err(VidsumError::EmptyAudio);
        }

        info!("Audio duration: {:.2} seconds", total_duration);
        self.emit(ProgressEvent::DurationProbed {
            seconds: total_duration,
        });

        // Auto always takes the short path, regardless of duration. Preserved
        // policy: an hour-long video under Auto is transcribed whole.
        if total_duration <= SHORT_DURATION_THRESHOLD_SECS || options.strategy == Strategy::Auto {
            return self.run_short(audio_path, total_duration, output_prefix).await;
        }

        match options.strategy {
            Strategy::Timestamps => {
                self.run_long_timestamps(
                    audio_path,
                    total_duration,
                    description,
                    output_prefix,
                    workdir,
                    options.chunk_count,
                )
                .await
            }
            Strategy::Auto | Strategy::Equal => {
                self.run_long_equal(
                    audio_path,
                    total_duration,
                    output_prefix,
                    workdir,
                    options.chunk_count,
                )
                .await
            }
        }
    }

    async fn run_short(
        &self,
        audio_path: &Path,
        total_duration: f64,
        prefix: &Path,
    ) -> Result<PipelineResult> {
        info!("Processing short audio file");

        let unit = AudioUnit {
            path: audio_path.to_path_buf(),
            segment: Segment {
                start: 0.0,
                duration: total_duration,
                label: None,
            },
            index: 0,
        };

        self.emit(ProgressEvent::ProcessingUnit {
            index: 0,
            total: 1,
            label: None,
        });

        let processor = UnitProcessor::new(self.transcriber, self.summarizer);
        let result = processor.process(&unit).await?;

        let mut ledger = CostLedger::default();
        ledger.add_transcription(result.transcript_cost);
        ledger.add_summary(result.summary_cost);

        save_markdown(&artifact_path(prefix, "transcript.md"), &result.transcript)?;
        save_markdown(&artifact_path(prefix, "summary.md"), &result.summary)?;

        self.emit(ProgressEvent::Finished);

        Ok(PipelineResult {
            transcript: result.transcript,
            summary: result.summary,
            final_summary: None,
            costs: ledger,
        })
    }

    async fn run_long_equal(
        &self,
        audio_path: &Path,
        total_duration: f64,
        prefix: &Path,
        workdir: &Path,
        chunk_count: usize,
    ) -> Result<PipelineResult> {
        info!("Processing long audio file with equal partitioning");

        let plan = plan_equal_partition(total_duration, chunk_count);
        let units = materialize_segments(self.backend, audio_path, &plan, workdir).await?;
        self.emit(ProgressEvent::Partitioned { units: units.len() });

        let processor = UnitProcessor::new(self.transcriber, self.summarizer);
        let mut ledger = CostLedger::default();
        let mut transcripts = Vec::with_capacity(units.len());
        let mut summaries = Vec::with_capacity(units.len());

        for unit in &units {
            info!("Processing chunk {}", unit.index);
            self.emit(ProgressEvent::ProcessingUnit {
                index: unit.index,
                total: units.len(),
                label: None,
            });

            let outcome = processor.process(unit).await;
            remove_unit_file(unit);
            let result = outcome?;

            ledger.add_transcription(result.transcript_cost);
            ledger.add_summary(result.summary_cost);

            save_markdown(
                &artifact_path(prefix, &format!("chunk_{}_transcript.md", unit.index)),
                &result.transcript,
            )?;
            save_markdown(
                &artifact_path(prefix, &format!("chunk_{}_summary.md", unit.index)),
                &result.summary,
            )?;

            transcripts.push(result.transcript);
            summaries.push(result.summary);
        }

        self.finish_long(prefix, transcripts, summaries, ledger).await
    }

    async fn run_long_timestamps(
        &self,
        audio_path: &Path,
        total_duration: f64,
        description: &str,
        prefix: &Path,
        workdir: &Path,
        chunk_count: usize,
    ) -> Result<PipelineResult> {
        let markers = extract_timestamps(description);
        if markers.is_empty() {
            warn!("No timestamps found in description, falling back to equal partitioning");
            return self
                .run_long_equal(audio_path, total_duration, prefix, workdir, chunk_count)
                .await;
        }

        info!(
            "Processing long audio file with {} timestamp sections",
            markers.len()
        );

        let plan = plan_timestamp_partition(total_duration, &markers);
        let units = materialize_segments(self.backend, audio_path, &plan, workdir).await?;
        self.emit(ProgressEvent::Partitioned { units: units.len() });

        let processor = UnitProcessor::new(self.transcriber, self.summarizer);
        let mut ledger = CostLedger::default();
        let mut transcripts = Vec::with_capacity(units.len());
        let mut summaries = Vec::with_capacity(units.len());

        for unit in &units {
            let label = unit.segment.label.clone().unwrap_or_default();
            info!("Processing section {}", label);
            self.emit(ProgressEvent::ProcessingUnit {
                index: unit.index,
                total: units.len(),
                label: Some(label.clone()),
            });

            let outcome = processor.process(unit).await;
            remove_unit_file(unit);
            let result = outcome?;

            ledger.add_transcription(result.transcript_cost);
            ledger.add_summary(result.summary_cost);

            save_markdown(
                &artifact_path(prefix, &format!("{label}_transcript.md")),
                &result.transcript,
            )?;
            save_markdown(
                &artifact_path(prefix, &format!("{label}_summary.md")),
                &result.summary,
            )?;

            transcripts.push(format!("## {label}\n\n{}", result.transcript));
            summaries.push(format!("## {label}\n\n{}", result.summary));
        }

        self.finish_long(prefix, transcripts, summaries, ledger).await
    }

    /// Merge unit outputs and run the final summarize-of-summaries pass.
    async fn finish_long(
        &self,
        prefix: &Path,
        transcripts: Vec<String>,
        summaries: Vec<String>,
        mut ledger: CostLedger,
    ) -> Result<PipelineResult> {
        self.emit(ProgressEvent::Merging);

        let merged_transcript = transcripts.join("\n\n");
        let merged_summary = summaries.join("\n\n");

        let final_summary = self.summarizer.summarize(&merged_summary).await?;
        ledger.add_summary(final_summary.cost);

        save_markdown(
            &artifact_path(prefix, "merged_transcript.md"),
            &merged_transcript,
        )?;
        save_markdown(&artifact_path(prefix, "merged_summary.md"), &merged_summary)?;
        save_markdown(
            &artifact_path(prefix, "final_summary.md"),
            &final_summary.markdown,
        )?;

        self.emit(ProgressEvent::Finished);

        Ok(PipelineResult {
            transcript: merged_transcript,
            summary: merged_summary,
            final_summary: Some(final_summary.markdown),
            costs: ledger,
        })
    }
}
