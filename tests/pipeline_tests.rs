//! Orchestrator behavior tests over mock capabilities.
//!
//! These validate path selection, artifact layout, cost accounting, and
//! cleanup without ffmpeg or API keys.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use vidsum::audio::{AudioUnit, MediaBackend};
use vidsum::config::Strategy;
use vidsum::error::{Result, VidsumError};
use vidsum::output::artifact_path;
use vidsum::pipeline::{Pipeline, PipelineOptions, PipelineResult};
use vidsum::summarize::{Summarizer, Summary};
use vidsum::transcribe::{Transcriber, Transcription};

// ============================================================================
// Mock capabilities
// ============================================================================

struct MockBackend {
    duration: f64,
    fail_cut_index: Option<usize>,
    cuts: AtomicUsize,
}

impl MockBackend {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_cut_index: None,
            cuts: AtomicUsize::new(0),
        }
    }

    fn failing_cut_on(duration: f64, index: usize) -> Self {
        Self {
            duration,
            fail_cut_index: Some(index),
            cuts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaBackend for MockBackend {
    fn duration(&self, _audio: &Path) -> f64 {
        self.duration
    }

    async fn extract_audio(&self, _video: &Path, dest: &Path) -> Result<()> {
        std::fs::write(dest, b"audio")?;
        Ok(())
    }

    async fn cut_range(
        &self,
        _source: &Path,
        dest: &Path,
        _start: f64,
        _duration: f64,
    ) -> Result<()> {
        let index = self.cuts.fetch_add(1, Ordering::SeqCst);
        if self.fail_cut_index == Some(index) {
            return Err(VidsumError::SegmentCut("mock cut failure".to_string()));
        }
        std::fs::write(dest, b"unit audio")?;
        Ok(())
    }
}

struct MockTranscriber {
    calls: AtomicUsize,
    fail_on_index: Option<usize>,
    cost: f64,
}

impl MockTranscriber {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_index: None,
            cost: 1.0,
        }
    }

    fn failing_on(index: usize) -> Self {
        Self {
            fail_on_index: Some(index),
            ..Self::new()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, unit: &AudioUnit) -> Result<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_index == Some(unit.index) {
            return Err(VidsumError::Transcription(
                "mock transcription failure".to_string(),
            ));
        }

        Ok(Transcription {
            text: format!("transcript {}", unit.index),
            cost: self.cost,
        })
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

struct MockSummarizer {
    calls: AtomicUsize,
    cost: f64,
}

impl MockSummarizer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            cost: 0.25,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Summary {
            markdown: format!("summary of: {text}"),
            cost: self.cost,
        })
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

// ============================================================================
// Harness
// ============================================================================

struct TestRun {
    _outdir: TempDir,
    workdir: TempDir,
    prefix: PathBuf,
    source: PathBuf,
}

fn setup() -> TestRun {
    let outdir = tempfile::tempdir().unwrap();
    let workdir = tempfile::tempdir().unwrap();
    let source = workdir.path().join("output.mp3");
    std::fs::write(&source, b"fake extracted audio").unwrap();
    let prefix = outdir.path().join("video");
    TestRun {
        _outdir: outdir,
        workdir,
        prefix,
        source,
    }
}

async fn run(
    backend: &MockBackend,
    transcriber: &MockTranscriber,
    summarizer: &MockSummarizer,
    strategy: Strategy,
    description: &str,
    test_run: &TestRun,
) -> Result<PipelineResult> {
    let pipeline = Pipeline::new(backend, transcriber, summarizer);
    let options = PipelineOptions {
        strategy,
        chunk_count: 4,
    };
    pipeline
        .run(
            &test_run.source,
            description,
            &test_run.prefix,
            test_run.workdir.path(),
            &options,
        )
        .await
}

// ============================================================================
// Path selection
// ============================================================================

#[tokio::test]
async fn auto_strategy_never_segments() {
    // An hour of audio under Auto is still sent whole: one transcription,
    // one summary, no chunk artifacts.
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Auto,
        "",
        &test_run,
    )
    .await
    .unwrap();

    assert_eq!(transcriber.call_count(), 1);
    assert_eq!(summarizer.call_count(), 1);
    assert!(result.final_summary.is_none());
    assert!(artifact_path(&test_run.prefix, "transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "summary.md").exists());
    assert!(!artifact_path(&test_run.prefix, "chunk_0_transcript.md").exists());
    assert!(!artifact_path(&test_run.prefix, "merged_transcript.md").exists());
}

#[tokio::test]
async fn short_audio_takes_short_path_under_any_strategy() {
    let backend = MockBackend::new(120.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await
    .unwrap();

    assert_eq!(transcriber.call_count(), 1);
    assert_eq!(result.transcript, "transcript 0");
    assert!(result.final_summary.is_none());
}

#[tokio::test]
async fn empty_audio_aborts_before_segmentation() {
    let backend = MockBackend::new(0.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await;

    assert!(matches!(result, Err(VidsumError::EmptyAudio)));
    assert_eq!(transcriber.call_count(), 0);
}

// ============================================================================
// Long path: equal partitioning
// ============================================================================

#[tokio::test]
async fn long_equal_produces_chunk_and_merged_artifacts() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await
    .unwrap();

    assert_eq!(transcriber.call_count(), 4);
    // Four per-chunk summaries plus the final merge pass.
    assert_eq!(summarizer.call_count(), 5);

    for i in 0..4 {
        assert!(artifact_path(&test_run.prefix, &format!("chunk_{i}_transcript.md")).exists());
        assert!(artifact_path(&test_run.prefix, &format!("chunk_{i}_summary.md")).exists());
    }
    assert!(artifact_path(&test_run.prefix, "merged_transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "merged_summary.md").exists());
    assert!(artifact_path(&test_run.prefix, "final_summary.md").exists());

    // Transcripts merged in segment order, blank-line separated.
    assert_eq!(
        result.transcript,
        "transcript 0\n\ntranscript 1\n\ntranscript 2\n\ntranscript 3"
    );
    assert!(result.final_summary.is_some());
}

#[tokio::test]
async fn cost_ledger_sums_unit_costs_plus_final_pass() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await
    .unwrap();

    // 4 units at 1.0 transcription each; 4 unit summaries plus the final
    // resummarize at 0.25 each.
    assert!((result.costs.transcription - 4.0).abs() < 1e-9);
    assert!((result.costs.summary - 1.25).abs() < 1e-9);
    assert!((result.costs.total() - 5.25).abs() < 1e-9);
}

#[tokio::test]
async fn failed_cut_drops_segment_but_run_continues() {
    let backend = MockBackend::failing_cut_on(3600.0, 1);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await
    .unwrap();

    assert_eq!(transcriber.call_count(), 3);
    // Indices are preserved from the plan; segment 1 leaves a hole.
    assert!(artifact_path(&test_run.prefix, "chunk_0_transcript.md").exists());
    assert!(!artifact_path(&test_run.prefix, "chunk_1_transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "chunk_2_transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "chunk_3_transcript.md").exists());
    assert!(result.final_summary.is_some());
}

#[tokio::test]
async fn transcribe_failure_aborts_but_keeps_earlier_artifacts() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::failing_on(2);
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await;

    assert!(matches!(result, Err(VidsumError::Transcription(_))));

    // Units 0 and 1 completed before the failure.
    assert!(artifact_path(&test_run.prefix, "chunk_0_transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "chunk_1_transcript.md").exists());
    // Nothing merged, no final summary.
    assert!(!artifact_path(&test_run.prefix, "merged_transcript.md").exists());
    assert!(!artifact_path(&test_run.prefix, "final_summary.md").exists());
}

// ============================================================================
// Long path: timestamps
// ============================================================================

#[tokio::test]
async fn timestamps_path_uses_section_labels() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let description = "0:00 Intro\n30:00 Second Half";
    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Timestamps,
        description,
        &test_run,
    )
    .await
    .unwrap();

    assert_eq!(transcriber.call_count(), 2);
    assert!(artifact_path(&test_run.prefix, "Intro_transcript.md").exists());
    assert!(artifact_path(&test_run.prefix, "Second_Half_summary.md").exists());
    assert!(!artifact_path(&test_run.prefix, "chunk_0_transcript.md").exists());

    // Merged pieces carry section headers.
    assert!(result.transcript.starts_with("## Intro\n\n"));
    assert!(result.transcript.contains("## Second_Half\n\n"));
}

#[tokio::test]
async fn timestamps_without_markers_falls_back_to_equal() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Timestamps,
        "no chapter markers here",
        &test_run,
    )
    .await
    .unwrap();

    // Fallback is Equal(4) with chunk-numbered artifacts, no section headers.
    assert_eq!(transcriber.call_count(), 4);
    for i in 0..4 {
        assert!(artifact_path(&test_run.prefix, &format!("chunk_{i}_transcript.md")).exists());
    }
    assert!(!result.transcript.contains("## "));
}

// ============================================================================
// Cleanup and determinism
// ============================================================================

#[tokio::test]
async fn unit_files_and_source_audio_are_deleted() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::new();
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await
    .unwrap();

    assert!(!test_run.source.exists());
    let leftover: Vec<_> = std::fs::read_dir(test_run.workdir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(
        leftover.is_empty(),
        "expected empty workdir, found {leftover:?}"
    );
}

#[tokio::test]
async fn source_audio_deleted_even_on_failure() {
    let backend = MockBackend::new(3600.0);
    let transcriber = MockTranscriber::failing_on(0);
    let summarizer = MockSummarizer::new();
    let test_run = setup();

    let result = run(
        &backend,
        &transcriber,
        &summarizer,
        Strategy::Equal,
        "",
        &test_run,
    )
    .await;

    assert!(result.is_err());
    assert!(!test_run.source.exists());
}

#[tokio::test]
async fn rerun_with_fixed_outputs_is_byte_identical() {
    let description = "0:00 Intro\n30:00 Outro";
    let mut merged = Vec::new();

    for _ in 0..2 {
        let backend = MockBackend::new(3600.0);
        let transcriber = MockTranscriber::new();
        let summarizer = MockSummarizer::new();
        let test_run = setup();

        let result = run(
            &backend,
            &transcriber,
            &summarizer,
            Strategy::Timestamps,
            description,
            &test_run,
        )
        .await
        .unwrap();

        let transcript_bytes =
            std::fs::read(artifact_path(&test_run.prefix, "merged_transcript.md")).unwrap();
        let summary_bytes =
            std::fs::read(artifact_path(&test_run.prefix, "merged_summary.md")).unwrap();
        merged.push((result.transcript, result.summary, transcript_bytes, summary_bytes));
    }

    assert_eq!(merged[0], merged[1]);
}
