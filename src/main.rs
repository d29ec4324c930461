use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vidsum::audio::{check_ffmpeg, check_ffprobe, FfmpegBackend};
use vidsum::config::{Config, Strategy};
use vidsum::pipeline::{Pipeline, PipelineOptions, PipelineResult, ProgressEvent, ProgressSink};
use vidsum::source::{self, youtube, InputSource};
use vidsum::summarize::ChatSummarizer;
use vidsum::transcribe::WhisperClient;

#[derive(Parser)]
#[command(name = "vidsum")]
#[command(version, about = "AI video summarizer")]
#[command(
    long_about = "Transcribe and summarize YouTube videos or local video files using AI, \
with estimated cost tracking."
)]
struct Cli {
    /// YouTube URL or local video file path
    input: String,

    /// Partitioning method for long videos (timestamps requires a YouTube source)
    #[arg(short, long, default_value = "auto")]
    partition: String,

    /// Number of chunks for equal partitioning
    #[arg(short, long)]
    chunks: Option<usize>,

    /// Directory for transcript and summary artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn render_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Preparing => "Preparing audio...".to_string(),
        ProgressEvent::DurationProbed { seconds } => {
            format!("Audio duration: {:.1} min", seconds / 60.0)
        }
        ProgressEvent::Partitioned { units } => format!("Created {units} audio segments"),
        ProgressEvent::ProcessingUnit {
            index,
            total,
            label,
        } => match label {
            Some(label) => format!("Processing section {label} ({}/{total})", index + 1),
            None => format!("Processing chunk {}/{total}", index + 1),
        },
        ProgressEvent::Merging => "Merging and summarizing...".to_string(),
        ProgressEvent::Finished => "Done".to_string(),
    }
}

fn progress_spinner() -> (ProgressBar, ProgressSink) {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let sink_pb = pb.clone();
    let sink: ProgressSink = Box::new(move |event| {
        sink_pb.set_message(render_event(event));
    });

    (pb, sink)
}

fn print_summary(result: &PipelineResult) {
    println!();
    println!("Costs:");
    println!("  Transcription: ${:.4}", result.costs.transcription);
    println!("  Summary:       ${:.4}", result.costs.summary);
    println!("  Total:         ${:.4}", result.costs.total());
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Parse strategy
    let strategy: Strategy = cli
        .partition
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // Load and validate configuration
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let output_dir = cli.output_dir.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    // Check external tools up front
    check_ffmpeg().context("FFmpeg check failed")?;
    check_ffprobe().context("FFprobe check failed")?;

    let input = InputSource::parse(&cli.input);
    if input.is_youtube() {
        youtube::check_yt_dlp().await.context("yt-dlp check failed")?;
    }

    info!("Input:     {}", cli.input);
    info!("Partition: {}", strategy);
    info!("Output:    {}", output_dir.display());

    // Per-run working directory for the extracted audio and segment files.
    let workdir = tempfile::tempdir().context("Failed to create temp directory")?;

    let backend = FfmpegBackend::new();
    let acquired = source::acquire(&input, &backend, workdir.path())
        .await
        .context("Failed to prepare audio")?;

    let output_prefix = output_dir.join(&acquired.base_name);

    let transcriber = WhisperClient::new(api_key.clone());
    let summarizer = ChatSummarizer::new(api_key);

    let mut pipeline = Pipeline::new(&backend, &transcriber, &summarizer);

    let spinner = if cli.no_progress {
        None
    } else {
        let (pb, sink) = progress_spinner();
        pipeline = pipeline.with_progress(sink);
        Some(pb)
    };

    let options = PipelineOptions {
        strategy,
        chunk_count: cli.chunks.unwrap_or(config.chunk_count),
    };

    let result = pipeline
        .run(
            &acquired.audio_path,
            &acquired.description,
            &output_prefix,
            workdir.path(),
            &options,
        )
        .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = result.context("Pipeline failed")?;

    print_summary(&result);
    info!(
        "Transcription and summary saved with prefix {}",
        output_prefix.display()
    );

    Ok(())
}
