use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use thiserror::Error;

use stitch_core::{
    load_config, AdPlacement, MediaTools, OutputLayout, Pipeline, PipelineError, RunReport,
    SegmentFailurePolicy, StitchConfig,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] stitch_core::ConfigError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Playout schedule and HLS manifest generator", long_about = None)]
pub struct Cli {
    /// Path to the schedule config JSON
    #[arg(long, default_value = "configs/schedule.json")]
    pub config: PathBuf,
    /// Directory receiving chunk files and manifests
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,
    /// Path to the ffmpeg binary
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
    /// Path to the ffprobe binary
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Segment every asset, assemble the timeline and write manifests
    Run,
    /// Parse and validate the schedule config without side effects
    Validate,
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "stitchctl", &mut std::io::stdout());
            Ok(())
        }
        Commands::Validate => {
            let config = load_config(&cli.config)?;
            let summary = ValidationSummary::from_config(&config);
            render(&summary, cli.format)
        }
        Commands::Run => {
            let config = load_config(&cli.config)?;
            let tools = MediaTools {
                ffmpeg: cli.ffmpeg.clone(),
                ffprobe: cli.ffprobe.clone(),
            };
            let pipeline = Pipeline::with_tools(config, &cli.output_dir, tools);
            let runtime = tokio::runtime::Runtime::new()?;
            let report = runtime.block_on(pipeline.run())?;
            render(&report, cli.format)
        }
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub videos: usize,
    pub ads: usize,
    pub segment_duration_sec: u32,
    pub cue_interval_sec: u32,
    pub min_last_segment_sec: u32,
    pub defer_remainder_sec: u32,
    pub layout: OutputLayout,
    pub on_segment_error: SegmentFailurePolicy,
    pub master_manifest_name: Option<String>,
}

impl ValidationSummary {
    fn from_config(config: &StitchConfig) -> Self {
        Self {
            videos: config.videos.len(),
            ads: config.ads.len(),
            segment_duration_sec: config.segment_duration_sec,
            cue_interval_sec: config.cue_interval_sec,
            min_last_segment_sec: config.min_last_segment_sec,
            defer_remainder_sec: config.defer_remainder_sec,
            layout: config.layout,
            on_segment_error: config.on_segment_error,
            master_manifest_name: config.master_manifest_name.clone(),
        }
    }
}

impl DisplayFallback for ValidationSummary {
    fn display(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "config ok");
        let _ = writeln!(out, "  videos: {}  ads: {}", self.videos, self.ads);
        let _ = writeln!(
            out,
            "  segment {}s, cue >= {}s, min trailing {}s, defer <= {}s",
            self.segment_duration_sec,
            self.cue_interval_sec,
            self.min_last_segment_sec,
            self.defer_remainder_sec
        );
        let _ = write!(
            out,
            "  layout: {:?}, on segment error: {:?}",
            self.layout, self.on_segment_error
        );
        out
    }
}

impl DisplayFallback for RunReport {
    fn display(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "run complete ({:?} layout, {} timeline entries, {} discontinuities)",
            self.layout, self.timeline_entries, self.discontinuities
        );
        for show in &self.shows {
            let placement = match &show.placement {
                Some(AdPlacement::MidShow { ad_id, cue_index }) => {
                    format!("ad {ad_id} inserted after segment {cue_index}")
                }
                Some(AdPlacement::EndOfShow { ad_id }) => {
                    format!("ad {ad_id} appended after show")
                }
                None => "no ad".to_string(),
            };
            let _ = writeln!(
                out,
                "  show {}: {} segments, {:.3}s, {placement}",
                show.id, show.segments, show.duration_sec
            );
        }
        for ad in &self.ads {
            let _ = writeln!(
                out,
                "  ad {}: {} segments, {:.3}s",
                ad.id, ad.segments, ad.duration_sec
            );
        }
        for skipped in &self.skipped {
            let _ = writeln!(
                out,
                "  skipped {} ({}): {}",
                skipped.id, skipped.file_path, skipped.reason
            );
        }
        if let Some(trailer) = &self.trailer_ad {
            let _ = writeln!(out, "  trailer ad: {trailer}");
        }
        for manifest in &self.manifests {
            let _ = writeln!(out, "  wrote {}", manifest.display());
        }
        out.trim_end().to_string()
    }
}
