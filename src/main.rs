// SYNOID Main Entry Point
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use chaos_cut::agent::audio_tools::{
    read_hits_file, write_hits_file, BassOnsetAnalyzer, OnsetAnalyzer, OnsetReport,
};
use chaos_cut::agent::compiler::VideoCompiler;
use chaos_cut::agent::interval_scheduler::{schedule, total_ideal_duration};
use chaos_cut::agent::onset_filter::{extend_to_duration, filter};
use chaos_cut::agent::health;
use chaos_cut::config::DEFAULT_CONFIG_FILE;
use chaos_cut::{ChaosConfig, ChaosError};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chaos-cut")]
#[command(about = "Beat-synchronized chaos cut video compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a project folder (audio track + source clips) into one video
    Compile {
        /// Folder holding the audio track and the source videos
        folder: PathBuf,

        /// Config file (defaults to $CHAOS_CONFIG or chaos_config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for source selection and cut placement
        #[arg(long)]
        seed: Option<u64>,

        /// Reuse bass_hits.txt instead of analyzing the audio again
        #[arg(long)]
        skip_detection: bool,
    },

    /// Detect bass hits in an audio track
    Detect {
        /// Audio track to analyze
        audio: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the hit list (defaults to bass_hits.txt next to the audio)
        #[arg(long)]
        hits: Option<PathBuf>,

        /// Also write the JSON energy report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the segment plan for a saved hit list
    Plan {
        /// Hit list, one timestamp per line
        hits: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var("CHAOS_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn load_config(explicit: Option<PathBuf>) -> Result<ChaosConfig> {
    let path = config_path(explicit);
    let config = ChaosConfig::load(&path).with_context(|| format!("loading config {:?}", path))?;
    info!("[CONFIG] Using {:?}", path);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("--- CHAOS CUT v{} ---", env!("CARGO_PKG_VERSION"));

    let args = Cli::parse();

    let result = match args.command {
        Commands::Compile {
            folder,
            config,
            seed,
            skip_detection,
        } => run_compile(folder, config, seed, skip_detection).await,
        Commands::Detect {
            audio,
            config,
            hits,
            report,
        } => run_detect(&audio, config, hits, report).await,
        Commands::Plan { hits, config } => run_plan(&hits, config).await,
        Commands::Config { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            ChaosConfig::default()
                .save(&path)
                .with_context(|| format!("writing {:?}", path))?;
            println!("📝 Default config written to {:?}", path);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("❌ {:#}", e);
        if let Some(hint) = input_hint(e) {
            error!("   {}", hint);
        }
    }
    result
}

/// Input problems get a pointer at what to fix; transcoder and IO failures
/// speak for themselves.
fn input_hint(err: &anyhow::Error) -> Option<&'static str> {
    let chaos = err.downcast_ref::<ChaosError>()?;
    if !chaos.is_input_error() {
        return None;
    }
    Some(match chaos {
        ChaosError::EmptyPool => "Add .mov/.mp4 clips longer than min_input_video_len to the folder.",
        _ => "The track needs at least two bass hits; try a lower onset_delta or cooldown.",
    })
}

async fn run_compile(
    folder: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    skip_detection: bool,
) -> Result<()> {
    let missing = health::check_dependencies();
    if !missing.is_empty() {
        warn!("⚠️ Missing dependencies: {:?}. Compilation will likely fail.", missing);
    }

    let mut config = load_config(config)?;
    if seed.is_some() {
        config.seed = seed;
    }
    if skip_detection {
        config.enable_bass_detection = false;
    }

    let summary = VideoCompiler::with_ffmpeg(folder, config).compile().await?;

    println!("🎬 Chaos cut complete");
    println!("   Hits:      {}", summary.hits);
    println!("   Segments:  {} of {} delivered", summary.delivered, summary.plans);
    if !summary.failed.is_empty() {
        println!("   Failed:    {:?}", summary.failed);
    }
    println!("   Planned:   {:.2}s (drift {:+.3}s)", summary.ideal_duration, summary.final_error);
    match summary.output {
        Some(path) => println!("   Output:    {:?}", path),
        None => println!("   Output:    (none, final stages disabled)"),
    }
    Ok(())
}

async fn run_detect(
    audio: &Path,
    config: Option<PathBuf>,
    hits: Option<PathBuf>,
    report: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config)?;
    let analysis = BassOnsetAnalyzer::new(&config)
        .analyze(audio)
        .await
        .with_context(|| format!("analyzing {:?}", audio))?;

    let filtered = filter(&analysis.onsets, config.cooldown)?;
    let mut kept = filtered.kept.clone();
    extend_to_duration(&mut kept, analysis.duration);

    let hits_path = hits.unwrap_or_else(|| audio.with_file_name("bass_hits.txt"));
    write_hits_file(&hits_path, &kept).await?;

    if let Some(report_path) = report {
        OnsetReport::new(&config, &analysis.curve, &filtered)
            .write_json(&report_path)
            .await?;
    }

    println!(
        "🥁 {} raw onsets, {} kept after {}s cooldown, {} dropped",
        analysis.onsets.len(),
        filtered.kept.len(),
        config.cooldown,
        filtered.dropped.len()
    );
    println!("   Hits saved to {:?}", hits_path);
    Ok(())
}

async fn run_plan(hits: &Path, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let kept = read_hits_file(hits)
        .await
        .with_context(|| format!("reading {:?}", hits))?;
    let plans = schedule(&kept, config.min_clip, config.max_clip)?;

    for plan in &plans {
        println!(
            "seg {:04}  @ {:>9.3}s  {:.3}s",
            plan.index, plan.start, plan.ideal_duration
        );
    }
    println!(
        "{} segments, {:.3}s total",
        plans.len(),
        total_ideal_duration(&plans)
    );
    Ok(())
}
