// SYNOID Chaos Compiler - Full Pipeline
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Drives one compile of a project folder:
// 1. Bass hits (detect and persist, or load the saved list)
// 2. Source pool discovery
// 3. Interval scheduling
// 4. Segment extraction with drift compensation
// 5. Concatenation
// 6. Audio mux
// 7. Cleanup
//
// Every stage after scheduling can be switched off in the config, which
// lets a run resume from files left behind by an earlier one.

use crate::agent::audio_tools::{
    read_hits_file, write_hits_file, BassOnsetAnalyzer, OnsetAnalyzer, OnsetReport,
};
use crate::agent::interval_scheduler::{schedule, total_ideal_duration, SegmentPlan};
use crate::agent::onset_filter::{extend_to_duration, filter};
use crate::agent::production_tools::{FfmpegTranscoder, MediaTranscoder};
use crate::agent::sequencer::SegmentSequencer;
use crate::agent::source_tools::build_source_pool;
use crate::config::ChaosConfig;
use crate::error::ChaosError;
use anyhow::{bail, Context, Result};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const HITS_FILE: &str = "bass_hits.txt";
pub const SEGMENTS_DIR: &str = "segments";
pub const CONCAT_FILE: &str = "concat.mp4";

pub fn output_file_name() -> String {
    format!("compiled_{}.mp4", Local::now().format("%Y%m%d_%H%M"))
}

#[derive(Debug, Clone, Default)]
pub struct CompileSummary {
    pub hits: usize,
    pub plans: usize,
    pub delivered: usize,
    pub failed: Vec<usize>,
    pub ideal_duration: f64,
    pub final_error: f64,
    /// Muxed video, or the bare concat when audio muxing is off.
    pub output: Option<PathBuf>,
}

pub struct VideoCompiler<T: MediaTranscoder, A: OnsetAnalyzer> {
    folder: PathBuf,
    config: ChaosConfig,
    transcoder: T,
    analyzer: A,
}

impl VideoCompiler<FfmpegTranscoder, BassOnsetAnalyzer> {
    pub fn with_ffmpeg(folder: impl Into<PathBuf>, config: ChaosConfig) -> Self {
        let transcoder = FfmpegTranscoder::new(config.extract_mode);
        let analyzer = BassOnsetAnalyzer::new(&config);
        Self::new(folder, config, transcoder, analyzer)
    }
}

impl<T: MediaTranscoder, A: OnsetAnalyzer> VideoCompiler<T, A> {
    /// A relative folder is resolved against the current directory here, so
    /// every path handed to ffmpeg is absolute.
    pub fn new(folder: impl Into<PathBuf>, config: ChaosConfig, transcoder: T, analyzer: A) -> Self {
        let folder = folder.into();
        let folder = std::path::absolute(&folder).unwrap_or(folder);
        Self {
            folder,
            config,
            transcoder,
            analyzer,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn audio_path(&self) -> PathBuf {
        self.folder.join(&self.config.audio_filename)
    }

    pub fn segments_dir(&self) -> PathBuf {
        self.folder.join(SEGMENTS_DIR)
    }

    pub async fn compile(&self) -> Result<CompileSummary> {
        self.config.validate().context("refusing to compile with invalid config")?;
        info!("[COMPILER] 🎬 Compiling {:?}", self.folder);

        let hits = self.resolve_hits().await?;
        let plans = schedule(&hits, self.config.min_clip, self.config.max_clip)
            .context("scheduling segments from bass hits")?;
        info!(
            "[COMPILER] {} hits -> {} segments ({:.2}s planned)",
            hits.len(),
            plans.len(),
            total_ideal_duration(&plans)
        );

        let mut summary = CompileSummary {
            hits: hits.len(),
            plans: plans.len(),
            ideal_duration: total_ideal_duration(&plans),
            ..CompileSummary::default()
        };

        let segments = if self.config.enable_extract_segments {
            self.extract_segments(&plans, &mut summary).await?
        } else {
            info!("[COMPILER] Extraction disabled, reusing existing segments");
            existing_segments(&self.segments_dir()).await?
        };

        let concat_path = self.folder.join(CONCAT_FILE);
        if self.config.enable_concatenation {
            if segments.is_empty() {
                bail!("no segments to concatenate in {:?}", self.segments_dir());
            }
            self.transcoder
                .concat(&segments, &concat_path)
                .await
                .context("concatenating segments")?;
        }

        if self.config.enable_add_audio {
            let output = self.folder.join(output_file_name());
            let result = self
                .transcoder
                .mux_audio(&concat_path, &self.audio_path(), &output)
                .await
                .context("adding audio track")?;
            info!(
                "[COMPILER] ✅ Output: {:?} ({:.2} MB)",
                result.output_path, result.size_mb
            );
            summary.output = Some(result.output_path);
        } else if tokio::fs::try_exists(&concat_path).await.unwrap_or(false) {
            summary.output = Some(concat_path.clone());
        }

        if self.config.enable_cleanup {
            self.cleanup(&concat_path, summary.output.as_deref()).await;
        }

        Ok(summary)
    }

    async fn resolve_hits(&self) -> Result<Vec<f64>> {
        let hits_path = self.folder.join(HITS_FILE);
        if !self.config.enable_bass_detection {
            info!("[COMPILER] Bass detection disabled, loading {:?}", hits_path);
            return read_hits_file(&hits_path)
                .await
                .with_context(|| format!("reading saved hits from {:?}", hits_path));
        }

        let audio = self.audio_path();
        let analysis = self
            .analyzer
            .analyze(&audio)
            .await
            .with_context(|| format!("analyzing {:?}", audio))?;

        let filtered = filter(&analysis.onsets, self.config.cooldown)?;
        info!(
            "[COMPILER] Cooldown {}s kept {} of {} onsets",
            self.config.cooldown,
            filtered.kept.len(),
            analysis.onsets.len()
        );

        let mut hits = filtered.kept.clone();
        extend_to_duration(&mut hits, analysis.duration);
        write_hits_file(&hits_path, &hits).await?;

        if self.config.write_diagnostics {
            let report = OnsetReport::new(&self.config, &analysis.curve, &filtered);
            report
                .write_json(&self.folder.join(OnsetReport::file_name(&self.config)))
                .await?;
        }
        Ok(hits)
    }

    async fn extract_segments(
        &self,
        plans: &[SegmentPlan],
        summary: &mut CompileSummary,
    ) -> Result<Vec<PathBuf>> {
        let pool = build_source_pool(
            &self.transcoder,
            &self.folder,
            self.config.min_input_video_len,
            self.config.delete_small_files,
        )
        .await
        .context("building source pool")?;
        if pool.sources.is_empty() {
            return Err(ChaosError::EmptyPool.into());
        }

        let segments_dir = self.segments_dir();
        if tokio::fs::try_exists(&segments_dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&segments_dir)
                .await
                .with_context(|| format!("clearing {:?}", segments_dir))?;
        }
        tokio::fs::create_dir_all(&segments_dir).await?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sequencer = SegmentSequencer::new(&self.transcoder, &self.config, &segments_dir);
        let report = sequencer.run(plans, &pool.sources, &mut rng).await?;

        summary.delivered = report.segments.len();
        summary.failed = report.failed;
        summary.final_error = report.final_error;
        Ok(report.segments.into_iter().map(|s| s.path).collect())
    }

    async fn cleanup(&self, concat_path: &Path, output: Option<&Path>) {
        let segments_dir = self.segments_dir();
        if let Err(e) = tokio::fs::remove_dir_all(&segments_dir).await {
            warn!("[COMPILER] Could not remove {:?}: {}", segments_dir, e);
        }
        if output != Some(concat_path) {
            let _ = tokio::fs::remove_file(concat_path).await;
        }
        info!("[COMPILER] 🧹 Intermediate files removed");
    }
}

/// `seg_*.mp4` files left by an earlier run, in index order.
async fn existing_segments(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut segments = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {:?}", dir))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("seg_") && name.ends_with(".mp4") {
            segments.push(path);
        }
    }
    segments.sort();
    Ok(segments)
}
