// SYNOID Production Tools - Trimming, Probing & Muxing
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// This module provides the FFmpeg-backed media transcoder used by the
// segment extractor and the compiler. The `MediaTranscoder` trait is the
// seam: tests drive the scheduler with an in-memory fake instead.

use crate::agent::video_stitcher::VideoStitcher;
use crate::config::ExtractMode;
use crate::error::{ChaosError, ChaosResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// ffprobe reads the duration from the container header, so this is generous.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a production operation
#[derive(Debug)]
pub struct ProductionResult {
    pub output_path: PathBuf,
    pub size_mb: f64,
}

#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Duration in seconds of a media file.
    async fn probe_duration(&self, path: &Path) -> ChaosResult<f64>;

    /// Cut `duration` seconds starting at `start` out of `source` into `output`.
    async fn trim(&self, source: &Path, start: f64, duration: f64, output: &Path) -> ChaosResult<()>;

    /// Join segments in order into `output`.
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> ChaosResult<PathBuf>;

    /// Lay `audio` under `video`, cutting to the shorter of the two.
    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> ChaosResult<ProductionResult>;
}

/// Prefix paths that start with '-' so ffmpeg does not read them as flags.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

fn arg(path: &Path) -> String {
    safe_arg_path(path).to_string_lossy().to_string()
}

pub fn build_trim_args(
    mode: ExtractMode,
    source: &Path,
    start: f64,
    duration: f64,
    output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-ss".into(),
        format!("{:.6}", start),
        "-i".into(),
        arg(source),
        "-t".into(),
        format!("{:.6}", duration),
    ];
    match mode {
        ExtractMode::FastCopy => args.extend(
            [
                "-c:v", "copy",
                "-c:a", "copy",
                "-avoid_negative_ts", "make_zero",
                "-map", "0:v:0",
                "-map", "0:a?",
            ]
            .iter()
            .map(|s| s.to_string()),
        ),
        ExtractMode::FrameAccurate => args.extend(
            [
                "-c:v", "libx264",
                "-preset", "veryfast",
                "-crf", "18",
                "-c:a", "aac",
                "-b:a", "192k",
                "-pix_fmt", "yuv420p",
            ]
            .iter()
            .map(|s| s.to_string()),
        ),
    }
    args.push(arg(output));
    args
}

pub fn build_mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        arg(video),
        "-i".into(),
        arg(audio),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-shortest".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        arg(output),
    ]
}

/// Run ffmpeg to completion. Non-zero exit carries the tail of stderr.
pub async fn run_ffmpeg(args: &[String]) -> ChaosResult<()> {
    debug!("[PROD] ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg")
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ChaosError::Transcoder(format!("failed to spawn ffmpeg: {}", e)))?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
    Err(ChaosError::Transcoder(format!(
        "ffmpeg exited with {}: {}",
        output.status,
        tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
    )))
}

/// Get media duration using ffprobe with a timeout
pub async fn get_media_duration(path: &Path) -> ChaosResult<f64> {
    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(safe_arg_path(path))
            .output(),
    )
    .await
    .map_err(|_| ChaosError::Probe(format!("ffprobe timed out on {:?}", path)))??;

    if !output.status.success() {
        return Err(ChaosError::Probe(format!(
            "ffprobe failed on {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_duration(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| ChaosError::Probe(format!("unparsable duration for {:?}", path)))
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Transcoder that shells out to the ffmpeg / ffprobe binaries on PATH.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    pub extract_mode: ExtractMode,
}

impl FfmpegTranscoder {
    pub fn new(extract_mode: ExtractMode) -> Self {
        Self { extract_mode }
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn probe_duration(&self, path: &Path) -> ChaosResult<f64> {
        get_media_duration(path).await
    }

    async fn trim(&self, source: &Path, start: f64, duration: f64, output: &Path) -> ChaosResult<()> {
        debug!(
            "[PROD] Trimming {:?} ({:.3}s + {:.3}s, {:?})",
            source, start, duration, self.extract_mode
        );
        run_ffmpeg(&build_trim_args(self.extract_mode, source, start, duration, output)).await
    }

    async fn concat(&self, segments: &[PathBuf], output: &Path) -> ChaosResult<PathBuf> {
        VideoStitcher::finalize(segments, output).await
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> ChaosResult<ProductionResult> {
        info!("[PROD] Adding audio {:?} -> {:?}", audio, output);
        run_ffmpeg(&build_mux_args(video, audio, output)).await?;

        let metadata = tokio::fs::metadata(output).await?;
        let size_mb = metadata.len() as f64 / 1_048_576.0;
        if size_mb == 0.0 {
            warn!("[PROD] Muxed output {:?} is empty", output);
        }
        Ok(ProductionResult {
            output_path: output.to_path_buf(),
            size_mb,
        })
    }
}
