// SYNOID Video Stitcher - Segment Concatenation
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Joins extracted segments in beat order using FFmpeg's concat demuxer.
// Stream copy is tried first; segments cut from sources with different
// codecs or containers make it fail, so a re-encode pass follows.

use crate::agent::production_tools::{run_ffmpeg, safe_arg_path};
use crate::error::{ChaosError, ChaosResult};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub struct VideoStitcher;

impl VideoStitcher {
    /// Build the contents of an FFmpeg concat manifest.
    ///
    /// Each line is `file '<path>'`. The demuxer resolves relative entries
    /// against the manifest's own directory, so pass absolute paths.
    pub fn create_concat_manifest(segments: &[PathBuf]) -> String {
        segments
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolve segment paths against the current directory.
    pub fn absolute_segments(segments: &[PathBuf]) -> ChaosResult<Vec<PathBuf>> {
        segments
            .iter()
            .map(|p| std::path::absolute(p).map_err(ChaosError::from))
            .collect()
    }

    pub fn build_concat_args(manifest: &Path, output: &Path, reencode: bool) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(safe_arg_path(manifest).to_string_lossy().to_string());
        if reencode {
            args.extend(
                [
                    "-c:v", "libx264",
                    "-preset", "veryfast",
                    "-crf", "14",
                    "-pix_fmt", "yuv420p",
                    "-movflags", "+faststart",
                ]
                .iter()
                .map(|s| s.to_string()),
            );
        } else {
            args.extend(["-c", "copy"].iter().map(|s| s.to_string()));
        }
        args.push(safe_arg_path(output).to_string_lossy().to_string());
        args
    }

    /// Write the manifest next to the output and invoke FFmpeg to join
    /// the segments, falling back to re-encoding if stream copy fails.
    pub async fn finalize(segments: &[PathBuf], output_path: &Path) -> ChaosResult<PathBuf> {
        if segments.is_empty() {
            return Err(ChaosError::Transcoder("no segments to stitch".into()));
        }

        let manifest_path = output_path.with_extension("concat_manifest.txt");
        let entries = Self::absolute_segments(segments)?;
        tokio::fs::write(&manifest_path, Self::create_concat_manifest(&entries)).await?;

        info!(
            "[STITCHER] Manifest written ({} segments): {:?}",
            segments.len(),
            manifest_path
        );

        let mut result =
            run_ffmpeg(&Self::build_concat_args(&manifest_path, output_path, false)).await;
        if let Err(e) = &result {
            warn!("[STITCHER] Stream copy concat failed ({}), re-encoding", e);
            result = run_ffmpeg(&Self::build_concat_args(&manifest_path, output_path, true)).await;
        }

        let _ = tokio::fs::remove_file(&manifest_path).await;

        match result {
            Ok(()) => {
                info!("[STITCHER] ✅ Concatenated: {:?}", output_path);
                Ok(output_path.to_path_buf())
            }
            Err(e) => {
                error!("[STITCHER] ❌ FFmpeg concat failed: {}", e);
                Err(e)
            }
        }
    }
}
