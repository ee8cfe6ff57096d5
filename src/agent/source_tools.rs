// SYNOID Source Tools - Video Pool Discovery
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Scans the project folder for source clips, probes their durations and
// builds the pool the selector draws from. Clips that are too short to be
// useful are dropped, and optionally deleted from disk.

use crate::agent::production_tools::MediaTranscoder;
use crate::agent::source_selector::SourceVideo;
use crate::error::ChaosResult;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const VIDEO_EXTENSIONS: [&str; 2] = ["mov", "mp4"];

/// Skips macOS resource forks and our own earlier outputs.
const SKIPPED_PREFIXES: [&str; 2] = ["._", "compiled"];

pub fn is_candidate_video(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_lowercase();
    if SKIPPED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Non-recursive scan, sorted by path.
pub async fn scan_directory_for_videos(dir: &Path) -> ChaosResult<Vec<PathBuf>> {
    let mut videos = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_candidate_video(&path) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

#[derive(Debug, Clone, Default)]
pub struct PoolScan {
    pub sources: Vec<SourceVideo>,
    /// Candidates that were unreadable or shorter than the minimum.
    pub rejected: Vec<PathBuf>,
}

/// Probe every candidate in `dir` and keep the ones at least `min_len`
/// seconds long.
pub async fn build_source_pool<T: MediaTranscoder + ?Sized>(
    transcoder: &T,
    dir: &Path,
    min_len: f64,
    delete_rejected: bool,
) -> ChaosResult<PoolScan> {
    let candidates = scan_directory_for_videos(dir).await?;
    info!("[SOURCE] Probing {} candidate videos in {:?}", candidates.len(), dir);

    let probed: Vec<(PathBuf, Option<f64>)> = stream::iter(candidates)
        .map(|path| async move {
            match transcoder.probe_duration(&path).await {
                Ok(d) => (path, Some(d)),
                Err(e) => {
                    warn!("[SOURCE] Could not probe {:?}: {}", path, e);
                    (path, None)
                }
            }
        })
        .buffered(num_cpus::get().max(1))
        .collect()
        .await;

    let mut scan = PoolScan::default();
    for (path, duration) in probed {
        let usable = duration
            .filter(|&d| d >= min_len)
            .and_then(|d| SourceVideo::new(path.clone(), d).ok());
        match usable {
            Some(source) => {
                debug!("[SOURCE] {:?}: {:.2}s", source.path, source.duration);
                scan.sources.push(source);
            }
            None => {
                info!(
                    "[SOURCE] Skipping {:?} (duration {:?}, minimum {}s)",
                    path, duration, min_len
                );
                if delete_rejected {
                    match tokio::fs::remove_file(&path).await {
                        Ok(()) => info!("[SOURCE] Deleted {:?}", path),
                        Err(e) => warn!("[SOURCE] Failed to delete {:?}: {}", path, e),
                    }
                }
                scan.rejected.push(path);
            }
        }
    }

    info!(
        "[SOURCE] Pool ready: {} sources, {:.1}s of footage",
        scan.sources.len(),
        scan.sources.iter().map(|s| s.duration).sum::<f64>()
    );
    Ok(scan)
}
