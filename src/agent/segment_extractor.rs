// SYNOID Segment Extractor
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Cuts one random window out of a source video. The delivered file is
// probed afterwards because encoders and containers round the length,
// and the drift compensator needs what was actually produced.

use crate::agent::production_tools::MediaTranscoder;
use crate::agent::source_selector::SourceVideo;
use rand::{Rng, RngCore};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSegment {
    pub index: usize,
    pub path: PathBuf,
    pub source: PathBuf,
    pub start: f64,
    pub requested: f64,
    pub actual_duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Delivered(ExtractedSegment),
    /// Recoverable: the run carries on without this segment.
    Failed { index: usize, reason: String },
}

impl Extraction {
    /// Zero for failures.
    pub fn actual_duration(&self) -> f64 {
        match self {
            Extraction::Delivered(seg) => seg.actual_duration,
            Extraction::Failed { .. } => 0.0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Extraction::Delivered(_))
    }

    pub fn into_segment(self) -> Option<ExtractedSegment> {
        match self {
            Extraction::Delivered(seg) => Some(seg),
            Extraction::Failed { .. } => None,
        }
    }
}

/// Where a cut lands inside its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutWindow {
    pub start: f64,
    pub duration: f64,
}

/// Never asks for more than the source holds; the start is uniform over
/// every offset that still fits the clip.
pub fn choose_window<R: Rng + ?Sized>(source_duration: f64, target: f64, rng: &mut R) -> CutWindow {
    let duration = target.min(source_duration);
    let span = source_duration - duration;
    let start = if span > 0.0 { rng.gen_range(0.0..=span) } else { 0.0 };
    CutWindow { start, duration }
}

pub struct SegmentExtractor<'a, T: MediaTranscoder + ?Sized> {
    transcoder: &'a T,
}

impl<'a, T: MediaTranscoder + ?Sized> SegmentExtractor<'a, T> {
    pub fn new(transcoder: &'a T) -> Self {
        Self { transcoder }
    }

    pub async fn extract(
        &self,
        index: usize,
        source: &SourceVideo,
        target_duration: f64,
        destination: &Path,
        rng: &mut (dyn RngCore + Send),
    ) -> Extraction {
        if !(target_duration.is_finite() && target_duration > 0.0) {
            return Extraction::Failed {
                index,
                reason: format!("invalid target duration {}", target_duration),
            };
        }

        let window = choose_window(source.duration, target_duration, rng);
        debug!(
            "[EXTRACT] seg {:04}: {:?} @ {:.3}s for {:.3}s",
            index, source.path, window.start, window.duration
        );

        if let Err(e) = self
            .transcoder
            .trim(&source.path, window.start, window.duration, destination)
            .await
        {
            warn!("[EXTRACT] seg {:04} trim failed: {}", index, e);
            discard(destination).await;
            return Extraction::Failed {
                index,
                reason: e.to_string(),
            };
        }

        match self.transcoder.probe_duration(destination).await {
            Ok(actual) if actual > 0.0 => Extraction::Delivered(ExtractedSegment {
                index,
                path: destination.to_path_buf(),
                source: source.path.clone(),
                start: window.start,
                requested: window.duration,
                actual_duration: actual,
            }),
            Ok(_) => {
                warn!("[EXTRACT] seg {:04} came out empty", index);
                discard(destination).await;
                Extraction::Failed {
                    index,
                    reason: "empty output".to_string(),
                }
            }
            Err(e) => {
                warn!("[EXTRACT] seg {:04} unreadable: {}", index, e);
                discard(destination).await;
                Extraction::Failed {
                    index,
                    reason: e.to_string(),
                }
            }
        }
    }
}

async fn discard(path: &Path) {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let _ = tokio::fs::remove_file(path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_window_clamped_to_short_source() {
        let mut rng = StdRng::seed_from_u64(5);
        let window = choose_window(3.0, 5.0, &mut rng);
        assert_eq!(window.duration, 3.0);
        assert_eq!(window.start, 0.0);
    }

    #[test]
    fn test_window_always_fits() {
        let mut rng = StdRng::seed_from_u64(9);
        for i in 0..1_000 {
            let source = 1.0 + (i % 37) as f64 * 0.5;
            let target = 0.1 + (i % 23) as f64 * 0.7;
            let w = choose_window(source, target, &mut rng);
            assert!(w.duration <= source);
            assert!(w.start >= 0.0);
            assert!(w.start + w.duration <= source + 1e-9);
        }
    }

    #[test]
    fn test_extraction_accessors() {
        let failed = Extraction::Failed {
            index: 2,
            reason: "boom".into(),
        };
        assert_eq!(failed.actual_duration(), 0.0);
        assert!(!failed.is_delivered());
        assert!(failed.into_segment().is_none());
    }
}
