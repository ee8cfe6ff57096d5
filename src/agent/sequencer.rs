// SYNOID Segment Sequencer
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Walks the segment plans in beat order: compensate, select, extract,
// record. The drift state makes each step depend on the previous one, so
// extraction is strictly one segment at a time.

use crate::agent::drift::DriftCompensator;
use crate::agent::interval_scheduler::SegmentPlan;
use crate::agent::production_tools::MediaTranscoder;
use crate::agent::segment_extractor::{ExtractedSegment, Extraction, SegmentExtractor};
use crate::agent::source_selector::{selector_for, SourceSelector, SourceVideo};
use crate::config::ChaosConfig;
use crate::error::{ChaosError, ChaosResult};
use rand::RngCore;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn segment_file_name(index: usize) -> String {
    format!("seg_{:04}.mp4", index)
}

#[derive(Debug, Clone, Default)]
pub struct SequenceReport {
    /// Delivered segments in beat order. Failed indices are absent.
    pub segments: Vec<ExtractedSegment>,
    pub failed: Vec<usize>,
    pub ideal_total: f64,
    pub delivered_total: f64,
    /// Drift left unclaimed after the last segment.
    pub final_error: f64,
}

pub struct SegmentSequencer<'a, T: MediaTranscoder + ?Sized> {
    extractor: SegmentExtractor<'a, T>,
    selector: Box<dyn SourceSelector>,
    drift: DriftCompensator,
    segments_dir: PathBuf,
}

impl<'a, T: MediaTranscoder + ?Sized> SegmentSequencer<'a, T> {
    pub fn new(transcoder: &'a T, config: &ChaosConfig, segments_dir: impl Into<PathBuf>) -> Self {
        Self {
            extractor: SegmentExtractor::new(transcoder),
            selector: selector_for(config.selection),
            drift: DriftCompensator::new(config.min_clip, config.max_clip),
            segments_dir: segments_dir.into(),
        }
    }

    pub fn with_selector(mut self, selector: Box<dyn SourceSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn segments_dir(&self) -> &Path {
        &self.segments_dir
    }

    pub async fn run<R: RngCore + Send>(
        &mut self,
        plans: &[SegmentPlan],
        pool: &[SourceVideo],
        rng: &mut R,
    ) -> ChaosResult<SequenceReport> {
        if pool.is_empty() {
            return Err(ChaosError::EmptyPool);
        }

        self.drift.reset();
        let mut report = SequenceReport::default();

        info!(
            "[SEQUENCER] Extracting {} segments from {} sources ({} selection)",
            plans.len(),
            pool.len(),
            self.selector.name()
        );

        for plan in plans {
            let request = self.drift.adjust_next(plan.ideal_duration);
            let source = self.selector.select(pool, &mut *rng)?;
            let destination = self.segments_dir.join(segment_file_name(plan.index));

            debug!(
                "[SEQUENCER] seg {:04}: ideal {:.3}s, request {:.3}s (drift {:+.3}s)",
                plan.index,
                plan.ideal_duration,
                request,
                self.drift.cumulative_error()
            );

            let outcome = self
                .extractor
                .extract(plan.index, source, request, &destination, &mut *rng)
                .await;
            self.drift.record(plan.ideal_duration, &outcome);
            report.ideal_total += plan.ideal_duration;

            match outcome {
                Extraction::Delivered(segment) => {
                    report.delivered_total += segment.actual_duration;
                    report.segments.push(segment);
                }
                Extraction::Failed { index, reason } => {
                    warn!("[SEQUENCER] Skipping seg {:04}: {}", index, reason);
                    report.failed.push(index);
                }
            }
        }

        report.final_error = self.drift.cumulative_error();
        info!(
            "[SEQUENCER] Done: {} delivered, {} failed, {:.3}s of {:.3}s (drift {:+.3}s)",
            report.segments.len(),
            report.failed.len(),
            report.delivered_total,
            report.ideal_total,
            report.final_error
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_file_name_is_zero_padded() {
        assert_eq!(segment_file_name(7), "seg_0007.mp4");
        assert_eq!(segment_file_name(12345), "seg_12345.mp4");
    }
}
