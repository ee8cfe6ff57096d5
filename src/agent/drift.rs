// SYNOID Drift Compensator
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Integral controller with unit gain: the whole accumulated timing error
// is fed back into the very next request. Failures are charged as if the
// segment came out zero seconds long.

use crate::agent::interval_scheduler::clamp_clip;
use crate::agent::segment_extractor::Extraction;

#[derive(Debug, Clone)]
pub struct DriftCompensator {
    cumulative_error: f64,
    min_clip: f64,
    max_clip: f64,
}

impl DriftCompensator {
    pub fn new(min_clip: f64, max_clip: f64) -> Self {
        Self {
            cumulative_error: 0.0,
            min_clip,
            max_clip,
        }
    }

    pub fn reset(&mut self) {
        self.cumulative_error = 0.0;
    }

    /// Positive when the rendered video is running long.
    pub fn cumulative_error(&self) -> f64 {
        self.cumulative_error
    }

    /// Request for the next segment, re-clamped to the clip bounds.
    pub fn adjust_next(&self, ideal_duration: f64) -> f64 {
        clamp_clip(ideal_duration - self.cumulative_error, self.min_clip, self.max_clip)
    }

    pub fn record_success(&mut self, ideal_duration: f64, actual_duration: f64) {
        self.cumulative_error += actual_duration - ideal_duration;
    }

    pub fn record_failure(&mut self, ideal_duration: f64) {
        self.cumulative_error -= ideal_duration;
    }

    pub fn record(&mut self, ideal_duration: f64, outcome: &Extraction) {
        match outcome {
            Extraction::Delivered(seg) => self.record_success(ideal_duration, seg.actual_duration),
            Extraction::Failed { .. } => self.record_failure(ideal_duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_short_delivery_lengthens_next_request() {
        let mut drift = DriftCompensator::new(0.5, 5.0);
        assert_eq!(drift.adjust_next(2.0), 2.0);
        drift.record_success(2.0, 1.8);
        assert!((drift.cumulative_error() + 0.2).abs() < EPS);
        assert!((drift.adjust_next(2.0) - 2.2).abs() < EPS);
    }

    #[test]
    fn test_adjusted_request_is_reclamped() {
        let mut drift = DriftCompensator::new(0.5, 2.1);
        drift.record_success(2.0, 1.8);
        assert_eq!(drift.adjust_next(2.0), 2.1);

        drift.reset();
        drift.record_success(1.0, 4.0);
        assert_eq!(drift.adjust_next(1.0), 0.5);
    }

    #[test]
    fn test_closed_form_after_every_step() {
        // (ideal, Some(actual)) for a delivered segment, (ideal, None) for a failure.
        let steps = [
            (1.0, Some(0.96)),
            (2.0, None),
            (0.5, Some(0.52)),
            (3.0, Some(3.2)),
            (1.5, None),
            (2.5, Some(2.49)),
        ];
        let mut drift = DriftCompensator::new(0.1, 10.0);
        let mut expected = 0.0;
        for &(ideal, actual) in &steps {
            match actual {
                Some(a) => {
                    drift.record_success(ideal, a);
                    expected += a - ideal;
                }
                None => {
                    drift.record_failure(ideal);
                    expected -= ideal;
                }
            }
            assert!((drift.cumulative_error() - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_failure_asks_next_segment_to_run_longer() {
        let mut drift = DriftCompensator::new(0.5, 5.0);
        drift.record(
            1.0,
            &Extraction::Failed {
                index: 0,
                reason: "x".into(),
            },
        );
        assert_eq!(drift.cumulative_error(), -1.0);
        assert_eq!(drift.adjust_next(1.0), 2.0);
    }
}
