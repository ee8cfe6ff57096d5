// SYNOID Interval Scheduler
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use crate::error::{ChaosError, ChaosResult};
use serde::{Deserialize, Serialize};

/// Target for one segment, spanning kept beat `index` to `index + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub index: usize,
    pub start: f64,
    pub ideal_duration: f64,
}

/// Clamp into `[min_clip, max_clip]`. NaN collapses to `min_clip`.
pub fn clamp_clip(duration: f64, min_clip: f64, max_clip: f64) -> f64 {
    if duration.is_nan() {
        return min_clip;
    }
    duration.max(min_clip).min(max_clip)
}

/// One plan per adjacent pair of kept onsets.
///
/// Gaps outside the clip bounds are clamped, so rendered cuts drift away
/// from the true beat grid wherever that happens.
pub fn schedule(kept: &[f64], min_clip: f64, max_clip: f64) -> ChaosResult<Vec<SegmentPlan>> {
    if !(min_clip.is_finite() && min_clip > 0.0) || !(max_clip >= min_clip) {
        return Err(ChaosError::invalid_config(format!(
            "clip bounds must satisfy 0 < min ({}) <= max ({})",
            min_clip, max_clip
        )));
    }
    if kept.len() < 2 {
        return Err(ChaosError::InsufficientOnsets { found: kept.len() });
    }

    Ok(kept
        .windows(2)
        .enumerate()
        .map(|(index, pair)| SegmentPlan {
            index,
            start: pair[0],
            ideal_duration: clamp_clip(pair[1] - pair[0], min_clip, max_clip),
        })
        .collect())
}

/// Sum of ideal durations, i.e. the length the final cut aims for.
pub fn total_ideal_duration(plans: &[SegmentPlan]) -> f64 {
    plans.iter().map(|p| p.ideal_duration).sum()
}
