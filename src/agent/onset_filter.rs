// SYNOID Onset Cooldown Filter
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// A single bass hit often triggers several onsets a few frames apart.
// The cooldown sweep keeps the earliest of each cluster and reports the
// rest as dropped so diagnostics can show what was suppressed.

use crate::error::{ChaosError, ChaosResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownResult {
    pub kept: Vec<f64>,
    pub dropped: Vec<f64>,
}

/// Greedy left-to-right refractory filter.
///
/// The first onset is always kept. A later onset is kept iff it lands at
/// least `cooldown` seconds after the last *kept* onset. This favours early
/// onsets; it does not maximise the number kept.
pub fn filter(raw_onsets: &[f64], cooldown: f64) -> ChaosResult<CooldownResult> {
    if !(cooldown.is_finite() && cooldown > 0.0) {
        return Err(ChaosError::invalid_config(format!(
            "cooldown must be > 0, got {}",
            cooldown
        )));
    }
    let (&first, rest) = raw_onsets.split_first().ok_or(ChaosError::EmptyInput)?;

    let mut kept = vec![first];
    let mut dropped = Vec::new();
    let mut last_kept = first;

    for &onset in rest {
        if onset - last_kept >= cooldown {
            kept.push(onset);
            last_kept = onset;
        } else {
            dropped.push(onset);
        }
    }

    Ok(CooldownResult { kept, dropped })
}

/// Append the track duration as a closing cut so the last segment plan
/// covers the tail of the audio.
pub fn extend_to_duration(kept: &mut Vec<f64>, duration: f64) {
    if let Some(&last) = kept.last() {
        if last < duration {
            kept.push(duration);
        }
    }
}
