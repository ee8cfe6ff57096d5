// SYNOID Source Selector
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Picks which source video feeds the next segment. Longer sources get
// proportionally more draws so short clips are not over-used.

use crate::config::SelectionStrategy;
use crate::error::{ChaosError, ChaosResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Keeps zero-length entries drawable instead of breaking the normalised draw.
pub const MIN_WEIGHT: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVideo {
    pub path: PathBuf,
    pub duration: f64,
}

impl SourceVideo {
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> ChaosResult<Self> {
        let path = path.into();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ChaosError::InvalidSource { path, duration });
        }
        Ok(Self { path, duration })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn weight(&self) -> f64 {
        if self.duration.is_finite() {
            self.duration.max(MIN_WEIGHT)
        } else {
            MIN_WEIGHT
        }
    }
}

pub trait SourceSelector: Send {
    /// Draw the source for the next segment. Sampling is with replacement.
    fn select<'p>(
        &mut self,
        pool: &'p [SourceVideo],
        rng: &mut dyn RngCore,
    ) -> ChaosResult<&'p SourceVideo>;

    fn name(&self) -> &'static str;
}

/// Duration-weighted independent draw.
pub fn select_weighted<'p>(
    pool: &'p [SourceVideo],
    rng: &mut dyn RngCore,
) -> ChaosResult<&'p SourceVideo> {
    if pool.is_empty() {
        return Err(ChaosError::EmptyPool);
    }
    let weights: Vec<f64> = pool.iter().map(SourceVideo::weight).collect();
    let dist = WeightedIndex::new(&weights).map_err(|e| ChaosError::Selection(e.to_string()))?;
    Ok(&pool[dist.sample(rng)])
}

#[derive(Debug, Default)]
pub struct WeightedSelector;

impl SourceSelector for WeightedSelector {
    fn select<'p>(
        &mut self,
        pool: &'p [SourceVideo],
        rng: &mut dyn RngCore,
    ) -> ChaosResult<&'p SourceVideo> {
        select_weighted(pool, rng)
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Cycles through a shuffled order of the pool and reshuffles on wraparound,
/// so every source is used once per cycle.
#[derive(Debug, Default)]
pub struct ShuffleCycleSelector {
    order: Vec<usize>,
    cursor: usize,
}

impl SourceSelector for ShuffleCycleSelector {
    fn select<'p>(
        &mut self,
        pool: &'p [SourceVideo],
        rng: &mut dyn RngCore,
    ) -> ChaosResult<&'p SourceVideo> {
        if pool.is_empty() {
            return Err(ChaosError::EmptyPool);
        }
        if self.order.len() != pool.len() {
            self.order = (0..pool.len()).collect();
            self.order.shuffle(rng);
            self.cursor = 0;
        } else if self.cursor >= self.order.len() {
            self.order.shuffle(rng);
            self.cursor = 0;
        }
        let picked = self.order[self.cursor];
        self.cursor += 1;
        Ok(&pool[picked])
    }

    fn name(&self) -> &'static str {
        "shuffle_cycle"
    }
}

pub fn selector_for(strategy: SelectionStrategy) -> Box<dyn SourceSelector> {
    match strategy {
        SelectionStrategy::Weighted => Box::new(WeightedSelector),
        SelectionStrategy::ShuffleCycle => Box::new(ShuffleCycleSelector::default()),
    }
}
