// SYNOID Test Doubles
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// In-memory transcoder and analyzer so the pipeline can run without ffmpeg.

#![allow(dead_code)]

use async_trait::async_trait;
use chaos_cut::agent::audio_tools::{OnsetAnalysis, OnsetAnalyzer};
use chaos_cut::agent::production_tools::{MediaTranscoder, ProductionResult};
use chaos_cut::{ChaosError, ChaosResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct TrimCall {
    pub source: PathBuf,
    pub start: f64,
    pub duration: f64,
    pub output: PathBuf,
}

/// Delivers `requested - shrink` seconds per trim and fails the trims
/// whose output file name is listed in `fail_outputs`.
#[derive(Default)]
pub struct FakeTranscoder {
    pub sources: HashMap<PathBuf, f64>,
    pub fail_outputs: HashSet<String>,
    pub shrink: f64,
    pub trims: Mutex<Vec<TrimCall>>,
    outputs: Mutex<HashMap<PathBuf, f64>>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>, duration: f64) -> Self {
        self.sources.insert(path.into(), duration);
        self
    }

    pub fn failing(mut self, output_name: &str) -> Self {
        self.fail_outputs.insert(output_name.to_string());
        self
    }

    pub fn with_shrink(mut self, shrink: f64) -> Self {
        self.shrink = shrink;
        self
    }

    pub fn trim_calls(&self) -> Vec<TrimCall> {
        self.trims.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTranscoder for FakeTranscoder {
    async fn probe_duration(&self, path: &Path) -> ChaosResult<f64> {
        if let Some(d) = self.outputs.lock().unwrap().get(path) {
            return Ok(*d);
        }
        self.sources
            .get(path)
            .copied()
            .ok_or_else(|| ChaosError::Probe(format!("unknown file {:?}", path)))
    }

    async fn trim(&self, source: &Path, start: f64, duration: f64, output: &Path) -> ChaosResult<()> {
        self.trims.lock().unwrap().push(TrimCall {
            source: source.to_path_buf(),
            start,
            duration,
            output: output.to_path_buf(),
        });
        let name = output.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_outputs.contains(&name) {
            return Err(ChaosError::Transcoder(format!("refusing {}", name)));
        }
        std::fs::write(output, b"segment")?;
        self.outputs
            .lock()
            .unwrap()
            .insert(output.to_path_buf(), (duration - self.shrink).max(0.0));
        Ok(())
    }

    /// Mirrors the concat demuxer: relative entries are looked up next to
    /// the output, not in the current directory.
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> ChaosResult<PathBuf> {
        let base = output.parent().unwrap_or(Path::new("."));
        for seg in segments {
            let resolved = if seg.is_absolute() { seg.clone() } else { base.join(seg) };
            if !resolved.exists() {
                return Err(ChaosError::Transcoder(format!("concat cannot open {:?}", resolved)));
            }
        }
        let listing: Vec<String> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        std::fs::write(output, listing.join("\n"))?;
        Ok(output.to_path_buf())
    }

    async fn mux_audio(&self, video: &Path, _audio: &Path, output: &Path) -> ChaosResult<ProductionResult> {
        std::fs::copy(video, output)?;
        Ok(ProductionResult {
            output_path: output.to_path_buf(),
            size_mb: 0.0,
        })
    }
}

pub struct FakeAnalyzer {
    pub onsets: Vec<f64>,
    pub duration: f64,
}

#[async_trait]
impl OnsetAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _audio: &Path) -> ChaosResult<OnsetAnalysis> {
        Ok(OnsetAnalysis {
            onsets: self.onsets.clone(),
            duration: self.duration,
            ..OnsetAnalysis::default()
        })
    }
}
