// SYNOID Chaos Cut Configuration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// One typed configuration value for the whole run. Every component borrows
// it; nothing reads process-wide state. Ranges are checked in `validate`,
// which every constructor path goes through.

use crate::error::{ChaosError, ChaosResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default config file name, overridable through `CHAOS_CONFIG`.
pub const DEFAULT_CONFIG_FILE: &str = "chaos_config.json";

/// How a source video is picked for each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Independent draws weighted by source duration.
    #[default]
    Weighted,
    /// Walk a shuffled order of the pool, reshuffling after each full cycle.
    ShuffleCycle,
}

/// How the transcoder cuts a segment out of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Re-encode so the cut lands on the requested frame.
    #[default]
    FrameAccurate,
    /// Stream copy. Fast, but snaps to keyframes.
    FastCopy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    // Onset analysis
    pub lf_min_hz: f64,
    pub lf_max_hz: f64,
    pub onset_delta: f64,
    pub hop_length: usize,
    pub analysis_sample_rate: u32,

    // Scheduling
    pub cooldown: f64,
    pub min_clip: f64,
    pub max_clip: f64,

    // Source pool
    pub min_input_video_len: f64,
    pub delete_small_files: bool,
    pub selection: SelectionStrategy,
    pub extract_mode: ExtractMode,

    // Files
    pub audio_filename: String,
    pub seed: Option<u64>,

    // Stage toggles
    pub enable_bass_detection: bool,
    pub enable_extract_segments: bool,
    pub enable_concatenation: bool,
    pub enable_add_audio: bool,
    pub enable_cleanup: bool,
    pub write_diagnostics: bool,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            lf_min_hz: 20.0,
            lf_max_hz: 150.0,
            onset_delta: 0.2,
            hop_length: 512,
            analysis_sample_rate: 22_050,
            cooldown: 0.25,
            min_clip: 0.5,
            max_clip: 5.0,
            min_input_video_len: 10.0,
            delete_small_files: false,
            selection: SelectionStrategy::Weighted,
            extract_mode: ExtractMode::FrameAccurate,
            audio_filename: "audio.mp3".to_string(),
            seed: None,
            enable_bass_detection: true,
            enable_extract_segments: true,
            enable_concatenation: true,
            enable_add_audio: true,
            enable_cleanup: true,
            write_diagnostics: false,
        }
    }
}

impl ChaosConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(content: &str) -> ChaosResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk, falling back to defaults when the file does not exist.
    /// A file that exists but is malformed or out of range is an error.
    pub fn load(path: &Path) -> ChaosResult<Self> {
        if !path.exists() {
            info!("[CONFIG] {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!("[CONFIG] Loaded chaos config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ChaosResult<()> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("[CONFIG] Saved chaos config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> ChaosResult<()> {
        positive("lf_min_hz", self.lf_min_hz)?;
        positive("onset_delta", self.onset_delta)?;
        positive("cooldown", self.cooldown)?;
        positive("min_clip", self.min_clip)?;

        if !(self.lf_max_hz.is_finite() && self.lf_max_hz > self.lf_min_hz) {
            return Err(ChaosError::invalid_config(format!(
                "lf_max_hz ({}) must exceed lf_min_hz ({})",
                self.lf_max_hz, self.lf_min_hz
            )));
        }
        if self.analysis_sample_rate == 0 {
            return Err(ChaosError::invalid_config("analysis_sample_rate must be > 0"));
        }
        let nyquist = self.analysis_sample_rate as f64 / 2.0;
        if self.lf_max_hz >= nyquist {
            return Err(ChaosError::invalid_config(format!(
                "lf_max_hz ({}) must be below Nyquist ({})",
                self.lf_max_hz, nyquist
            )));
        }
        if self.hop_length == 0 {
            return Err(ChaosError::invalid_config("hop_length must be > 0"));
        }
        if !(self.max_clip.is_finite() && self.max_clip >= self.min_clip) {
            return Err(ChaosError::invalid_config(format!(
                "max_clip ({}) must be >= min_clip ({})",
                self.max_clip, self.min_clip
            )));
        }
        if !(self.min_input_video_len.is_finite() && self.min_input_video_len >= 0.0) {
            return Err(ChaosError::invalid_config(
                "min_input_video_len must be a non-negative number",
            ));
        }
        if self.audio_filename.trim().is_empty() {
            return Err(ChaosError::invalid_config("audio_filename must not be empty"));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> ChaosResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ChaosError::invalid_config(format!("{} must be > 0, got {}", name, value)))
    }
}
