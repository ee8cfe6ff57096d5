// SYNOID Chaos Cut Errors
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Input errors (empty onsets, too few beats, empty pool) abort a run.
// Transcoder failures for a single segment never surface here; the
// sequencer absorbs them and charges the drift compensator instead.

use std::path::PathBuf;
use thiserror::Error;

pub type ChaosResult<T> = Result<T, ChaosError>;

#[derive(Debug, Error)]
pub enum ChaosError {
    #[error("No onsets to filter")]
    EmptyInput,

    #[error("Need at least 2 kept onsets to schedule segments, found {found}")]
    InsufficientOnsets { found: usize },

    #[error("Source pool is empty")]
    EmptyPool,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid source {path:?}: duration {duration}")]
    InvalidSource { path: PathBuf, duration: f64 },

    #[error("Invalid hits file at line {line}: {content:?}")]
    InvalidHitsFile { line: usize, content: String },

    #[error("Transcoder failed: {0}")]
    Transcoder(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Onset analysis failed: {0}")]
    Analysis(String),

    #[error("Source selection failed: {0}")]
    Selection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl ChaosError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// True for errors that end the whole run rather than a single segment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::InsufficientOnsets { .. } | Self::EmptyPool
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_end_the_run() {
        assert!(ChaosError::EmptyInput.is_input_error());
        assert!(ChaosError::InsufficientOnsets { found: 1 }.is_input_error());
        assert!(ChaosError::EmptyPool.is_input_error());
    }

    #[test]
    fn test_segment_and_config_errors_are_not_input_errors() {
        assert!(!ChaosError::Transcoder("exit 1".into()).is_input_error());
        assert!(!ChaosError::Probe("timeout".into()).is_input_error());
        assert!(!ChaosError::invalid_config("cooldown").is_input_error());
    }

    #[test]
    fn test_input_error_survives_anyhow_context() {
        use anyhow::Context;
        let err = Err::<(), _>(ChaosError::EmptyPool)
            .context("building source pool")
            .unwrap_err();
        let inner = err.downcast_ref::<ChaosError>().unwrap();
        assert!(inner.is_input_error());
    }
}
