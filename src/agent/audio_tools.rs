// SYNOID Audio Tools - Bass Onset Analysis
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Finds bass-drum onsets in a music track:
// 1. FFmpeg decodes the track to a mono 16-bit WAV
// 2. A zero-phase Butterworth band-pass isolates the low end
// 3. Frame RMS energy flux gives an onset strength envelope
// 4. A median filter smooths it and adaptive peak picking finds the hits
//
// Also owns the plain-text hit list and the JSON onset report.

use crate::agent::onset_filter::CooldownResult;
use crate::agent::production_tools::{run_ffmpeg, safe_arg_path};
use crate::config::ChaosConfig;
use crate::error::{ChaosError, ChaosResult};
use async_trait::async_trait;
use hound::WavReader;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Butterworth Q values for the two biquads of a 4th-order section.
const BUTTERWORTH_Q4: [f64; 2] = [0.541_196_1, 1.306_563];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnsetEnergyCurve {
    pub times: Vec<f64>,
    pub energy: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct OnsetAnalysis {
    /// Raw onsets in seconds, ascending, before the cooldown filter.
    pub onsets: Vec<f64>,
    pub curve: OnsetEnergyCurve,
    /// Length of the decoded audio in seconds.
    pub duration: f64,
}

#[async_trait]
pub trait OnsetAnalyzer: Send + Sync {
    async fn analyze(&self, audio: &Path) -> ChaosResult<OnsetAnalysis>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnsetParams {
    pub lf_min_hz: f64,
    pub lf_max_hz: f64,
    pub delta: f64,
    pub hop_length: usize,
    pub sample_rate: u32,
    pub pre_max: usize,
    pub post_max: usize,
    pub pre_avg: usize,
    pub post_avg: usize,
    pub median_size: usize,
}

impl OnsetParams {
    pub fn from_config(config: &ChaosConfig) -> Self {
        Self {
            lf_min_hz: config.lf_min_hz,
            lf_max_hz: config.lf_max_hz,
            delta: config.onset_delta,
            hop_length: config.hop_length,
            sample_rate: config.analysis_sample_rate,
            pre_max: 10,
            post_max: 10,
            pre_avg: 20,
            post_avg: 20,
            median_size: 5,
        }
    }
}

pub struct BassOnsetAnalyzer {
    params: OnsetParams,
}

impl BassOnsetAnalyzer {
    pub fn new(config: &ChaosConfig) -> Self {
        Self {
            params: OnsetParams::from_config(config),
        }
    }
}

#[async_trait]
impl OnsetAnalyzer for BassOnsetAnalyzer {
    async fn analyze(&self, audio: &Path) -> ChaosResult<OnsetAnalysis> {
        info!("[ONSET] Analyzing bass spectrum: {:?}", audio);
        let temp_wav = audio.with_extension("onset_analysis.wav");

        let args: Vec<String> = vec![
            "-y".into(),
            "-nostdin".into(),
            "-i".into(),
            safe_arg_path(audio).to_string_lossy().to_string(),
            "-vn".into(),
            "-ac".into(),
            "1".into(),
            "-ar".into(),
            self.params.sample_rate.to_string(),
            "-c:a".into(),
            "pcm_s16le".into(),
            safe_arg_path(&temp_wav).to_string_lossy().to_string(),
        ];
        run_ffmpeg(&args)
            .await
            .map_err(|e| ChaosError::Analysis(format!("audio decode failed: {}", e)))?;

        let params = self.params.clone();
        let wav = temp_wav.clone();
        let analysis = tokio::task::spawn_blocking(move || {
            let (samples, sample_rate) = read_mono_wav(&wav)?;
            analyze_samples(&samples, &OnsetParams { sample_rate, ..params })
        })
        .await
        .map_err(|e| ChaosError::Analysis(e.to_string()));
        let _ = tokio::fs::remove_file(&temp_wav).await;
        let analysis = analysis??;

        info!(
            "[ONSET] {} raw onsets over {:.2}s",
            analysis.onsets.len(),
            analysis.duration
        );
        Ok(analysis)
    }
}

fn read_mono_wav(path: &Path) -> ChaosResult<(Vec<f64>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(ChaosError::Analysis(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }
    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f64 / 32768.0))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((samples, spec.sample_rate))
}

/// Pure DSP half of the analyzer, usable on any decoded mono signal.
pub fn analyze_samples(samples: &[f64], params: &OnsetParams) -> ChaosResult<OnsetAnalysis> {
    if params.sample_rate == 0 || params.hop_length == 0 {
        return Err(ChaosError::Analysis("sample rate and hop length must be > 0".into()));
    }
    let sr = params.sample_rate as f64;
    let nyquist = sr / 2.0;
    if !(params.lf_min_hz > 0.0 && params.lf_min_hz < params.lf_max_hz && params.lf_max_hz < nyquist) {
        return Err(ChaosError::Analysis(format!(
            "band {}-{} Hz does not fit below Nyquist {} Hz",
            params.lf_min_hz, params.lf_max_hz, nyquist
        )));
    }

    let duration = samples.len() as f64 / sr;
    if samples.is_empty() {
        return Ok(OnsetAnalysis {
            duration,
            ..OnsetAnalysis::default()
        });
    }

    let filtered = band_pass(samples, params.lf_min_hz, params.lf_max_hz, sr);
    let strength = energy_flux(&filtered, params.hop_length);
    let smoothed = median_filter(&strength, params.median_size);
    let normalized = normalize(&smoothed);
    let peaks = pick_peaks(&normalized, params);

    let hop_secs = params.hop_length as f64 / sr;
    let times: Vec<f64> = (0..smoothed.len()).map(|i| i as f64 * hop_secs).collect();
    let onsets = peaks.iter().map(|&i| times[i]).collect();

    debug!(
        "[ONSET] {} frames, {} peaks (delta {})",
        smoothed.len(),
        peaks.len(),
        params.delta
    );

    Ok(OnsetAnalysis {
        onsets,
        curve: OnsetEnergyCurve {
            times,
            energy: smoothed,
        },
        duration,
    })
}

#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn low_pass(freq: f64, q: f64, sr: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * freq / sr;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn high_pass(freq: f64, q: f64, sr: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * freq / sr;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos) / 2.0 / a0,
            b1: -(1.0 + cos) / a0,
            b2: (1.0 + cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Transposed direct form II, in place.
    fn process(&self, signal: &mut [f64]) {
        let (mut z1, mut z2) = (0.0, 0.0);
        for x in signal.iter_mut() {
            let input = *x;
            let y = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * y + z2;
            z2 = self.b2 * input - self.a2 * y;
            *x = y;
        }
    }
}

/// 4th-order Butterworth high-pass and low-pass, run forward then backward
/// so the onsets are not shifted in time.
pub fn band_pass(samples: &[f64], low_hz: f64, high_hz: f64, sr: f64) -> Vec<f64> {
    let sections: Vec<Biquad> = BUTTERWORTH_Q4
        .iter()
        .map(|&q| Biquad::high_pass(low_hz, q, sr))
        .chain(BUTTERWORTH_Q4.iter().map(|&q| Biquad::low_pass(high_hz, q, sr)))
        .collect();

    let mut signal = samples.to_vec();
    for _ in 0..2 {
        for section in &sections {
            section.process(&mut signal);
        }
        signal.reverse();
    }
    for x in signal.iter_mut() {
        if !x.is_finite() {
            *x = 0.0;
        }
    }
    signal
}

/// Positive frame-to-frame change of RMS energy. Frames are `4 * hop`
/// wide and centred on `n * hop`.
pub fn energy_flux(signal: &[f64], hop: usize) -> Vec<f64> {
    let half = 2 * hop;
    let frames = signal.len().div_ceil(hop);
    let rms: Vec<f64> = (0..frames)
        .map(|n| {
            let center = n * hop;
            let start = center.saturating_sub(half);
            let end = (center + half).min(signal.len());
            if end <= start {
                return 0.0;
            }
            let window = &signal[start..end];
            (window.iter().map(|x| x * x).sum::<f64>() / (4 * hop) as f64).sqrt()
        })
        .collect();

    let mut flux = vec![0.0; frames];
    for n in 1..frames {
        flux[n] = (rms[n] - rms[n - 1]).max(0.0);
    }
    flux
}

/// Sliding median with the window clipped at the edges.
pub fn median_filter(values: &[f64], size: usize) -> Vec<f64> {
    if size <= 1 {
        return values.to_vec();
    }
    let radius = size / 2;
    let mut window = Vec::with_capacity(size);
    (0..values.len())
        .map(|i| {
            window.clear();
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(values.len());
            window.extend_from_slice(&values[lo..hi]);
            window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            window[window.len() / 2]
        })
        .collect()
}

fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// A frame is a peak when it is strictly above everything in the
/// `pre_max` frames before it, at least as high as the `post_max` frames
/// after it, and `delta` above the local mean. The strict side keeps only
/// the first frame of a plateau.
pub fn pick_peaks(envelope: &[f64], params: &OnsetParams) -> Vec<usize> {
    let len = envelope.len();
    let mut peaks = Vec::new();
    for n in 0..len {
        let x = envelope[n];
        let before = &envelope[n.saturating_sub(params.pre_max)..n];
        let after = &envelope[(n + 1).min(len)..(n + params.post_max + 1).min(len)];
        if before.iter().any(|&v| v >= x) || after.iter().any(|&v| v > x) {
            continue;
        }
        let lo = n.saturating_sub(params.pre_avg);
        let hi = (n + params.post_avg + 1).min(len);
        let mean = envelope[lo..hi].iter().sum::<f64>() / (hi - lo) as f64;
        if x >= mean + params.delta {
            peaks.push(n);
        }
    }
    peaks
}

/// One timestamp per line.
pub async fn write_hits_file(path: &Path, hits: &[f64]) -> ChaosResult<()> {
    let mut content = String::with_capacity(hits.len() * 12);
    for hit in hits {
        content.push_str(&hit.to_string());
        content.push('\n');
    }
    tokio::fs::write(path, content).await?;
    info!("[ONSET] Wrote {} hits to {:?}", hits.len(), path);
    Ok(())
}

pub async fn read_hits_file(path: &Path) -> ChaosResult<Vec<f64>> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_hits(&content)
}

/// Blank lines are skipped. Timestamps must be finite, non-negative and
/// strictly ascending.
pub fn parse_hits(content: &str) -> ChaosResult<Vec<f64>> {
    let mut hits: Vec<f64> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value = line
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .filter(|v| hits.last().map_or(true, |prev| v > prev));
        match value {
            Some(v) => hits.push(v),
            None => {
                return Err(ChaosError::InvalidHitsFile {
                    line: i + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(hits)
}

/// Energy curve with kept and dropped onsets, for inspecting a detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnsetReport {
    pub lf_min_hz: f64,
    pub lf_max_hz: f64,
    pub times: Vec<f64>,
    pub energy: Vec<f64>,
    pub kept: Vec<f64>,
    pub dropped: Vec<f64>,
}

impl OnsetReport {
    pub fn new(config: &ChaosConfig, curve: &OnsetEnergyCurve, filtered: &CooldownResult) -> Self {
        Self {
            lf_min_hz: config.lf_min_hz,
            lf_max_hz: config.lf_max_hz,
            times: curve.times.clone(),
            energy: curve.energy.clone(),
            kept: filtered.kept.clone(),
            dropped: filtered.dropped.clone(),
        }
    }

    pub fn file_name(config: &ChaosConfig) -> String {
        format!("bass_report_{}_{}.json", config.lf_min_hz, config.lf_max_hz)
    }

    pub async fn write_json(&self, path: &Path) -> ChaosResult<()> {
        tokio::fs::write(path, serde_json::to_string_pretty(self)?).await?;
        info!("[ONSET] Report saved to {:?}", path);
        Ok(())
    }
}
