//! The analysis orchestrator: peak detection, chunked classification, and
//! the ST abnormality pipeline in one call.

use crate::classifier::{BeatClassifier, ClassLabel};
use crate::detectors::peaks::find_peaks;
use crate::error::{AnalysisError, Result};
use crate::metrics::st::{classify_abnormal, extract_st, sustained_abnormality};
use crate::signal::{TimeSeries, Window};
use crate::smoothing;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Analyzer configuration. Fixed at construction; `analyze` never mutates it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Smoothed ST value above this flags "ST elevation".
    pub elevation_thresh: f64,
    /// Smoothed ST value below this flags "ST depression".
    pub depression_thresh: f64,
    /// Minimum consecutive-pair run length for an episode to count.
    pub persistence_threshold: usize,
    /// ST interval length as a fraction of a second (0.08 -> 80 ms).
    pub st_duration_fraction: f64,
    /// Minimum peak spacing as a fraction of a second (0.5 -> 2 beats/s max).
    pub min_peak_distance_fraction: f64,
    /// Samples per classification chunk.
    pub chunk_length: usize,
    /// Savitzky-Golay window over the per-beat ST series.
    pub smooth_window: usize,
    /// Savitzky-Golay polynomial order.
    pub smooth_poly_order: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            elevation_thresh: 0.2,
            depression_thresh: -0.1,
            persistence_threshold: 8,
            st_duration_fraction: 0.08,
            min_peak_distance_fraction: 0.5,
            chunk_length: 360,
            smooth_window: 5,
            smooth_poly_order: 2,
        }
    }
}

impl AnalyzerConfig {
    /// Reject configurations that would make every downstream result
    /// meaningless. Called once at analyzer construction.
    pub fn validate(&self) -> Result<()> {
        if self.elevation_thresh <= self.depression_thresh {
            return Err(AnalysisError::InvalidParameters(format!(
                "elevation threshold {} must exceed depression threshold {}",
                self.elevation_thresh, self.depression_thresh
            )));
        }
        if self.persistence_threshold == 0 {
            return Err(AnalysisError::InvalidParameters(
                "persistence threshold must be positive".into(),
            ));
        }
        if self.st_duration_fraction <= 0.0 {
            return Err(AnalysisError::InvalidParameters(
                "st duration fraction must be positive".into(),
            ));
        }
        if self.min_peak_distance_fraction <= 0.0 {
            return Err(AnalysisError::InvalidParameters(
                "min peak distance fraction must be positive".into(),
            ));
        }
        if self.chunk_length == 0 {
            return Err(AnalysisError::InvalidParameters(
                "chunk length must be positive".into(),
            ));
        }
        smoothing::validate_params(self.smooth_window, self.smooth_poly_order)
    }
}

/// Combined output of one `analyze` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Per-chunk predicted classes, in chunk order.
    pub predictions: Vec<ClassLabel>,
    /// Detected beat locations.
    pub peak_indices: Vec<usize>,
    /// True iff at least two separately persisting abnormal ST episodes.
    pub sustained_st_abnormality: bool,
}

/// Runs the whole analysis on a normalized single-lead signal.
///
/// Stateless across calls; concurrent analyses on separate signals need no
/// coordination.
pub struct Analyzer<C: BeatClassifier> {
    cfg: AnalyzerConfig,
    classifier: C,
}

impl<C: BeatClassifier> Analyzer<C> {
    pub fn new(classifier: C, cfg: AnalyzerConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, classifier })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.cfg
    }

    /// Analyze one record: classify disjoint chunks of the signal and run
    /// the ST pipeline over the detected beats.
    ///
    /// Beats whose ST interval leaves the signal are skipped silently. Too
    /// few ST values to smooth degrades the verdict to `false`; it does not
    /// fail the call.
    pub fn analyze(&self, ts: &TimeSeries) -> Result<AnalysisResult> {
        let min_distance = (self.cfg.min_peak_distance_fraction * ts.fs).round().max(1.0) as usize;
        let events = find_peaks(ts, min_distance);
        debug!(
            "detected {} beats in {} samples (min spacing {})",
            events.len(),
            ts.len(),
            min_distance
        );

        let chunks = chunk_signal(ts, self.cfg.chunk_length);
        if chunks.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "signal of {} samples is shorter than one {}-sample chunk",
                ts.len(),
                self.cfg.chunk_length
            )));
        }
        let predictions = self
            .classifier
            .predict(&chunks)
            .map_err(AnalysisError::Classifier)?;

        let st = extract_st(ts, &events, self.cfg.st_duration_fraction);
        let sustained = if st.len() >= self.cfg.smooth_window {
            let smoothed =
                smoothing::savgol_smooth(&st.values, self.cfg.smooth_window, self.cfg.smooth_poly_order)?;
            let flags = classify_abnormal(
                &smoothed,
                self.cfg.elevation_thresh,
                self.cfg.depression_thresh,
            );
            sustained_abnormality(&flags, self.cfg.persistence_threshold)
        } else {
            debug!(
                "{} usable ST values, below smoothing window {}; verdict defaults to false",
                st.len(),
                self.cfg.smooth_window
            );
            false
        };

        info!(
            "analysis done: {} chunks, {} beats, sustained abnormality = {}",
            predictions.len(),
            events.len(),
            sustained
        );
        Ok(AnalysisResult {
            predictions,
            peak_indices: events.indices,
            sustained_st_abnormality: sustained,
        })
    }
}

/// Disjoint consecutive fixed-length chunks; a trailing partial chunk is
/// dropped.
fn chunk_signal(ts: &TimeSeries, chunk_length: usize) -> Vec<Window> {
    let mut out = Vec::new();
    if chunk_length == 0 {
        return out;
    }
    let mut start = 0;
    while start + chunk_length <= ts.data.len() {
        out.push(Window {
            start,
            samples: ts.data[start..start + chunk_length].to_vec(),
        });
        start += chunk_length;
    }
    out
}
