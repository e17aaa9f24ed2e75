//! Amplitude normalization and bandpass conditioning applied before analysis.
//!
//! The analysis pipeline itself assumes an already-normalized signal; these
//! helpers are the upstream collaborator that produces one from a raw lead.

use crate::signal::TimeSeries;

/// Bandpass configuration for [`bandpass_filter`].
#[derive(Debug, Clone, Copy)]
pub struct BandpassConfig {
    /// Lower cutoff in Hz.
    pub lowcut_hz: f64,
    /// Upper cutoff in Hz.
    pub highcut_hz: f64,
    /// Number of cascaded first-order sections per side.
    pub order: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 0.5,
            highcut_hz: 50.0,
            order: 4,
        }
    }
}

/// Rescale samples to [0, 1] by the signal's own min/max.
///
/// A flat signal maps to all zeros rather than dividing by zero.
pub fn min_max_normalize(ts: &TimeSeries) -> TimeSeries {
    if ts.is_empty() {
        return ts.clone();
    }
    let min = ts.data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ts.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let data = if span > 0.0 {
        ts.data.iter().map(|&x| (x - min) / span).collect()
    } else {
        vec![0.0; ts.data.len()]
    };
    TimeSeries { fs: ts.fs, data }
}

/// Bandpass built from cascaded single-pole high/low-pass sections.
pub fn bandpass_filter(ts: &TimeSeries, cfg: &BandpassConfig) -> TimeSeries {
    let fs = ts.fs.max(1.0);
    let mut data = ts.data.clone();
    for _ in 0..cfg.order.max(1) {
        if cfg.lowcut_hz > 0.0 {
            data = single_pole_highpass(&data, fs, cfg.lowcut_hz);
        }
        if cfg.highcut_hz > 0.0 && cfg.highcut_hz < fs * 0.5 {
            data = single_pole_lowpass(&data, fs, cfg.highcut_hz);
        }
    }
    TimeSeries { fs: ts.fs, data }
}

fn single_pole_highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = rc / (rc + dt);
    let mut out = Vec::with_capacity(data.len());
    let mut prev_y = data[0];
    let mut prev_x = data[0];
    for &x in data {
        let y = alpha * (prev_y + x - prev_x);
        out.push(y);
        prev_y = y;
        prev_x = x;
    }
    out
}

fn single_pole_lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = dt / (rc + dt);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    for &x in data {
        prev = prev + alpha * (x - prev);
        out.push(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_extremes_to_unit_range() {
        let ts = TimeSeries {
            fs: 360.0,
            data: vec![-2.0, 0.0, 2.0],
        };
        let out = min_max_normalize(&ts);
        assert!((out.data[0] - 0.0).abs() < 1e-12);
        assert!((out.data[1] - 0.5).abs() < 1e-12);
        assert!((out.data[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_flat_signal_yields_zeros() {
        let ts = TimeSeries {
            fs: 360.0,
            data: vec![0.7; 10],
        };
        let out = min_max_normalize(&ts);
        assert!(out.data.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn bandpass_removes_dc_offset() {
        let fs = 250.0;
        let data: Vec<f64> = (0..2500)
            .map(|i| 5.0 + (2.0 * std::f64::consts::PI * 10.0 * i as f64 / fs).sin())
            .collect();
        let ts = TimeSeries { fs, data };
        let out = bandpass_filter(&ts, &BandpassConfig::default());
        let tail = &out.data[1250..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        assert!(mean.abs() < 0.2, "DC should be attenuated, mean {}", mean);
    }
}
