use serde::{Deserialize, Serialize};

/// Single-lead waveform with a uniform sampling rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Beat locations as ascending sample indices (detected or annotated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Fixed-length slice of a signal. Owns a copy of its samples so that
/// windows can be persisted or classified independently of the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Index of the first sample in the source signal.
    pub start: usize,
    pub samples: Vec<f64>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    /// Source index the window is centered on.
    pub fn center(&self) -> usize {
        self.start + self.samples.len() / 2
    }
}
