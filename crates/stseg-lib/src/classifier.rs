//! Seam to the external beat/segment classifier.
//!
//! The model itself (and its training) lives outside this crate; anything
//! that can label a batch of windows plugs in here. A nearest-centroid
//! implementation backed by a CSV of per-class reference waveforms ships so
//! the CLI can run end to end without a trained model.

use crate::signal::Window;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Index into the label vocabulary fixed at training time.
pub type ClassLabel = usize;

/// Anything that can assign a class to each window of a batch.
pub trait BeatClassifier {
    fn predict(&self, batch: &[Window]) -> Result<Vec<ClassLabel>>;
}

/// Minimum-Euclidean-distance classifier over per-class centroid waveforms.
///
/// Row `i` of the centroid file is the reference waveform for class `i`.
#[derive(Debug, Clone)]
pub struct NearestCentroid {
    centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    pub fn new(centroids: Vec<Vec<f64>>) -> Result<Self> {
        if centroids.is_empty() {
            bail!("centroid set is empty");
        }
        let len = centroids[0].len();
        if len == 0 || centroids.iter().any(|c| c.len() != len) {
            bail!("centroid rows must be non-empty and equally sized");
        }
        Ok(Self { centroids })
    }

    /// Load centroids from a headerless CSV, one waveform per row.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open centroid file {}", path.display()))?;
        let mut centroids = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("bad centroid row {}", row + 1))?;
            let waveform: Vec<f64> = record
                .iter()
                .map(|field| {
                    field
                        .parse::<f64>()
                        .with_context(|| format!("row {}: '{}' is not f64", row + 1, field))
                })
                .collect::<Result<_>>()?;
            centroids.push(waveform);
        }
        Self::new(centroids)
    }

    pub fn class_count(&self) -> usize {
        self.centroids.len()
    }
}

impl BeatClassifier for NearestCentroid {
    fn predict(&self, batch: &[Window]) -> Result<Vec<ClassLabel>> {
        let expected = self.centroids[0].len();
        let mut out = Vec::with_capacity(batch.len());
        for (i, window) in batch.iter().enumerate() {
            if window.len() != expected {
                bail!(
                    "window {} has {} samples, centroids expect {}",
                    i,
                    window.len(),
                    expected
                );
            }
            let best = self
                .centroids
                .iter()
                .enumerate()
                .map(|(label, centroid)| {
                    let dist: f64 = centroid
                        .iter()
                        .zip(&window.samples)
                        .map(|(a, b)| (a - b).powi(2))
                        .sum();
                    (label, dist)
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(label, _)| label)
                .unwrap_or(0);
            out.push(best);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(samples: Vec<f64>) -> Window {
        Window { start: 0, samples }
    }

    #[test]
    fn picks_closest_centroid() {
        let clf = NearestCentroid::new(vec![vec![0.0; 4], vec![1.0; 4]]).unwrap();
        let labels = clf
            .predict(&[window(vec![0.1; 4]), window(vec![0.9; 4])])
            .unwrap();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn rejects_mismatched_window_length() {
        let clf = NearestCentroid::new(vec![vec![0.0; 4]]).unwrap();
        assert!(clf.predict(&[window(vec![0.0; 3])]).is_err());
    }

    #[test]
    fn rejects_ragged_centroids() {
        assert!(NearestCentroid::new(vec![vec![0.0; 4], vec![0.0; 3]]).is_err());
        assert!(NearestCentroid::new(vec![]).is_err());
    }
}
