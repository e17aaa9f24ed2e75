//! Beat-centered windowing, labeled segmentation, and dataset splitting.

use crate::error::{AnalysisError, Result};
use crate::signal::{Events, TimeSeries, Window};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

/// Extract a window of `2 * half_width` samples spanning
/// `[center - half_width, center + half_width)`.
///
/// Returns `None` when the span would leave the signal on either side; such
/// beats are too close to the recording boundary to analyze and the caller
/// skips them. No padding, no clamping.
pub fn extract_window(ts: &TimeSeries, center: usize, half_width: usize) -> Option<Window> {
    let start = center.checked_sub(half_width)?;
    let end = center + half_width;
    if end > ts.data.len() {
        return None;
    }
    Some(Window {
        start,
        samples: ts.data[start..end].to_vec(),
    })
}

/// Windows paired positionally with their annotation symbols.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabeledWindows {
    pub windows: Vec<Window>,
    pub labels: Vec<char>,
}

impl LabeledWindows {
    pub fn len(&self) -> usize {
        self.windows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Pair every annotated beat with a symmetric window and its label symbol.
///
/// Beats whose window would leave the signal are dropped together with their
/// symbol; surviving pairs keep the input order. Repeated beat indices
/// produce repeated windows.
pub fn segment_beats(
    ts: &TimeSeries,
    events: &Events,
    symbols: &[char],
    half_width: usize,
) -> LabeledWindows {
    let mut out = LabeledWindows::default();
    for (&beat, &symbol) in events.indices.iter().zip(symbols) {
        if let Some(window) = extract_window(ts, beat, half_width) {
            out.windows.push(window);
            out.labels.push(symbol);
        }
    }
    out
}

/// Fractions carved off for evaluation: `test_size` of the whole set is held
/// out, then `val_size` of that holdout becomes the validation partition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitRatios {
    pub test_size: f64,
    pub val_size: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            val_size: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: LabeledWindows,
    pub val: LabeledWindows,
    pub test: LabeledWindows,
}

/// Stratified train/validation/test partition keyed on label symbol.
///
/// Each label group is shuffled with its own view of a seeded RNG, so the
/// partition is identical across runs for the same input and seed.
pub fn stratified_split(
    set: &LabeledWindows,
    ratios: SplitRatios,
    seed: u64,
) -> Result<DatasetSplit> {
    if !(0.0..1.0).contains(&ratios.test_size) || !(0.0..=1.0).contains(&ratios.val_size) {
        return Err(AnalysisError::InvalidParameters(format!(
            "split ratios out of range: test_size {}, val_size {}",
            ratios.test_size, ratios.val_size
        )));
    }

    // Group positions by label, preserving first-seen label order.
    let mut label_order: Vec<char> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (pos, &label) in set.labels.iter().enumerate() {
        match label_order.iter().position(|&l| l == label) {
            Some(g) => groups[g].push(pos),
            None => {
                label_order.push(label);
                groups.push(vec![pos]);
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut val = Vec::new();
    let mut test = Vec::new();
    for group in &mut groups {
        group.shuffle(&mut rng);
        let holdout = (group.len() as f64 * ratios.test_size).round() as usize;
        let holdout = holdout.min(group.len());
        let n_val = (holdout as f64 * ratios.val_size).round() as usize;
        let split_at = group.len() - holdout;
        train.extend_from_slice(&group[..split_at]);
        val.extend_from_slice(&group[split_at..split_at + n_val]);
        test.extend_from_slice(&group[split_at + n_val..]);
    }

    let pick = |positions: &[usize]| LabeledWindows {
        windows: positions.iter().map(|&p| set.windows[p].clone()).collect(),
        labels: positions.iter().map(|&p| set.labels[p]).collect(),
    };
    Ok(DatasetSplit {
        train: pick(&train),
        val: pick(&val),
        test: pick(&test),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> TimeSeries {
        TimeSeries {
            fs: 360.0,
            data: (0..len).map(|i| i as f64).collect(),
        }
    }

    #[test]
    fn window_bounds_match_contract() {
        let ts = ramp(100);
        // None iff center - half < 0 or center + half > len
        assert!(extract_window(&ts, 4, 5).is_none());
        assert!(extract_window(&ts, 96, 5).is_none());
        let w = extract_window(&ts, 5, 5).unwrap();
        assert_eq!(w.len(), 10);
        assert_eq!(w.start, 0);
        assert_eq!(w.samples, ts.data[0..10]);
        let w = extract_window(&ts, 95, 5).unwrap();
        assert_eq!(w.samples, ts.data[90..100]);
    }

    #[test]
    fn segmentation_drops_boundary_beats_and_keeps_order() {
        let ts = ramp(100);
        let events = Events::from_indices(vec![2, 30, 30, 60, 99]);
        let labels = vec!['N', 'V', 'V', 'N', 'A'];
        let set = segment_beats(&ts, &events, &labels, 10);
        assert_eq!(set.labels, vec!['V', 'V', 'N']);
        assert_eq!(set.windows[0].start, 20);
        // Repeated beats yield repeated windows.
        assert_eq!(set.windows[0].samples, set.windows[1].samples);
    }

    fn labeled(labels: &[char]) -> LabeledWindows {
        LabeledWindows {
            windows: labels
                .iter()
                .enumerate()
                .map(|(i, _)| Window {
                    start: i,
                    samples: vec![i as f64; 4],
                })
                .collect(),
            labels: labels.to_vec(),
        }
    }

    #[test]
    fn split_is_reproducible_and_stratified() {
        let mut labels = vec!['N'; 20];
        labels.extend(vec!['V'; 10]);
        let set = labeled(&labels);
        let a = stratified_split(&set, SplitRatios::default(), 42).unwrap();
        let b = stratified_split(&set, SplitRatios::default(), 42).unwrap();
        assert_eq!(a.train.labels, b.train.labels);
        assert_eq!(a.test.labels, b.test.labels);

        // 30% holdout per label: 6 of 20 'N', 3 of 10 'V'.
        let count = |ws: &LabeledWindows, l: char| ws.labels.iter().filter(|&&x| x == l).count();
        assert_eq!(count(&a.train, 'N'), 14);
        assert_eq!(count(&a.train, 'V'), 7);
        assert_eq!(count(&a.val, 'N') + count(&a.test, 'N'), 6);
        assert_eq!(count(&a.val, 'V') + count(&a.test, 'V'), 3);
        assert_eq!(a.train.len() + a.val.len() + a.test.len(), set.len());
    }

    #[test]
    fn windows_follow_their_labels_through_the_split() {
        let labels = vec!['N', 'V', 'N', 'V', 'N', 'V', 'N', 'V', 'N', 'V'];
        let set = labeled(&labels);
        let split = stratified_split(&set, SplitRatios::default(), 7).unwrap();
        for part in [&split.train, &split.val, &split.test] {
            for (w, &l) in part.windows.iter().zip(&part.labels) {
                // Window built at position i carries value i; label parity must match.
                let original = w.samples[0] as usize;
                assert_eq!(labels[original], l);
            }
        }
    }

    #[test]
    fn bad_ratios_rejected() {
        let set = labeled(&['N'; 4]);
        let err = stratified_split(
            &set,
            SplitRatios {
                test_size: 1.2,
                val_size: 0.5,
            },
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameters(_)));
    }
}
