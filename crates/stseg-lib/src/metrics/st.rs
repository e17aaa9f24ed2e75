//! Per-beat ST-segment measurement and the sustained-abnormality rule.

use crate::signal::{Events, TimeSeries};
use serde::{Deserialize, Serialize};

/// ST measurements aligned with the subset of beats whose post-beat interval
/// fits inside the signal. `beat_indices[i]` is the beat that produced
/// `values[i]`; beats too close to the end of the recording appear in
/// neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StSeries {
    pub values: Vec<f64>,
    pub beat_indices: Vec<usize>,
}

impl StSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Mean amplitude over `[beat, beat + st_duration)` for each beat, where
/// `st_duration = round(st_duration_fraction * fs)` samples.
///
/// Beats with `beat + st_duration >= len` contribute nothing; the output may
/// be shorter than the beat list.
pub fn extract_st(ts: &TimeSeries, events: &Events, st_duration_fraction: f64) -> StSeries {
    let st_duration = (st_duration_fraction * ts.fs).round() as usize;
    let mut values = Vec::new();
    let mut beat_indices = Vec::new();
    if st_duration == 0 {
        return StSeries {
            values,
            beat_indices,
        };
    }
    for &beat in &events.indices {
        if beat + st_duration < ts.data.len() {
            let segment = &ts.data[beat..beat + st_duration];
            let mean = segment.iter().sum::<f64>() / st_duration as f64;
            values.push(mean);
            beat_indices.push(beat);
        }
    }
    StSeries {
        values,
        beat_indices,
    }
}

/// Flag each smoothed ST value that leaves the normal band.
pub fn classify_abnormal(values: &[f64], elevation_thresh: f64, depression_thresh: f64) -> Vec<bool> {
    values
        .iter()
        .map(|&v| v > elevation_thresh || v < depression_thresh)
        .collect()
}

/// Sustained-abnormality verdict over a per-beat flag sequence.
///
/// A single pass counts consecutive-pair agreements: for each adjacent pair
/// of `true` flags the running counter increments, anything else closes the
/// current run, recording it if the counter reached `persistence_threshold`.
/// The verdict requires at least two recorded runs; one long abnormal
/// episode is not enough. Note that a run of L consecutive `true` flags
/// counts as L - 1 pairs.
pub fn sustained_abnormality(flags: &[bool], persistence_threshold: usize) -> bool {
    let mut run = 0usize;
    let mut completed = 0usize;
    for i in 1..flags.len() {
        if flags[i] && flags[i - 1] {
            run += 1;
        } else {
            if run >= persistence_threshold {
                completed += 1;
            }
            run = 0;
        }
    }
    if run >= persistence_threshold {
        completed += 1;
    }
    completed >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(fs: f64, data: Vec<f64>) -> TimeSeries {
        TimeSeries { fs, data }
    }

    #[test]
    fn st_duration_rounds_from_fraction() {
        // 0.08 * 360 = 28.8 -> 29 samples
        let ts = series(360.0, vec![0.5; 100]);
        let events = Events::from_indices(vec![10]);
        let st = extract_st(&ts, &events, 0.08);
        assert_eq!(st.len(), 1);
        assert!((st.values[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn beats_near_end_are_skipped() {
        let ts = series(100.0, vec![1.0; 50]);
        // st_duration = 8; 41 + 8 < 50 holds, 42 + 8 < 50 does not
        let events = Events::from_indices(vec![0, 41, 42, 49]);
        let st = extract_st(&ts, &events, 0.08);
        assert_eq!(st.beat_indices, vec![0, 41]);
        assert_eq!(st.len(), 2);
    }

    #[test]
    fn output_never_longer_than_beats() {
        let ts = series(100.0, vec![0.0; 200]);
        let events = Events::from_indices(vec![10, 50, 100, 195]);
        let st = extract_st(&ts, &events, 0.08);
        assert!(st.len() <= events.len());
        assert_eq!(st.values.len(), st.beat_indices.len());
    }

    #[test]
    fn threshold_flags_both_directions() {
        let flags = classify_abnormal(&[0.0, 0.25, -0.15, 0.2, -0.1], 0.2, -0.1);
        assert_eq!(flags, vec![false, true, true, false, false]);
    }

    #[test]
    fn one_long_episode_is_not_sustained() {
        let flags = vec![true; 10];
        // Pair count 9 records one run; a single run is not a verdict.
        assert!(!sustained_abnormality(&flags, 8));
    }

    #[test]
    fn two_separate_episodes_are_sustained() {
        let mut flags = vec![true; 9];
        flags.push(false);
        flags.extend(vec![true; 9]);
        assert!(sustained_abnormality(&flags, 8));
    }

    #[test]
    fn pair_counting_is_one_less_than_run_length() {
        // 8 consecutive trues give a pair count of 7, below a threshold of 8.
        let mut flags = vec![true; 8];
        flags.push(false);
        flags.extend(vec![true; 9]);
        assert!(!sustained_abnormality(&flags, 8));
    }

    #[test]
    fn degenerate_inputs_yield_false() {
        assert!(!sustained_abnormality(&[], 1));
        assert!(!sustained_abnormality(&[true], 1));
    }
}
