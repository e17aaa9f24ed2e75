//! Local-maximum R-peak picking with a minimum spacing constraint.

use crate::signal::{Events, TimeSeries};

/// Locate strict local maxima at least `min_distance` samples apart.
///
/// When two candidates violate the spacing constraint the one with the larger
/// amplitude wins. The first and last samples are never reported since they
/// have no neighbor on one side. Output is ascending.
pub fn find_peaks(ts: &TimeSeries, min_distance: usize) -> Events {
    let data = &ts.data;
    if data.len() < 3 {
        return Events::from_indices(Vec::new());
    }

    let mut candidates = Vec::new();
    for i in 1..data.len() - 1 {
        if data[i] > data[i - 1] && data[i] > data[i + 1] {
            candidates.push(i);
        }
    }

    let min_distance = min_distance.max(1);

    // Highest-amplitude candidates claim their neighborhood first.
    let mut priority: Vec<usize> = (0..candidates.len()).collect();
    priority.sort_by(|&a, &b| {
        data[candidates[b]]
            .partial_cmp(&data[candidates[a]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![true; candidates.len()];
    for &k in &priority {
        if !keep[k] {
            continue;
        }
        let pos = candidates[k];
        let mut j = k;
        while j > 0 {
            j -= 1;
            if pos - candidates[j] < min_distance {
                keep[j] = false;
            } else {
                break;
            }
        }
        let mut j = k + 1;
        while j < candidates.len() {
            if candidates[j] - pos < min_distance {
                keep[j] = false;
                j += 1;
            } else {
                break;
            }
        }
    }

    let indices = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect();
    Events::from_indices(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(data: Vec<f64>) -> TimeSeries {
        TimeSeries { fs: 360.0, data }
    }

    fn impulse_train(len: usize, period: usize, first: usize) -> TimeSeries {
        let mut data = vec![0.0; len];
        let mut p = first;
        while p < len {
            data[p] = 1.0;
            p += period;
        }
        series(data)
    }

    #[test]
    fn finds_spaced_impulses() {
        let ts = impulse_train(1000, 200, 50);
        let events = find_peaks(&ts, 180);
        assert_eq!(events.indices, vec![50, 250, 450, 650, 850]);
    }

    #[test]
    fn spacing_invariant_holds() {
        let data: Vec<f64> = (0..500)
            .map(|i| (i as f64 * 0.73).sin() + (i as f64 * 0.11).cos())
            .collect();
        let ts = series(data);
        for d in [1usize, 5, 20, 50] {
            let events = find_peaks(&ts, d);
            for pair in events.indices.windows(2) {
                assert!(
                    pair[1] - pair[0] >= d,
                    "indices {} and {} closer than {}",
                    pair[0],
                    pair[1],
                    d
                );
            }
        }
    }

    #[test]
    fn larger_amplitude_wins_within_distance() {
        let mut data = vec![0.0; 100];
        data[40] = 0.5;
        data[45] = 1.0;
        let events = find_peaks(&series(data), 10);
        assert_eq!(events.indices, vec![45]);
    }

    #[test]
    fn edge_samples_never_reported() {
        // Descending then ascending: endpoints are extremes but not peaks.
        let data = vec![3.0, 1.0, 0.5, 1.0, 3.0];
        let events = find_peaks(&series(data), 1);
        assert!(events.indices.is_empty());
    }

    #[test]
    fn flat_line_has_no_peaks() {
        let events = find_peaks(&series(vec![0.4; 1000]), 180);
        assert!(events.indices.is_empty());
    }
}
