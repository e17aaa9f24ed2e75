//! Savitzky-Golay polynomial smoothing for per-beat ST series.
//!
//! Interior samples are produced by the usual fixed convolution weights; the
//! first and last `half` samples come from a single least-squares polynomial
//! fitted to the first/last `window_length` input values, so a signal that is
//! itself a polynomial of degree <= `poly_order` passes through unchanged,
//! edges included.

use crate::error::{AnalysisError, Result};

/// Smooth `values` with a degree-`poly_order` local polynomial fit over
/// sliding windows of `window_length` samples. Output length equals input
/// length.
///
/// Fails with `InvalidParameters` when `window_length` is even,
/// `window_length <= poly_order`, or the input is shorter than one window.
pub fn savgol_smooth(values: &[f64], window_length: usize, poly_order: usize) -> Result<Vec<f64>> {
    validate_params(window_length, poly_order)?;
    if values.len() < window_length {
        return Err(AnalysisError::InvalidParameters(format!(
            "input length {} is shorter than smoothing window {}",
            values.len(),
            window_length
        )));
    }

    let half = window_length / 2;
    let weights = center_weights(window_length, poly_order)?;

    let n = values.len();
    let mut out = vec![0.0; n];
    for i in half..n - half {
        let window = &values[i - half..i + half + 1];
        out[i] = dot(&weights, window);
    }

    // Boundary samples from one polynomial fit per edge.
    let head = polyfit_eval(&values[..window_length], poly_order)?;
    out[..half].copy_from_slice(&head[..half]);
    let tail = polyfit_eval(&values[n - window_length..], poly_order)?;
    out[n - half..].copy_from_slice(&tail[window_length - half..]);

    Ok(out)
}

/// Check a smoothing window/order combination without running the filter.
pub fn validate_params(window_length: usize, poly_order: usize) -> Result<()> {
    if window_length % 2 == 0 {
        return Err(AnalysisError::InvalidParameters(format!(
            "smoothing window length {} must be odd",
            window_length
        )));
    }
    if window_length <= poly_order {
        return Err(AnalysisError::InvalidParameters(format!(
            "smoothing window length {} must exceed polynomial order {}",
            window_length, poly_order
        )));
    }
    Ok(())
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Convolution weights that evaluate the least-squares polynomial at the
/// window center: solve (A^T A) z = e0 over x = -half..=half, weights = A z.
fn center_weights(window_length: usize, poly_order: usize) -> Result<Vec<f64>> {
    let half = window_length as i64 / 2;
    let terms = poly_order + 1;

    let mut design = vec![vec![0.0; terms]; window_length];
    for (row, x) in design.iter_mut().zip(-half..=half) {
        let mut xk = 1.0;
        for cell in row.iter_mut() {
            *cell = xk;
            xk *= x as f64;
        }
    }

    let mut normal = vec![vec![0.0; terms]; terms];
    for r in 0..terms {
        for c in 0..terms {
            normal[r][c] = design.iter().map(|row| row[r] * row[c]).sum();
        }
    }

    let mut rhs = vec![0.0; terms];
    rhs[0] = 1.0;
    let z = solve(normal, rhs)?;

    Ok(design.iter().map(|row| dot(row, &z)).collect())
}

/// Fit one polynomial to `values` (x = 0, 1, ...) and evaluate it at every x.
fn polyfit_eval(values: &[f64], poly_order: usize) -> Result<Vec<f64>> {
    let terms = poly_order + 1;
    let n = values.len();

    let mut design = vec![vec![0.0; terms]; n];
    for (i, row) in design.iter_mut().enumerate() {
        let mut xk = 1.0;
        for cell in row.iter_mut() {
            *cell = xk;
            xk *= i as f64;
        }
    }

    let mut normal = vec![vec![0.0; terms]; terms];
    for r in 0..terms {
        for c in 0..terms {
            normal[r][c] = design.iter().map(|row| row[r] * row[c]).sum();
        }
    }
    let mut rhs = vec![0.0; terms];
    for (row, &y) in design.iter().zip(values) {
        for (k, cell) in row.iter().enumerate() {
            rhs[k] += cell * y;
        }
    }

    let coeffs = solve(normal, rhs)?;
    Ok(design.iter().map(|row| dot(row, &coeffs)).collect())
}

/// Gaussian elimination with partial pivoting on a small symmetric system.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(AnalysisError::InvalidParameters(
                "degenerate smoothing design matrix".into(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut sum = b[col];
        for k in col + 1..n {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Ok(x)
}
