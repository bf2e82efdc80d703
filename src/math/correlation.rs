//! Pearson correlation.
//!
//! ```text
//! r = Σ (x_i - x̄)(y_i - ȳ) / sqrt(Σ (x_i - x̄)^2 · Σ (y_i - ȳ)^2)
//! ```
//!
//! Undefined inputs (fewer than two points, mismatched lengths, non-finite
//! values, zero variance) give `NaN` rather than an error.

use nalgebra::DVector;

pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return f64::NAN;
    }
    // Checked exactly: a constant like 0.1 doesn't have an exact mean, so the
    // centered norm below can come out tiny but non-zero.
    if is_constant(xs) || is_constant(ys) {
        return f64::NAN;
    }

    let x = DVector::from_column_slice(xs);
    let y = DVector::from_column_slice(ys);
    let xc = x.add_scalar(-x.mean());
    let yc = y.add_scalar(-y.mean());

    let denom = xc.norm() * yc.norm();
    if !(denom.is_finite() && denom > 0.0) {
        return f64::NAN;
    }

    // Rounding can push |r| a hair past 1.
    (xc.dot(&yc) / denom).clamp(-1.0, 1.0)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Format a coefficient for plot titles: two decimals, `NaN` when undefined.
pub fn format_coefficient(r: f64) -> String {
    if r.is_finite() {
        format!("{r:.2}")
    } else {
        "NaN".to_string()
    }
}
