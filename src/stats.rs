//! Small numeric helpers shared by the metric components

/// Round to two decimal places (output boundary only).
///
/// Rounds the exact stored value with ties to even, so `16.125` becomes
/// `16.12` and `2.675` (stored just below) becomes `2.67`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Trapezoidal integral of `y` over sample points `x`.
///
/// Fewer than two points integrate to 0.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}
