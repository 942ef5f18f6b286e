//! Resting heart rate estimation
//!
//! The resting rate is the mean of the lowest decile of an intraday series.

use serde::Serialize;

use crate::error::ComputeError;
use crate::stats::round2;
use crate::types::{HeartRatePoint, HeartRateSample};

/// Fraction of the sorted series treated as "resting"
const RESTING_DIVISOR: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestingHeartRate {
    /// Mean of the resting subset, rounded to 2 decimals
    pub rhr: f64,
    /// The resting subset, ascending, in the vendor's numeric form
    pub contributing_values: Vec<serde_json::Number>,
    /// Input samples in their original order
    pub samples: Vec<HeartRatePoint>,
}

/// Number of lowest values used for the estimate: `max(1, n / 10)`
pub fn resting_subset_size(sample_count: usize) -> usize {
    (sample_count / RESTING_DIVISOR).max(1)
}

/// Estimate resting heart rate from an intraday series
pub fn estimate(series: &[HeartRateSample]) -> Result<RestingHeartRate, ComputeError> {
    if series.is_empty() {
        return Err(ComputeError::EmptySeries(
            "heart rate series has no samples".to_string(),
        ));
    }
    if let Some(bad) = series.iter().find(|s| !(s.bpm().is_finite() && s.bpm() > 0.0)) {
        return Err(ComputeError::MalformedPayload(format!(
            "heart rate at {} must be positive, got {}",
            bad.time, bad.value
        )));
    }

    let mut sorted: Vec<&HeartRateSample> = series.iter().collect();
    sorted.sort_by(|a, b| a.bpm().total_cmp(&b.bpm()));
    sorted.truncate(resting_subset_size(series.len()));

    let rhr = round2(sorted.iter().map(|s| s.bpm()).sum::<f64>() / sorted.len() as f64);
    let contributing_values = sorted.iter().map(|s| s.value.clone()).collect();

    let samples = series
        .iter()
        .map(|s| HeartRatePoint {
            time: s.time.clone(),
            heart_rate: s.value.clone(),
        })
        .collect();

    Ok(RestingHeartRate {
        rhr,
        contributing_values,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(values: &[f64]) -> Vec<HeartRateSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| HeartRateSample {
                time: format!("00:00:{i:02}"),
                value: serde_json::Number::from_f64(*v).unwrap(),
            })
            .collect()
    }

    fn as_floats(values: &[serde_json::Number]) -> Vec<f64> {
        values.iter().map(|v| v.as_f64().unwrap()).collect()
    }

    #[test]
    fn test_ten_samples_use_lowest() {
        let input = series(&[50.0, 52.0, 55.0, 58.0, 60.0, 62.0, 65.0, 68.0, 70.0, 72.0]);
        let result = estimate(&input).unwrap();

        assert_eq!(result.rhr, 50.0);
        assert_eq!(as_floats(&result.contributing_values), vec![50.0]);
    }

    #[test]
    fn test_short_series_uses_one_value() {
        let result = estimate(&series(&[71.0, 64.0, 80.0])).unwrap();
        assert_eq!(result.rhr, 64.0);
        assert_eq!(result.contributing_values.len(), 1);
    }

    #[test]
    fn test_subset_size() {
        assert_eq!(resting_subset_size(1), 1);
        assert_eq!(resting_subset_size(9), 1);
        assert_eq!(resting_subset_size(10), 1);
        assert_eq!(resting_subset_size(25), 2);
        assert_eq!(resting_subset_size(86_400), 8_640);
    }

    #[test]
    fn test_mean_of_lowest_decile() {
        // 30 samples -> lowest 3
        let values: Vec<f64> = (0..30).map(|i| 90.0 - i as f64).collect();
        let result = estimate(&series(&values)).unwrap();

        assert_eq!(as_floats(&result.contributing_values), vec![61.0, 62.0, 63.0]);
        assert_eq!(result.rhr, 62.0);
    }

    #[test]
    fn test_rounding() {
        // 30 samples -> lowest 3: (55 + 56 + 56) / 3 = 55.666...
        let mut values = vec![55.0, 56.0, 56.0];
        values.extend(std::iter::repeat(90.0).take(27));
        let result = estimate(&series(&values)).unwrap();
        assert_eq!(result.rhr, 55.67);
    }

    #[test]
    fn test_rounding_tie_goes_to_even() {
        // 80 samples -> lowest 8 sum to 401: 50.125
        let mut values = vec![50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 51.0];
        values.extend(std::iter::repeat(88.0).take(72));
        let result = estimate(&series(&values)).unwrap();

        assert_eq!(result.contributing_values.len(), 8);
        assert_eq!(result.rhr, 50.12);
    }

    #[test]
    fn test_samples_keep_original_order() {
        let input = series(&[72.0, 50.0, 65.0]);
        let result = estimate(&input).unwrap();

        let order: Vec<f64> = result
            .samples
            .iter()
            .map(|p| p.heart_rate.as_f64().unwrap())
            .collect();
        assert_eq!(order, vec![72.0, 50.0, 65.0]);
        assert_eq!(result.samples[0].time, "00:00:00");
    }

    #[test]
    fn test_integer_bpm_kept_as_integers() {
        let input: Vec<HeartRateSample> = [64, 58, 71]
            .iter()
            .map(|bpm| HeartRateSample {
                time: "12:00:00".to_string(),
                value: serde_json::Number::from(*bpm),
            })
            .collect();
        let result = estimate(&input).unwrap();

        assert_eq!(result.rhr, 58.0);
        assert_eq!(result.contributing_values, vec![serde_json::Number::from(58)]);
        assert_eq!(
            serde_json::to_value(&result.samples[0]).unwrap(),
            serde_json::json!({"time": "12:00:00", "heart_rate": 64})
        );
    }

    #[test]
    fn test_empty_series() {
        let err = estimate(&[]).unwrap_err();
        assert!(matches!(err, ComputeError::EmptySeries(_)));
    }

    #[test]
    fn test_non_positive_bpm() {
        let err = estimate(&series(&[60.0, 0.0])).unwrap_err();
        assert!(matches!(err, ComputeError::MalformedPayload(_)));
    }
}
