//! Heart rate variability analysis
//!
//! Time-domain (RMSSD) and frequency-domain (LF/HF band power) indicators
//! from an RR-interval series. Intermediate values stay in full precision;
//! rounding happens once when the result is built.

use serde::Serialize;

use crate::config::{FrequencyBand, HrvConfig};
use crate::error::ComputeError;
use crate::spectral::welch;
use crate::stats::{mean, round2};
use crate::types::BandPower;

/// HRV indicators for one day of RR intervals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrvAnalysis {
    pub rmssd: f64,
    pub coverage_percentage: f64,
    pub lf_power: BandPower,
    pub hf_power: BandPower,
}

/// Unrounded LF/HF powers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyDomain {
    pub lf_power: f64,
    pub hf_power: f64,
}

/// Analyze an RR series (milliseconds) with the default configuration
pub fn analyze(rr_intervals_ms: &[f64]) -> Result<HrvAnalysis, ComputeError> {
    analyze_with_config(rr_intervals_ms, &HrvConfig::default())
}

/// Analyze an RR series (milliseconds)
pub fn analyze_with_config(
    rr_intervals_ms: &[f64],
    config: &HrvConfig,
) -> Result<HrvAnalysis, ComputeError> {
    validate_intervals(rr_intervals_ms)?;

    let rmssd = rmssd(rr_intervals_ms)?;
    let coverage = coverage_percentage(rr_intervals_ms.len(), config.expected_daily_intervals)?;
    let spectrum = frequency_domain(
        rr_intervals_ms,
        config.max_segment_length,
        config.lf_band,
        config.hf_band,
    );

    let (lf_power, hf_power) = match spectrum {
        Some(fd) => (
            BandPower::Measured(round2(fd.lf_power)),
            BandPower::Measured(round2(fd.hf_power)),
        ),
        None => (BandPower::InsufficientData, BandPower::InsufficientData),
    };

    Ok(HrvAnalysis {
        rmssd: round2(rmssd),
        coverage_percentage: coverage,
        lf_power,
        hf_power,
    })
}

/// Root mean square of successive differences (unrounded)
pub fn rmssd(rr_intervals_ms: &[f64]) -> Result<f64, ComputeError> {
    if rr_intervals_ms.len() < 2 {
        return Err(ComputeError::InsufficientData(format!(
            "RMSSD needs at least 2 RR intervals, got {}",
            rr_intervals_ms.len()
        )));
    }

    let sum_sq: f64 = rr_intervals_ms
        .windows(2)
        .map(|pair| {
            let d = pair[1] - pair[0];
            d * d
        })
        .sum();
    Ok((sum_sq / (rr_intervals_ms.len() - 1) as f64).sqrt())
}

/// Share of the expected daily intervals present, as a percentage (2 decimals)
pub fn coverage_percentage(count: usize, expected_daily_intervals: f64) -> Result<f64, ComputeError> {
    if !(expected_daily_intervals.is_finite() && expected_daily_intervals > 0.0) {
        return Err(ComputeError::InsufficientData(
            "expected daily interval count must be positive".to_string(),
        ));
    }
    Ok(round2(100.0 * count as f64 / expected_daily_intervals))
}

/// LF/HF band powers via Welch's method.
///
/// The series is treated as sampled at `1000 / mean(rr)` Hz. Returns `None`
/// when the series is too short to form a segment.
pub fn frequency_domain(
    rr_intervals_ms: &[f64],
    max_segment_length: usize,
    lf_band: FrequencyBand,
    hf_band: FrequencyBand,
) -> Option<FrequencyDomain> {
    if rr_intervals_ms.len() < 2 {
        return None;
    }
    let fs = 1000.0 / mean(rr_intervals_ms)?;
    let psd = welch(rr_intervals_ms, fs, max_segment_length)?;

    Some(FrequencyDomain {
        lf_power: psd.band_power(lf_band.low_hz, lf_band.high_hz),
        hf_power: psd.band_power(hf_band.low_hz, hf_band.high_hz),
    })
}

fn validate_intervals(rr_intervals_ms: &[f64]) -> Result<(), ComputeError> {
    match rr_intervals_ms
        .iter()
        .position(|rr| !(rr.is_finite() && *rr > 0.0))
    {
        Some(index) => Err(ComputeError::MalformedPayload(format!(
            "RR interval {index} must be positive, got {}",
            rr_intervals_ms[index]
        ))),
        None => Ok(()),
    }
}
