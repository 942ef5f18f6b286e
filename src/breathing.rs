//! Breathing rate classification by sleep stage

use serde::Serialize;

use crate::sleep::aggregate;
use crate::types::{SleepRecord, StageValues};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreathingRates {
    pub overall_avg_breaths_per_minute: f64,
    pub stage_avg_breaths_per_minute: StageValues,
}

/// Breaths per minute overall and per stage across every sleep record of a
/// date (main sleep and naps). Records without stage intervals are skipped.
pub fn classify(sleep_records: &[SleepRecord]) -> BreathingRates {
    let rates = aggregate(
        sleep_records
            .iter()
            .filter_map(|record| record.intervals.as_ref())
            .flatten(),
    );

    BreathingRates {
        overall_avg_breaths_per_minute: rates.overall,
        stage_avg_breaths_per_minute: rates.per_stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SleepStage, SleepStageInterval};
    use pretty_assertions::assert_eq;

    fn record(intervals: Option<Vec<SleepStageInterval>>) -> SleepRecord {
        SleepRecord {
            intervals,
            ..Default::default()
        }
    }

    #[test]
    fn test_main_sleep_and_nap_are_combined() {
        let main = record(Some(vec![
            SleepStageInterval::new(SleepStage::Deep, 1800.0, 420.0),
            SleepStageInterval::new(SleepStage::Light, 3600.0, 900.0),
        ]));
        let nap = record(Some(vec![SleepStageInterval::new(
            SleepStage::Light,
            1200.0,
            340.0,
        )]));

        let rates = classify(&[main, nap]);

        // light: 1240 breaths / 80 minutes
        assert_eq!(rates.stage_avg_breaths_per_minute.light, 15.5);
        assert_eq!(rates.stage_avg_breaths_per_minute.deep, 14.0);
        // overall: 1660 / 110
        assert_eq!(rates.overall_avg_breaths_per_minute, 15.09);
    }

    #[test]
    fn test_records_without_levels_are_skipped() {
        let rates = classify(&[
            record(None),
            record(Some(vec![SleepStageInterval::new(
                SleepStage::Rem,
                600.0,
                160.0,
            )])),
        ]);
        assert_eq!(rates.stage_avg_breaths_per_minute.rem, 16.0);
        assert_eq!(rates.overall_avg_breaths_per_minute, 16.0);
    }

    #[test]
    fn test_no_records() {
        let rates = classify(&[]);
        assert_eq!(rates.overall_avg_breaths_per_minute, 0.0);
        assert_eq!(rates.stage_avg_breaths_per_minute, StageValues::default());
    }
}
