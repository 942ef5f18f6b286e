//! Sleep stage aggregation
//!
//! Reduces sleep-stage intervals into breath and minute totals, overall and
//! per known stage, and derives breaths-per-minute rates from them.

use serde::Serialize;

use crate::stats::round2;
use crate::types::{SleepStage, SleepStageInterval, StageValues};

/// Accumulated breaths and minutes
///
/// Intervals with an unknown stage count toward the totals only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTotals {
    pub total_breaths: f64,
    pub total_minutes: f64,
    pub stage_breaths: StageValues,
    pub stage_minutes: StageValues,
}

impl StageTotals {
    pub fn from_intervals<'a, I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a SleepStageInterval>,
    {
        let mut totals = StageTotals::default();
        for interval in intervals {
            totals.add(interval);
        }
        totals
    }

    pub fn add(&mut self, interval: &SleepStageInterval) {
        let minutes = interval.duration_seconds / 60.0;
        self.total_breaths += interval.breath_count;
        self.total_minutes += minutes;

        if let Some(breaths) = self.stage_breaths.get_mut(interval.stage) {
            *breaths += interval.breath_count;
        }
        if let Some(stage_minutes) = self.stage_minutes.get_mut(interval.stage) {
            *stage_minutes += minutes;
        }
    }

    /// Breaths per minute over all intervals, 0 when no time was recorded
    pub fn overall_rate(&self) -> f64 {
        guarded_rate(self.total_breaths, self.total_minutes)
    }

    /// Breaths per minute for one stage, 0 when that stage has no time
    pub fn stage_rate(&self, stage: SleepStage) -> f64 {
        match (self.stage_breaths.get(stage), self.stage_minutes.get(stage)) {
            (Some(breaths), Some(minutes)) => guarded_rate(breaths, minutes),
            _ => 0.0,
        }
    }
}

/// Aggregated breathing rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageRates {
    pub overall: f64,
    pub per_stage: StageValues,
}

/// Reduce stage intervals into overall and per-stage breaths per minute
pub fn aggregate<'a, I>(intervals: I) -> StageRates
where
    I: IntoIterator<Item = &'a SleepStageInterval>,
{
    let totals = StageTotals::from_intervals(intervals);
    StageRates {
        overall: totals.overall_rate(),
        per_stage: StageValues::from_fn(|stage| totals.stage_rate(stage)),
    }
}

fn guarded_rate(breaths: f64, minutes: f64) -> f64 {
    if minutes > 0.0 {
        round2(breaths / minutes)
    } else {
        0.0
    }
}
