//! Print a combined vitals report for one day of fixture payloads

use synheart_vitals::types::Vendor;
use synheart_vitals::{DataScope, FixtureRetriever, VitalsProcessor};

fn main() {
    let date = "2024-01-15";

    let rr: Vec<String> = (0..300)
        .map(|i| {
            let t = i as f64;
            format!("{:.1}", 950.0 + 35.0 * (2.0 * std::f64::consts::PI * 0.25 * t).sin())
        })
        .collect();

    let retriever = FixtureRetriever::new(Vendor::Fitbit)
        .with_payload(
            DataScope::BreathingRate,
            date,
            r#"{"sleep": [{"levels": {"data": [
                {"level": "deep", "seconds": 1800, "breaths": 420},
                {"level": "light", "seconds": 5400, "breaths": 1350},
                {"level": "rem", "seconds": 2700, "breaths": 720},
                {"level": "wake", "seconds": 600, "breaths": 170}
            ]}}]}"#,
        )
        .with_payload(
            DataScope::HeartRate,
            date,
            r#"{"activities-heart-intraday": {"dataset": [
                {"time": "03:00:00", "value": 51}, {"time": "03:01:00", "value": 49},
                {"time": "09:30:00", "value": 74}, {"time": "18:15:00", "value": 96}
            ]}}"#,
        )
        .with_payload(
            DataScope::Hrv,
            date,
            format!(r#"{{"rr_intervals": [{}]}}"#, rr.join(",")),
        );

    let processor = VitalsProcessor::new(retriever);
    let report = processor.report(
        &[DataScope::BreathingRate, DataScope::HeartRate, DataScope::Hrv],
        date,
        None,
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => print!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
