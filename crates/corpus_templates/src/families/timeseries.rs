//! Ordered metric readings for time-series ingestion tests.
//!
//! Each document is a small event record stamped one minute after the
//! previous one. The sequence number is the index in the document id, and
//! the series starts a week before the timestamp anchor.

use super::generic;
use crate::document::Document;
use crate::fake::{
    format_hour_bucket, format_timestamp, FakeData, ANCHOR_EPOCH_SECS, SECONDS_PER_DAY,
};
use crate::registry::{CorpusRng, SizeBand, TemplateError, TemplateFamily, TierSpec};
use serde_json::{json, Value};

const TIERS: &[TierSpec] = &[TierSpec {
    name: "ts",
    weight: 1.0,
    band: SizeBand::new(300, 700),
    description: "event record with a sequenced timestamp and metrics",
}];

const TRENDS: &[&str] = &["up", "down", "stable"];

/// First reading of every series
pub const SERIES_START_SECS: i64 = ANCHOR_EPOCH_SECS - 7 * SECONDS_PER_DAY;

/// Seconds between consecutive readings
pub const SERIES_STEP_SECS: i64 = 60;

/// Minute-spaced readings sequenced by document index
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesFamily;

impl TemplateFamily for TimeSeriesFamily {
    fn name(&self) -> &'static str {
        "timeseries"
    }

    fn tiers(&self) -> &'static [TierSpec] {
        TIERS
    }

    fn ordered(&self) -> bool {
        true
    }

    fn generate(
        &self,
        tier: &str,
        id: &str,
        rng: &mut CorpusRng,
    ) -> Result<Document, TemplateError> {
        if tier != "ts" {
            return Err(self.unknown_tier(tier));
        }
        let sequence = sequence_of(id)?;
        let at = SERIES_START_SECS + sequence * SERIES_STEP_SECS;

        let mut fake = FakeData::new(rng);
        let mut value = generic::small(id, &mut fake);
        if let Value::Object(map) = &mut value {
            map.insert("timestamp".into(), json!(format_timestamp(at)));
            map.insert("sequence_id".into(), json!(sequence));
            map.insert("time_bucket".into(), json!(format_hour_bucket(at)));
            map.insert(
                "metrics".into(),
                json!({
                    "value": fake.float(0.0, 100.0, 2),
                    "trend": fake.pick(TRENDS),
                    "anomaly_score": fake.float(0.0, 1.0, 3),
                }),
            );
        }
        Document::from_value(value)
    }
}

/// Index after the last `_` of an id such as `ts_42`
fn sequence_of(id: &str) -> Result<i64, TemplateError> {
    id.rsplit_once('_')
        .and_then(|(_, index)| index.parse::<i64>().ok())
        .ok_or_else(|| {
            TemplateError::Failed(format!(
                "time-series id '{}' does not end in a sequence number",
                id
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn reading(index: u64, seed: u64) -> Document {
        let mut rng = CorpusRng::seed_from_u64(seed);
        TimeSeriesFamily
            .generate("ts", &format!("ts_{}", index), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_first_reading_starts_a_week_before_anchor() {
        let doc = reading(0, 1);
        assert_eq!(doc.id(), "ts_0");
        assert_eq!(doc.get("timestamp").and_then(Value::as_str), Some("2023-12-25T00:00:00"));
        assert_eq!(doc.get("time_bucket").and_then(Value::as_str), Some("2023-12-25-00"));
        assert_eq!(doc.get("sequence_id").and_then(Value::as_i64), Some(0));
    }

    #[test]
    fn test_readings_are_a_minute_apart() {
        let doc = reading(61, 1);
        assert_eq!(doc.get("timestamp").and_then(Value::as_str), Some("2023-12-25T01:01:00"));
        assert_eq!(doc.get("time_bucket").and_then(Value::as_str), Some("2023-12-25-01"));
        assert_eq!(doc.get("sequence_id").and_then(Value::as_i64), Some(61));
    }

    #[test]
    fn test_timestamp_ignores_seed() {
        assert_eq!(
            reading(5, 1).get("timestamp"),
            reading(5, 99).get("timestamp")
        );
        assert_ne!(reading(5, 1), reading(5, 99));
    }

    #[test]
    fn test_metrics_within_ranges() {
        for seed in 0..20 {
            let doc = reading(seed, seed);
            let metrics = doc.get("metrics").unwrap();
            let value = metrics["value"].as_f64().unwrap();
            let score = metrics["anomaly_score"].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&value));
            assert!((0.0..=1.0).contains(&score));
            assert!(TRENDS.contains(&metrics["trend"].as_str().unwrap()));
            assert!(doc.get("service").is_some());
        }
    }

    #[test]
    fn test_id_without_index_rejected() {
        let mut rng = CorpusRng::seed_from_u64(1);
        let err = TimeSeriesFamily.generate("ts", "ts", &mut rng).unwrap_err();
        assert!(matches!(err, TemplateError::Failed(_)));
        let err = TimeSeriesFamily
            .generate("small", "small_0", &mut rng)
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTier { .. }));
    }

    #[test]
    fn test_family_keeps_order() {
        assert!(TimeSeriesFamily.ordered());
        assert_eq!(
            TimeSeriesFamily.default_weights(),
            vec![("ts".to_string(), 1.0)]
        );
    }
}
