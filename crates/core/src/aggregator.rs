//! Reduction of raw samples into per-user statistics.
//!
//! Samples are partitioned by identity and each partition is reduced to a
//! [`StatRecord`]. The reduction is all-or-nothing: one malformed value aborts
//! the whole batch so a cycle never commits partial results.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::SyncError;
use crate::models::{RawSample, StatRecord, UserId};

/// Reduces `samples` to one record per identity, stamped with the current time.
///
/// # Errors
/// Returns [`SyncError::InvalidSample`] if any value is not a finite number.
pub fn reduce(samples: Vec<RawSample>) -> Result<BTreeMap<UserId, StatRecord>, SyncError> {
    reduce_at(samples, Utc::now())
}

/// Same as [`reduce`] with an explicit `last_updated` stamp.
///
/// # Errors
/// Returns [`SyncError::InvalidSample`] if any value is not a finite number.
pub fn reduce_at(
    samples: Vec<RawSample>,
    now: DateTime<Utc>,
) -> Result<BTreeMap<UserId, StatRecord>, SyncError> {
    let mut groups: BTreeMap<UserId, Vec<f64>> = BTreeMap::new();

    for sample in samples {
        let Some(value) = sample.value.as_number() else {
            return Err(SyncError::InvalidSample {
                reason: format!("value {} is not a finite number", sample.value),
                identity: sample.identity,
            });
        };
        groups.entry(sample.identity).or_default().push(value);
    }

    Ok(groups
        .into_iter()
        .filter_map(|(identity, values)| {
            summarize(&identity, values, now).map(|record| (identity, record))
        })
        .collect())
}

/// Builds the record for one partition. `None` only for an empty partition.
fn summarize(identity: &UserId, mut values: Vec<f64>, now: DateTime<Utc>) -> Option<StatRecord> {
    // Sorting fixes the summation order, so the mean does not depend on arrival order.
    values.sort_by(f64::total_cmp);

    let min = *values.first()?;
    let max = *values.last()?;
    let count = values.len();
    let sum: f64 = values.iter().sum();
    let avg = (sum / count as f64).clamp(min, max);

    Some(StatRecord {
        identity: identity.clone(),
        max,
        min,
        avg,
        count: count as u64,
        last_updated: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawValue;

    fn sample(id: &str, value: f64) -> RawSample {
        RawSample::new(id, value)
    }

    #[test]
    fn test_reference_scenario() {
        let samples = vec![
            sample("u1", 10.0),
            sample("u1", 20.0),
            sample("u1", 30.0),
            sample("u2", 5.0),
        ];
        let records = reduce(samples).unwrap();
        assert_eq!(records.len(), 2);

        let u1 = &records[&UserId::new("u1")];
        assert_eq!((u1.max, u1.min, u1.avg, u1.count), (30.0, 10.0, 20.0, 3));

        let u2 = &records[&UserId::new("u2")];
        assert_eq!((u2.max, u2.min, u2.avg, u2.count), (5.0, 5.0, 5.0, 1));
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(reduce(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_order_independent() {
        let now = Utc::now();
        let values = [0.1, 0.7, 1e16, -3.25, 0.2, 42.0, 1.0 / 3.0];
        let forward: Vec<_> = values.iter().map(|v| sample("u", *v)).collect();
        let backward: Vec<_> = values.iter().rev().map(|v| sample("u", *v)).collect();
        assert_eq!(
            reduce_at(forward, now).unwrap(),
            reduce_at(backward, now).unwrap()
        );
    }

    #[test]
    fn test_avg_stays_within_bounds() {
        // 0.1 * 3 / 3 rounds above 0.1 without clamping.
        let records = reduce(vec![sample("u", 0.1), sample("u", 0.1), sample("u", 0.1)]).unwrap();
        let record = &records[&UserId::new("u")];
        assert!(record.min <= record.avg && record.avg <= record.max);
        assert_eq!(record.avg, 0.1);
    }

    #[test]
    fn test_invariants_hold_for_mixed_groups() {
        let mut samples = Vec::new();
        for i in 0..50 {
            let id = format!("user-{}", i % 7);
            samples.push(sample(&id, f64::from(i).mul_add(1.37, -20.0)));
        }
        let records = reduce(samples.clone()).unwrap();
        for (identity, record) in &records {
            let expected = samples.iter().filter(|s| &s.identity == identity).count();
            assert_eq!(record.count as usize, expected);
            assert!(record.count >= 1);
            assert!(record.min <= record.avg && record.avg <= record.max);
        }
    }

    #[test]
    fn test_text_values_are_parsed() {
        let samples = vec![
            RawSample::new("u1", RawValue::Text("4".to_string())),
            RawSample::new("u1", RawValue::Text("8.5".to_string())),
        ];
        let records = reduce(samples).unwrap();
        assert_eq!(records[&UserId::new("u1")].max, 8.5);
    }

    #[test]
    fn test_invalid_sample_aborts_whole_reduction() {
        let samples = vec![
            sample("u1", 1.0),
            RawSample::new("u2", RawValue::Text("n/a".to_string())),
            sample("u3", 3.0),
        ];
        match reduce(samples) {
            Err(SyncError::InvalidSample { identity, reason }) => {
                assert_eq!(identity, UserId::new("u2"));
                assert!(reason.contains("n/a"));
            }
            other => panic!("expected InvalidSample, got {other:?}"),
        }
    }

    #[test]
    fn test_null_value_is_invalid() {
        let err = reduce(vec![RawSample::new("u1", RawValue::Null)]).unwrap_err();
        assert_eq!(err.kind(), "invalid_sample");
    }

    #[test]
    fn test_last_updated_is_stamped() {
        let now = Utc::now();
        let records = reduce_at(vec![sample("u1", 1.0)], now).unwrap();
        assert_eq!(records[&UserId::new("u1")].last_updated, now);
    }
}
