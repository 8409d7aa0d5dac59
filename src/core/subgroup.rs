//! Rational subgrouping of measurement series
//!
//! Measurements carrying an explicit `subgroup_number` are grouped by that
//! number. Otherwise they are ordered by timestamp and chunked positionally
//! into groups of `sample_size`, keeping a trailing partial group.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::error::SpcError;
use crate::core::measurement::Measurement;

/// An ordered, non-empty set of measurements sharing one group index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subgroup {
    /// Zero-based position in the subgroup sequence
    pub index: usize,

    /// Explicit subgroup number, when grouping was keyed by it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,

    /// Member measurements, in input order
    pub measurements: Vec<Measurement>,
}

impl Subgroup {
    /// Build a subgroup from raw values (no timestamps needed)
    ///
    /// Returns `None` for an empty slice since subgroups are never empty.
    pub fn from_values(index: usize, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let epoch = chrono::DateTime::<chrono::Utc>::default();
        let measurements = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Measurement::new(v, epoch + chrono::Duration::seconds(i as i64)))
            .collect();
        Some(Self {
            index,
            number: None,
            measurements,
        })
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.measurements.iter().map(|m| m.value)
    }

    /// Subgroup mean (X-bar)
    pub fn mean(&self) -> f64 {
        self.values().sum::<f64>() / self.len() as f64
    }

    /// Subgroup range: max - min
    pub fn range(&self) -> f64 {
        let (min, max) = self
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        max - min
    }

    /// Sample standard deviation (n-1 divisor); zero for a single value
    pub fn std_dev(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let ss: f64 = self.values().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    }
}

/// Partition measurements into rational subgroups
///
/// # Errors
///
/// `InsufficientData` for an empty input, `InvalidInput` when `sample_size < 2`.
pub fn group(measurements: &[Measurement], sample_size: usize) -> Result<Vec<Subgroup>, SpcError> {
    if sample_size < 2 {
        return Err(SpcError::invalid(format!(
            "sample size must be at least 2, got {}",
            sample_size
        )));
    }
    if measurements.is_empty() {
        return Err(SpcError::InsufficientData {
            operation: "subgroups",
        });
    }

    let explicit = measurements.iter().all(|m| m.subgroup_number.is_some());
    let subgroups = if explicit {
        group_by_number(measurements)
    } else {
        group_by_position(measurements, sample_size)
    };

    tracing::debug!(
        count = subgroups.len(),
        sample_size,
        explicit,
        "grouped measurements"
    );
    Ok(subgroups)
}

fn group_by_number(measurements: &[Measurement]) -> Vec<Subgroup> {
    let mut slots: HashMap<u32, usize> = HashMap::new();
    let mut subgroups: Vec<Subgroup> = Vec::new();

    for m in measurements {
        let Some(number) = m.subgroup_number else {
            continue;
        };
        let slot = *slots.entry(number).or_insert_with(|| {
            subgroups.push(Subgroup {
                index: subgroups.len(),
                number: Some(number),
                measurements: Vec::new(),
            });
            subgroups.len() - 1
        });
        subgroups[slot].measurements.push(m.clone());
    }

    subgroups
}

fn group_by_position(measurements: &[Measurement], sample_size: usize) -> Vec<Subgroup> {
    let mut ordered: Vec<&Measurement> = measurements.iter().collect();
    // stable: equal timestamps keep input order
    ordered.sort_by_key(|m| m.timestamp);

    ordered
        .chunks(sample_size)
        .enumerate()
        .map(|(index, chunk)| Subgroup {
            index,
            number: None,
            measurements: chunk.iter().map(|&m| m.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> Vec<Measurement> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Measurement::new(v, start + Duration::minutes(i as i64)))
            .collect()
    }

    #[test]
    fn test_group_positional_with_trailing_partial() {
        let data = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let groups = group(&data, 3).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].len(), 3);
        assert_eq!(groups[2].len(), 1);
        assert_eq!(groups[2].index, 2);
        assert!(groups.iter().all(|g| g.number.is_none()));
    }

    #[test]
    fn test_group_sorts_by_timestamp() {
        let mut data = series(&[1.0, 2.0, 3.0, 4.0]);
        data.reverse();
        let groups = group(&data, 2).unwrap();
        let first: Vec<f64> = groups[0].values().collect();
        assert_eq!(first, vec![1.0, 2.0]);
    }

    #[test]
    fn test_group_by_explicit_number_keeps_first_seen_order() {
        let data: Vec<Measurement> = series(&[1.0, 2.0, 3.0, 4.0, 5.0])
            .into_iter()
            .zip([7, 3, 7, 3, 9])
            .map(|(m, n)| m.with_subgroup(n))
            .collect();

        let groups = group(&data, 5).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].number, Some(7));
        assert_eq!(groups[1].number, Some(3));
        assert_eq!(groups[2].number, Some(9));
        assert_eq!(groups[0].values().collect::<Vec<_>>(), vec![1.0, 3.0]);
        assert_eq!(groups[1].values().collect::<Vec<_>>(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_partial_numbers_fall_back_to_positions() {
        let mut data = series(&[1.0, 2.0, 3.0, 4.0]);
        data[0].subgroup_number = Some(1);
        let groups = group(&data, 2).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.number.is_none()));
    }

    #[test]
    fn test_group_empty_input() {
        let err = group(&[], 5).unwrap_err();
        assert!(matches!(err, SpcError::InsufficientData { .. }));
    }

    #[test]
    fn test_group_rejects_sample_size_below_two() {
        let data = series(&[1.0, 2.0]);
        assert!(matches!(group(&data, 1), Err(SpcError::InvalidInput(_))));
    }

    #[test]
    fn test_subgroup_statistics() {
        let sg = Subgroup::from_values(0, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sg.mean() - 5.0).abs() < 1e-12);
        assert!((sg.range() - 7.0).abs() < 1e-12);
        // sample variance = 32 / 7
        assert!((sg.std_dev() - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_singleton_subgroup_has_zero_spread() {
        let sg = Subgroup::from_values(0, &[3.5]).unwrap();
        assert_eq!(sg.range(), 0.0);
        assert_eq!(sg.std_dev(), 0.0);
        assert!(Subgroup::from_values(0, &[]).is_none());
    }
}
