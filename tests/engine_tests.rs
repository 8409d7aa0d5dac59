//! Engine integration tests: documented scenarios and properties

mod common;

use chrono::{Duration, TimeZone, Utc};
use proptest::collection::vec;
use proptest::prelude::*;

use common::REFERENCE_SUBGROUPS;
use spc::core::{
    analyze_characteristic, classify_gage_rr, compute_capability, compute_chart,
    compute_individuals, compute_limits, compute_xbar_s, group, ChartOptions, ChartType,
    Characteristic, EngineSettings, GageRrCategory, LimitsWarning, Measurement, SpcError,
    SpecLimits, Subgroup,
};

fn measurements(values: &[f64]) -> Vec<Measurement> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Measurement::new(v, start + Duration::seconds(i as i64)))
        .collect()
}

fn reference_subgroups() -> Vec<Subgroup> {
    REFERENCE_SUBGROUPS
        .iter()
        .enumerate()
        .filter_map(|(i, values)| Subgroup::from_values(i, values))
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn xbar_r_reference_limits() {
    let result = compute_limits(&reference_subgroups(), 5).unwrap();

    assert!(close(result.mean_chart.limits.cl, 11.0));
    assert!(close(result.spread_chart.limits.cl, 2.4));
    assert!(close(result.mean_chart.limits.ucl, 12.3848));
    assert!(close(result.mean_chart.limits.lcl, 9.6152));
    assert!(close(result.spread_chart.limits.ucl, 2.114 * 2.4));
    assert!(close(result.spread_chart.limits.lcl, 0.0));
    assert!(!result.is_in_control());
    assert!(result.warnings.is_empty());
}

#[test]
fn xbar_r_subgroup_size_three_factors() {
    let subgroups: Vec<Subgroup> = [[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]]
        .iter()
        .enumerate()
        .filter_map(|(i, v)| Subgroup::from_values(i, v))
        .collect();
    let result = compute_limits(&subgroups, 3).unwrap();

    // mean_xbar 2.5, mean_r 2.0
    assert!(close(result.mean_chart.limits.ucl, 2.5 + 1.023 * 2.0));
    assert!(close(result.spread_chart.limits.ucl, 2.574 * 2.0));
}

#[test]
fn xbar_r_requires_two_subgroups() {
    let one = &reference_subgroups()[..1];
    assert_eq!(
        compute_limits(one, 5).unwrap_err(),
        SpcError::InsufficientSubgroups { found: 1 }
    );
}

#[test]
fn xbar_s_limits_bracket_center() {
    let result = compute_xbar_s(&reference_subgroups(), 5).unwrap();
    let s = result.spread_chart.limits;
    assert!(s.lcl <= s.cl && s.cl <= s.ucl);
    assert!(close(result.mean_chart.limits.cl, 11.0));
}

#[test]
fn individuals_chart_limits() {
    let result = compute_individuals(&[10.0, 12.0, 11.0, 13.0]).unwrap();
    // moving ranges 2, 1, 2
    let mr_bar = 5.0 / 3.0;
    assert!(close(result.spread_chart.limits.cl, mr_bar));
    assert!(close(result.mean_chart.limits.ucl, 11.5 + 2.660 * mr_bar));
    assert!(close(result.spread_chart.limits.ucl, 3.267 * mr_bar));
    assert!(close(result.spread_chart.limits.lcl, 0.0));
}

#[test]
fn explicit_subgroup_numbers_take_precedence() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let data = vec![
        Measurement::new(1.0, start).with_subgroup(7),
        Measurement::new(5.0, start + Duration::minutes(1)).with_subgroup(3),
        Measurement::new(2.0, start + Duration::minutes(2)).with_subgroup(7),
        Measurement::new(6.0, start + Duration::minutes(3)).with_subgroup(3),
    ];

    let subgroups = group(&data, 5).unwrap();
    assert_eq!(subgroups.len(), 2);
    assert_eq!(subgroups[0].number, Some(7));
    assert_eq!(subgroups[0].values().collect::<Vec<_>>(), vec![1.0, 2.0]);
    assert_eq!(subgroups[1].values().collect::<Vec<_>>(), vec![5.0, 6.0]);
}

#[test]
fn singleton_subgroups_are_warned_not_rejected() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let data = vec![
        Measurement::new(1.0, start).with_subgroup(1),
        Measurement::new(2.0, start).with_subgroup(2),
        Measurement::new(3.0, start).with_subgroup(2),
    ];
    let result = compute_chart(ChartType::XbarR, &data, 2, &ChartOptions::default()).unwrap();
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, LimitsWarning::SingletonSubgroups { count: 1 })));
}

#[test]
fn attribute_charts_are_unsupported() {
    let data = measurements(&[1.0, 2.0, 3.0, 4.0]);
    for chart in [ChartType::P, ChartType::Np, ChartType::C, ChartType::U] {
        assert_eq!(
            compute_chart(chart, &data, 2, &ChartOptions::default()).unwrap_err(),
            SpcError::UnsupportedChart(chart)
        );
    }
}

#[test]
fn capability_centered_process() {
    let result = compute_capability(&[24.9, 25.0, 25.1, 24.95, 25.05], Some(25.2), Some(24.8))
        .unwrap();
    assert!(close(result.mean, 25.0));
    assert!(close(result.cp, result.cpk));
    assert_eq!(result.cp, result.pp);
    assert_eq!(result.cpk, result.ppk);
    assert!(close(result.sigma_level, 3.0 * result.cpk));
}

#[test]
fn capability_degenerate_distribution() {
    let err = compute_capability(&[10.0, 10.0, 10.0], Some(20.0), Some(0.0)).unwrap_err();
    assert!(matches!(err, SpcError::DegenerateDistribution { count: 3, .. }));
}

#[test]
fn capability_checks_limits_before_data() {
    assert!(matches!(
        compute_capability(&[], None, Some(1.0)),
        Err(SpcError::MissingSpecLimits { .. })
    ));
    assert!(matches!(
        compute_capability(&[], Some(2.0), Some(1.0)),
        Err(SpcError::InsufficientData { .. })
    ));
}

#[test]
fn gage_rr_boundaries() {
    assert_eq!(classify_gage_rr(9.9).unwrap(), GageRrCategory::Excellent);
    assert_eq!(classify_gage_rr(10.0).unwrap(), GageRrCategory::Acceptable);
    assert_eq!(classify_gage_rr(30.0).unwrap(), GageRrCategory::Unacceptable);
    assert!(classify_gage_rr(-0.1).is_err());
}

#[test]
fn analysis_reports_parts_independently() {
    let values: Vec<f64> = REFERENCE_SUBGROUPS.iter().flatten().copied().collect();
    let chr = Characteristic::new(SpecLimits::new(Some(16.0), None));
    let analysis =
        analyze_characteristic(&chr, &measurements(&values), &EngineSettings::default()).unwrap();

    assert_eq!(analysis.sample_size, 5);
    assert!(analysis.limits.is_ok());
    assert!(matches!(
        analysis.capability,
        Err(SpcError::MissingSpecLimits { missing: "LSL" })
    ));
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Positional grouping yields ceil(n / size) groups that concatenate back to the input.
    #[test]
    fn grouping_partitions_input(
        values in vec(-1000.0f64..1000.0, 1..60),
        sample_size in 2usize..8
    ) {
        let data = measurements(&values);
        let subgroups = group(&data, sample_size).unwrap();

        prop_assert_eq!(subgroups.len(), values.len().div_ceil(sample_size));
        let rejoined: Vec<f64> = subgroups.iter().flat_map(|s| s.values()).collect();
        prop_assert_eq!(rejoined, values);
        for s in &subgroups[..subgroups.len() - 1] {
            prop_assert_eq!(s.len(), sample_size);
        }
    }

    /// Explicit numbering yields one group per distinct key, in first-seen key order,
    /// with each record keeping its relative input order.
    #[test]
    fn explicit_grouping_follows_first_seen_keys(
        records in vec((-100.0f64..100.0, 0u32..6), 1..40),
        sample_size in 2usize..8
    ) {
        let values: Vec<f64> = records.iter().map(|(v, _)| *v).collect();
        let data: Vec<Measurement> = measurements(&values)
            .into_iter()
            .zip(&records)
            .map(|(m, (_, key))| m.with_subgroup(*key))
            .collect();
        let subgroups = group(&data, sample_size).unwrap();

        let mut keys: Vec<u32> = Vec::new();
        for (_, key) in &records {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        prop_assert_eq!(subgroups.len(), keys.len());

        let expected: Vec<f64> = keys
            .iter()
            .flat_map(|k| records.iter().filter(move |(_, key)| key == k).map(|(v, _)| *v))
            .collect();
        let rejoined: Vec<f64> = subgroups.iter().flat_map(|s| s.values()).collect();
        prop_assert_eq!(rejoined, expected);

        for (s, key) in subgroups.iter().zip(&keys) {
            prop_assert_eq!(s.number, Some(*key));
        }
    }

    /// Control limits always bracket the center line.
    #[test]
    fn limits_bracket_center_line(
        values in vec(-100.0f64..100.0, 4..60),
        sample_size in 2usize..12
    ) {
        prop_assume!(values.len() >= 2 * sample_size);
        let data = measurements(&values);
        let subgroups = group(&data, sample_size).unwrap();
        let result = compute_limits(&subgroups, sample_size).unwrap();

        for limits in [result.mean_chart.limits, result.spread_chart.limits] {
            prop_assert!(limits.lcl <= limits.cl);
            prop_assert!(limits.cl <= limits.ucl);
        }
    }

    /// Capability is a pure function of its inputs.
    #[test]
    fn capability_is_deterministic(
        values in vec(0.0f64..50.0, 1..40),
        lsl in -10.0f64..0.0,
        width in 1.0f64..100.0
    ) {
        let usl = lsl + width;
        let first = compute_capability(&values, Some(usl), Some(lsl));
        let second = compute_capability(&values, Some(usl), Some(lsl));
        prop_assert_eq!(&first, &second);

        if let Ok(result) = first {
            prop_assert!(result.defect_rate_ppm >= 0.0);
            prop_assert!(result.defect_rate_ppm <= 1e6 + 1e-6);
            prop_assert!(result.cpk <= result.cp + 1e-9);
        }
    }
}
