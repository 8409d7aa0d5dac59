//! Control limit calculation for variables charts
//!
//! Supports X-bar/R (the default chart), X-bar/S and Individuals/Moving Range.
//! Results are recomputed from scratch on every call; nothing is cached.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed., ch. 6
//! - ASTM E2587, Standard Practice for Use of Control Charts

use serde::Serialize;

use crate::core::error::SpcError;
use crate::core::factors::{ChartFactors, D4_MOVING_RANGE, E2};
use crate::core::measurement::{ChartType, Measurement};
use crate::core::subgroup::{self, Subgroup};

/// d2 for moving ranges of span 2
const D2_MOVING_RANGE: f64 = 1.128;

/// Upper, center and lower line of one chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    /// Upper control limit
    pub ucl: f64,
    /// Center line
    pub cl: f64,
    /// Lower control limit
    pub lcl: f64,
}

impl ControlLimits {
    /// True when `value` lies within [LCL, UCL]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lcl && value <= self.ucl
    }
}

/// One plotted statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Subgroup (or observation) index
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup_number: Option<u32>,
    pub value: f64,
    /// Point falls outside the control limits
    pub beyond_limits: bool,
}

/// A chart: its limits and plotted points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub limits: ControlLimits,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn new(limits: ControlLimits, stats: Vec<(usize, Option<u32>, f64)>) -> Self {
        let points = stats
            .into_iter()
            .map(|(index, subgroup_number, value)| ChartPoint {
                index,
                subgroup_number,
                value,
                beyond_limits: !limits.contains(value),
            })
            .collect();
        Self { limits, points }
    }

    /// Points outside the control limits
    pub fn out_of_control(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter().filter(|p| p.beyond_limits)
    }
}

/// Statistic plotted on the spread chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadStatistic {
    Range,
    StdDev,
    MovingRange,
}

impl std::fmt::Display for SpreadStatistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadStatistic::Range => write!(f, "R"),
            SpreadStatistic::StdDev => write!(f, "S"),
            SpreadStatistic::MovingRange => write!(f, "MR"),
        }
    }
}

/// Conditions that lower confidence in the computed limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LimitsWarning {
    /// Subgroup size not tabulated; factors for `used` were applied instead
    FallbackFactors { sample_size: usize, used: usize },
    /// Subgroups with one member contribute zero spread
    SingletonSubgroups { count: usize },
    /// Subgroups smaller than the configured size
    ShortSubgroups { count: usize, sample_size: usize },
}

impl std::fmt::Display for LimitsWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitsWarning::FallbackFactors { sample_size, used } => write!(
                f,
                "no chart factors for subgroup size {}; n={} factors used as an approximation",
                sample_size, used
            ),
            LimitsWarning::SingletonSubgroups { count } => write!(
                f,
                "{} subgroup(s) have a single measurement and contribute zero spread",
                count
            ),
            LimitsWarning::ShortSubgroups { count, sample_size } => write!(
                f,
                "{} subgroup(s) have fewer than {} measurements",
                count, sample_size
            ),
        }
    }
}

/// Control limits for a location/spread chart pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlLimitsResult {
    pub chart_type: ChartType,
    /// Configured subgroup size (1 for individuals charts)
    pub sample_size: usize,
    pub subgroup_count: usize,
    pub spread_statistic: SpreadStatistic,
    /// Factors applied, absent for individuals charts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<ChartFactors>,
    /// X-bar (or individuals) chart
    pub mean_chart: ChartSeries,
    /// R, S or MR chart
    pub spread_chart: ChartSeries,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LimitsWarning>,
}

impl ControlLimitsResult {
    /// No point on either chart is beyond its limits
    pub fn is_in_control(&self) -> bool {
        self.mean_chart.out_of_control().next().is_none()
            && self.spread_chart.out_of_control().next().is_none()
    }

    /// Short-term sigma estimated from the average spread (R̄/d2, S̄/c4, MR̄/d2)
    pub fn sigma_within(&self) -> f64 {
        let spread = self.spread_chart.limits.cl;
        match (self.spread_statistic, self.factors) {
            (SpreadStatistic::Range, Some(f)) => spread / f.d2,
            (SpreadStatistic::StdDev, Some(f)) => spread / f.c4,
            _ => spread / D2_MOVING_RANGE,
        }
    }
}

/// Options for chart dispatch
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartOptions {
    /// Reject subgroup sizes without tabulated factors instead of falling back
    pub strict_factors: bool,
}

/// X-bar/R control limits
///
/// # Errors
///
/// `InsufficientSubgroups` with fewer than 2 subgroups, `InvalidInput` for
/// `sample_size < 2` or non-finite values.
pub fn compute_limits(
    subgroups: &[Subgroup],
    sample_size: usize,
) -> Result<ControlLimitsResult, SpcError> {
    xbar_r(subgroups, sample_size, &ChartOptions::default())
}

/// X-bar/S control limits
pub fn compute_xbar_s(
    subgroups: &[Subgroup],
    sample_size: usize,
) -> Result<ControlLimitsResult, SpcError> {
    xbar_s(subgroups, sample_size, &ChartOptions::default())
}

/// Individuals/Moving Range control limits
///
/// # Errors
///
/// `InsufficientSubgroups` with fewer than 2 values.
pub fn compute_individuals(values: &[f64]) -> Result<ControlLimitsResult, SpcError> {
    let observations: Vec<(f64, Option<u32>)> = values.iter().map(|&v| (v, None)).collect();
    individuals(&observations)
}

/// Build the configured chart from raw measurements
///
/// Subgroup charts group the measurements first; the individuals chart
/// orders them by timestamp. Attribute charts are rejected.
pub fn compute_chart(
    chart_type: ChartType,
    measurements: &[Measurement],
    sample_size: usize,
    options: &ChartOptions,
) -> Result<ControlLimitsResult, SpcError> {
    match chart_type {
        ChartType::XbarR => {
            let subgroups = subgroup::group(measurements, sample_size)?;
            xbar_r(&subgroups, sample_size, options)
        }
        ChartType::XbarS => {
            let subgroups = subgroup::group(measurements, sample_size)?;
            xbar_s(&subgroups, sample_size, options)
        }
        ChartType::IndividualMr => {
            let mut ordered: Vec<&Measurement> = measurements.iter().collect();
            ordered.sort_by_key(|m| m.timestamp);
            let observations: Vec<(f64, Option<u32>)> = ordered
                .iter()
                .map(|m| (m.value, m.subgroup_number))
                .collect();
            individuals(&observations)
        }
        other => Err(SpcError::UnsupportedChart(other)),
    }
}

fn xbar_r(
    subgroups: &[Subgroup],
    sample_size: usize,
    options: &ChartOptions,
) -> Result<ControlLimitsResult, SpcError> {
    let (factors, mut warnings) = prepare(subgroups, sample_size, options)?;

    let xbars: Vec<f64> = subgroups.iter().map(Subgroup::mean).collect();
    let ranges: Vec<f64> = subgroups.iter().map(Subgroup::range).collect();
    let mean_xbar = mean(&xbars, "subgroup means")?;
    let mean_r = mean(&ranges, "subgroup ranges")?;

    let mean_limits = ControlLimits {
        ucl: mean_xbar + factors.a2 * mean_r,
        cl: mean_xbar,
        lcl: mean_xbar - factors.a2 * mean_r,
    };
    let range_limits = ControlLimits {
        ucl: factors.d4 * mean_r,
        cl: mean_r,
        lcl: factors.d3 * mean_r,
    };

    check_finite_limits(&[mean_limits, range_limits])?;
    tracing::debug!(mean_xbar, mean_r, a2 = factors.a2, "computed X-bar/R limits");
    warnings.extend(subgroup_warnings(subgroups, sample_size));

    Ok(ControlLimitsResult {
        chart_type: ChartType::XbarR,
        sample_size,
        subgroup_count: subgroups.len(),
        spread_statistic: SpreadStatistic::Range,
        factors: Some(factors),
        mean_chart: ChartSeries::new(mean_limits, plotted(subgroups, &xbars)),
        spread_chart: ChartSeries::new(range_limits, plotted(subgroups, &ranges)),
        warnings,
    })
}

fn xbar_s(
    subgroups: &[Subgroup],
    sample_size: usize,
    options: &ChartOptions,
) -> Result<ControlLimitsResult, SpcError> {
    let (factors, mut warnings) = prepare(subgroups, sample_size, options)?;

    let xbars: Vec<f64> = subgroups.iter().map(Subgroup::mean).collect();
    let sds: Vec<f64> = subgroups.iter().map(Subgroup::std_dev).collect();
    let mean_xbar = mean(&xbars, "subgroup means")?;
    let mean_s = mean(&sds, "subgroup standard deviations")?;

    let mean_limits = ControlLimits {
        ucl: mean_xbar + factors.a3 * mean_s,
        cl: mean_xbar,
        lcl: mean_xbar - factors.a3 * mean_s,
    };
    let s_limits = ControlLimits {
        ucl: factors.b4 * mean_s,
        cl: mean_s,
        lcl: factors.b3 * mean_s,
    };

    check_finite_limits(&[mean_limits, s_limits])?;
    tracing::debug!(mean_xbar, mean_s, a3 = factors.a3, "computed X-bar/S limits");
    warnings.extend(subgroup_warnings(subgroups, sample_size));

    Ok(ControlLimitsResult {
        chart_type: ChartType::XbarS,
        sample_size,
        subgroup_count: subgroups.len(),
        spread_statistic: SpreadStatistic::StdDev,
        factors: Some(factors),
        mean_chart: ChartSeries::new(mean_limits, plotted(subgroups, &xbars)),
        spread_chart: ChartSeries::new(s_limits, plotted(subgroups, &sds)),
        warnings,
    })
}

fn individuals(observations: &[(f64, Option<u32>)]) -> Result<ControlLimitsResult, SpcError> {
    if observations.len() < 2 {
        return Err(SpcError::InsufficientSubgroups {
            found: observations.len(),
        });
    }
    if let Some((v, _)) = observations.iter().find(|(v, _)| !v.is_finite()) {
        return Err(SpcError::invalid(format!(
            "measurement values must be finite, got {}",
            v
        )));
    }

    let values: Vec<f64> = observations.iter().map(|(v, _)| *v).collect();
    let moving_ranges: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let center = mean(&values, "individual values")?;
    let mean_mr = mean(&moving_ranges, "moving ranges")?;

    let x_limits = ControlLimits {
        ucl: center + E2 * mean_mr,
        cl: center,
        lcl: center - E2 * mean_mr,
    };
    let mr_limits = ControlLimits {
        ucl: D4_MOVING_RANGE * mean_mr,
        cl: mean_mr,
        lcl: 0.0,
    };

    check_finite_limits(&[x_limits, mr_limits])?;

    let x_points = observations
        .iter()
        .enumerate()
        .map(|(i, (v, n))| (i, *n, *v))
        .collect();
    // MR_i pairs observation i with i-1, so the first plotted MR is at index 1
    let mr_points = moving_ranges
        .iter()
        .enumerate()
        .map(|(i, mr)| (i + 1, observations[i + 1].1, *mr))
        .collect();

    tracing::debug!(center, mean_mr, "computed I-MR limits");

    Ok(ControlLimitsResult {
        chart_type: ChartType::IndividualMr,
        sample_size: 1,
        subgroup_count: observations.len(),
        spread_statistic: SpreadStatistic::MovingRange,
        factors: None,
        mean_chart: ChartSeries::new(x_limits, x_points),
        spread_chart: ChartSeries::new(mr_limits, mr_points),
        warnings: Vec::new(),
    })
}

/// Shared precondition checks and factor resolution for subgroup charts
fn prepare(
    subgroups: &[Subgroup],
    sample_size: usize,
    options: &ChartOptions,
) -> Result<(ChartFactors, Vec<LimitsWarning>), SpcError> {
    if sample_size < 2 {
        return Err(SpcError::invalid(format!(
            "sample size must be at least 2, got {}",
            sample_size
        )));
    }
    if subgroups.len() < 2 {
        return Err(SpcError::InsufficientSubgroups {
            found: subgroups.len(),
        });
    }
    if subgroups.iter().any(Subgroup::is_empty) {
        return Err(SpcError::invalid("subgroups must not be empty"));
    }
    if let Some(v) = subgroups
        .iter()
        .flat_map(|s| s.values())
        .find(|v| !v.is_finite())
    {
        return Err(SpcError::invalid(format!(
            "measurement values must be finite, got {}",
            v
        )));
    }

    if options.strict_factors {
        return Ok((ChartFactors::strict(sample_size)?, Vec::new()));
    }

    let lookup = ChartFactors::lookup(sample_size);
    let warnings = if lookup.fallback {
        vec![LimitsWarning::FallbackFactors {
            sample_size,
            used: lookup.factors.sample_size,
        }]
    } else {
        Vec::new()
    };
    Ok((lookup.factors, warnings))
}

fn subgroup_warnings(subgroups: &[Subgroup], sample_size: usize) -> Vec<LimitsWarning> {
    let mut warnings = Vec::new();

    let singletons = subgroups.iter().filter(|s| s.len() == 1).count();
    if singletons > 0 {
        tracing::warn!(
            count = singletons,
            "single-measurement subgroups depress the average spread"
        );
        warnings.push(LimitsWarning::SingletonSubgroups { count: singletons });
    }

    let short = subgroups.iter().filter(|s| s.len() < sample_size).count();
    if short > 0 {
        warnings.push(LimitsWarning::ShortSubgroups {
            count: short,
            sample_size,
        });
    }

    warnings
}

fn plotted(subgroups: &[Subgroup], stats: &[f64]) -> Vec<(usize, Option<u32>, f64)> {
    subgroups
        .iter()
        .zip(stats)
        .map(|(s, &v)| (s.index, s.number, v))
        .collect()
}

/// Average of `values`, rejecting sums that overflow to infinity
fn mean(values: &[f64], what: &str) -> Result<f64, SpcError> {
    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m.is_finite() {
        Ok(m)
    } else {
        Err(SpcError::invalid(format!(
            "average of {} {} is not finite ({})",
            values.len(),
            what,
            m
        )))
    }
}

fn check_finite_limits(limits: &[ControlLimits]) -> Result<(), SpcError> {
    match limits
        .iter()
        .find(|l| !(l.ucl.is_finite() && l.cl.is_finite() && l.lcl.is_finite()))
    {
        Some(l) => Err(SpcError::invalid(format!(
            "control limits overflow (UCL = {}, CL = {}, LCL = {})",
            l.ucl, l.cl, l.lcl
        ))),
        None => Ok(()),
    }
}
