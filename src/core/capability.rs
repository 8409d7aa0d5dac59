//! Process capability analysis
//!
//! Computes Cp/Cpk/Pp/Ppk, sigma level and predicted defect rate from the
//! full (ungrouped) measurement series and a two-sided specification window.
//!
//! Sigma is the population standard deviation of the series. Pp and Ppk use
//! the same sigma as Cp and Cpk, so `pp == cp` and `ppk == cpk`: no separate
//! within-subgroup estimator is applied.

use serde::Serialize;

use crate::core::error::SpcError;
use crate::core::normal::normal_cdf;

/// Capability indices for one measurement series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityResult {
    /// Mean of the series
    pub mean: f64,

    /// Population standard deviation (divisor n)
    pub std_dev: f64,

    /// Cp = (USL - LSL) / (6σ)
    pub cp: f64,

    /// Cpk = min(Cpu, Cpl)
    pub cpk: f64,

    /// Pp, computed identically to Cp
    pub pp: f64,

    /// Ppk, computed identically to Cpk
    pub ppk: f64,

    /// Cpu = (USL - μ) / (3σ)
    pub cpu: f64,

    /// Cpl = (μ - LSL) / (3σ)
    pub cpl: f64,

    /// 3 × Cpk
    pub sigma_level: f64,

    /// Predicted defects per million, both tails
    pub defect_rate_ppm: f64,

    /// Predicted defects per million above USL
    pub ppm_above_usl: f64,

    /// Predicted defects per million below LSL
    pub ppm_below_lsl: f64,

    pub sample_count: usize,
}

impl CapabilityResult {
    /// Rating of this result's Cpk
    pub fn rating(&self) -> CapabilityRating {
        CapabilityRating::from_cpk(self.cpk)
    }

    /// Taguchi capability index against a target value
    ///
    /// Cpm = Cp / sqrt(1 + ((μ - T) / σ)²)
    pub fn cpm(&self, target: f64) -> f64 {
        let offset = (self.mean - target) / self.std_dev;
        self.cp / (1.0 + offset * offset).sqrt()
    }

    /// Predicted yield as a percentage
    pub fn yield_percent(&self) -> f64 {
        100.0 - self.defect_rate_ppm / 10_000.0
    }
}

/// Capability rating derived from Cpk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityRating {
    /// Cpk ≥ 1.67
    Excellent,
    /// 1.33 ≤ Cpk < 1.67
    Adequate,
    /// 1.0 ≤ Cpk < 1.33
    MarginallyAcceptable,
    /// Cpk < 1.0
    Inadequate,
}

impl CapabilityRating {
    pub fn from_cpk(cpk: f64) -> Self {
        if cpk >= 1.67 {
            CapabilityRating::Excellent
        } else if cpk >= 1.33 {
            CapabilityRating::Adequate
        } else if cpk >= 1.0 {
            CapabilityRating::MarginallyAcceptable
        } else {
            CapabilityRating::Inadequate
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CapabilityRating::Excellent => "Excellent",
            CapabilityRating::Adequate => "Adequate",
            CapabilityRating::MarginallyAcceptable => "Marginally Acceptable",
            CapabilityRating::Inadequate => "Inadequate",
        }
    }

    /// Whether the process can be released without further action
    pub fn is_capable(&self) -> bool {
        matches!(
            self,
            CapabilityRating::Excellent | CapabilityRating::Adequate
        )
    }
}

impl std::fmt::Display for CapabilityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Compute capability indices for a measurement series
///
/// # Errors
///
/// - `MissingSpecLimits` if either limit is absent
/// - `InvalidInput` for non-finite limits or values, or `usl <= lsl`
/// - `InsufficientData` for an empty series
/// - `DegenerateDistribution` when every value is identical
pub fn compute_capability(
    values: &[f64],
    usl: Option<f64>,
    lsl: Option<f64>,
) -> Result<CapabilityResult, SpcError> {
    let usl = usl.ok_or(SpcError::MissingSpecLimits { missing: "USL" })?;
    let lsl = lsl.ok_or(SpcError::MissingSpecLimits { missing: "LSL" })?;

    if !usl.is_finite() || !lsl.is_finite() {
        return Err(SpcError::invalid(format!(
            "specification limits must be finite (USL = {}, LSL = {})",
            usl, lsl
        )));
    }
    if usl <= lsl {
        return Err(SpcError::invalid(format!(
            "USL ({}) must be greater than LSL ({})",
            usl, lsl
        )));
    }
    if values.is_empty() {
        return Err(SpcError::InsufficientData {
            operation: "capability",
        });
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(SpcError::invalid(format!(
            "measurement values must be finite, got {}",
            v
        )));
    }

    // Identical readings are degenerate even when the float sum leaves residual σ
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min == max {
        return Err(SpcError::DegenerateDistribution {
            value: values[0],
            count: values.len(),
        });
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if !mean.is_finite() || !std_dev.is_finite() {
        return Err(SpcError::invalid(format!(
            "mean or standard deviation of {} values overflows (mean = {}, std dev = {})",
            values.len(),
            mean,
            std_dev
        )));
    }
    if std_dev == 0.0 {
        return Err(SpcError::DegenerateDistribution {
            value: mean,
            count: values.len(),
        });
    }

    let tolerance = usl - lsl;
    let cp = tolerance / (6.0 * std_dev);
    let cpu = (usl - mean) / (3.0 * std_dev);
    let cpl = (mean - lsl) / (3.0 * std_dev);
    let cpk = cpu.min(cpl);

    // Normal tails outside the specification window
    let z_upper = (usl - mean) / std_dev;
    let z_lower = (lsl - mean) / std_dev;
    let ppm_above_usl = (1.0 - normal_cdf(z_upper)) * 1e6;
    let ppm_below_lsl = normal_cdf(z_lower) * 1e6;

    if ![cp, cpk, ppm_above_usl, ppm_below_lsl]
        .iter()
        .all(|x| x.is_finite())
    {
        return Err(SpcError::invalid(format!(
            "capability indices are not finite (Cp = {}, Cpk = {})",
            cp, cpk
        )));
    }

    tracing::debug!(mean, std_dev, cp, cpk, "computed capability");

    Ok(CapabilityResult {
        mean,
        std_dev,
        cp,
        cpk,
        pp: cp,
        ppk: cpk,
        cpu,
        cpl,
        sigma_level: cpk * 3.0,
        defect_rate_ppm: ppm_above_usl + ppm_below_lsl,
        ppm_above_usl,
        ppm_below_lsl,
        sample_count: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_process() {
        let values = [24.9, 25.0, 25.1, 24.95, 25.05];
        let result = compute_capability(&values, Some(25.2), Some(24.8)).unwrap();

        assert!((result.mean - 25.0).abs() < 1e-9);
        // population variance = 0.025 / 5
        assert!((result.std_dev - 0.005_f64.sqrt()).abs() < 1e-9);
        assert!((result.cp - result.cpk).abs() < 1e-9);
        assert!((result.cp - 0.4 / (6.0 * 0.005_f64.sqrt())).abs() < 1e-9);
        assert_eq!(result.pp, result.cp);
        assert_eq!(result.ppk, result.cpk);
        assert!((result.sigma_level - 3.0 * result.cpk).abs() < 1e-12);
        assert_eq!(result.sample_count, 5);
        assert_eq!(result.rating(), CapabilityRating::Inadequate);
    }

    #[test]
    fn test_off_center_process_uses_nearest_limit() {
        let values = [10.0, 11.0, 12.0];
        let result = compute_capability(&values, Some(14.0), Some(5.0)).unwrap();
        // mean = 11, closer to USL
        assert!(result.cpu < result.cpl);
        assert_eq!(result.cpk, result.cpu);
        assert!(result.ppm_above_usl > result.ppm_below_lsl);
    }

    #[test]
    fn test_defect_rate_at_three_sigma() {
        // two values at ±1 give mean 0 and σ = 1
        let values = [-1.0, 1.0];
        let result = compute_capability(&values, Some(3.0), Some(-3.0)).unwrap();
        assert!((result.std_dev - 1.0).abs() < 1e-12);
        assert!((result.cp - 1.0).abs() < 1e-12);
        // 2 × (1 - Φ(3)) ≈ 2699.8 PPM
        assert!((result.defect_rate_ppm - 2699.8).abs() < 1.0);
        assert!((result.ppm_above_usl - result.ppm_below_lsl).abs() < 1e-6);
        assert_eq!(result.rating(), CapabilityRating::MarginallyAcceptable);
    }

    #[test]
    fn test_degenerate_distribution() {
        let err = compute_capability(&[10.0, 10.0, 10.0], Some(20.0), Some(0.0)).unwrap_err();
        assert_eq!(
            err,
            SpcError::DegenerateDistribution {
                value: 10.0,
                count: 3
            }
        );
    }

    #[test]
    fn test_identical_inexact_values_are_degenerate() {
        // 0.1 has no exact binary form; the float mean drifts and σ is ~1e-17
        let err = compute_capability(&[0.1, 0.1, 0.1], Some(1.0), Some(0.0)).unwrap_err();
        assert_eq!(
            err,
            SpcError::DegenerateDistribution {
                value: 0.1,
                count: 3
            }
        );

        let err = compute_capability(&[25.01; 5], Some(26.0), Some(24.0)).unwrap_err();
        assert_eq!(
            err,
            SpcError::DegenerateDistribution {
                value: 25.01,
                count: 5
            }
        );
    }

    #[test]
    fn test_overflowing_mean_rejected() {
        let err = compute_capability(&[1e308, 1e308, 9e307], Some(f64::MAX), Some(0.0))
            .unwrap_err();
        assert!(matches!(err, SpcError::InvalidInput(_)));

        // Finite mean, overflowing variance
        let err = compute_capability(&[f64::MAX, -f64::MAX], Some(1.0), Some(0.0)).unwrap_err();
        assert!(matches!(err, SpcError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_limits() {
        assert_eq!(
            compute_capability(&[1.0, 2.0], None, Some(0.0)).unwrap_err(),
            SpcError::MissingSpecLimits { missing: "USL" }
        );
        assert_eq!(
            compute_capability(&[1.0, 2.0], Some(3.0), None).unwrap_err(),
            SpcError::MissingSpecLimits { missing: "LSL" }
        );
    }

    #[test]
    fn test_limits_checked_before_data() {
        assert!(matches!(
            compute_capability(&[], None, None),
            Err(SpcError::MissingSpecLimits { .. })
        ));
        assert!(matches!(
            compute_capability(&[], Some(1.0), Some(0.0)),
            Err(SpcError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_inverted_limits_rejected() {
        assert!(matches!(
            compute_capability(&[1.0, 2.0], Some(0.0), Some(3.0)),
            Err(SpcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(CapabilityRating::from_cpk(1.67), CapabilityRating::Excellent);
        assert_eq!(CapabilityRating::from_cpk(1.669), CapabilityRating::Adequate);
        assert_eq!(CapabilityRating::from_cpk(1.33), CapabilityRating::Adequate);
        assert_eq!(
            CapabilityRating::from_cpk(1.0),
            CapabilityRating::MarginallyAcceptable
        );
        assert_eq!(CapabilityRating::from_cpk(0.99), CapabilityRating::Inadequate);
        assert_eq!(CapabilityRating::from_cpk(-0.5), CapabilityRating::Inadequate);
        assert_eq!(
            CapabilityRating::MarginallyAcceptable.to_string(),
            "Marginally Acceptable"
        );
    }

    #[test]
    fn test_cpm_penalizes_off_target() {
        let values = [-1.0, 1.0];
        let result = compute_capability(&values, Some(3.0), Some(-3.0)).unwrap();
        assert!((result.cpm(0.0) - result.cp).abs() < 1e-12);
        // one sigma off target: Cp / sqrt(2)
        assert!((result.cpm(1.0) - result.cp / 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
