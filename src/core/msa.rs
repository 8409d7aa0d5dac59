//! Measurement system analysis classification
//!
//! Classifies a Gage R&R result expressed as %GRR (percent of total
//! variation). Computing %GRR itself is left to the study tooling.

use serde::{Deserialize, Serialize};

use crate::core::error::SpcError;

/// %GRR below which a gauge is excellent
pub const GRR_EXCELLENT_BELOW: f64 = 10.0;

/// %GRR below which a gauge is acceptable
pub const GRR_ACCEPTABLE_BELOW: f64 = 30.0;

/// Minimum number of distinct categories for an adequate gauge
pub const MIN_DISTINCT_CATEGORIES: u32 = 5;

/// Gage R&R category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GageRrCategory {
    /// %GRR < 10
    Excellent,
    /// 10 ≤ %GRR < 30
    Acceptable,
    /// %GRR ≥ 30
    Unacceptable,
}

impl GageRrCategory {
    pub fn label(&self) -> &'static str {
        match self {
            GageRrCategory::Excellent => "Excellent",
            GageRrCategory::Acceptable => "Acceptable",
            GageRrCategory::Unacceptable => "Unacceptable",
        }
    }
}

impl std::fmt::Display for GageRrCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a %GRR value
///
/// # Errors
///
/// `InvalidInput` for NaN or negative percentages.
pub fn classify_gage_rr(percent: f64) -> Result<GageRrCategory, SpcError> {
    if percent.is_nan() || percent < 0.0 {
        return Err(SpcError::invalid(format!(
            "%GRR must be a non-negative number, got {}",
            percent
        )));
    }

    Ok(if percent < GRR_EXCELLENT_BELOW {
        GageRrCategory::Excellent
    } else if percent < GRR_ACCEPTABLE_BELOW {
        GageRrCategory::Acceptable
    } else {
        GageRrCategory::Unacceptable
    })
}

/// Whether a study's number of distinct categories is adequate
pub fn ndc_adequate(ndc: u32) -> bool {
    ndc >= MIN_DISTINCT_CATEGORIES
}

/// MSA study kinds recorded by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudyType {
    #[default]
    #[serde(rename = "GageR&R")]
    GageRr,
    Bias,
    Linearity,
    Stability,
}

impl StudyType {
    /// Whether the %GRR classification applies to this study kind
    pub fn uses_grr(&self) -> bool {
        matches!(self, StudyType::GageRr)
    }
}

impl std::fmt::Display for StudyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudyType::GageRr => write!(f, "GageR&R"),
            StudyType::Bias => write!(f, "Bias"),
            StudyType::Linearity => write!(f, "Linearity"),
            StudyType::Stability => write!(f, "Stability"),
        }
    }
}

impl std::str::FromStr for StudyType {
    type Err = SpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gager&r" | "gagerr" | "grr" => Ok(StudyType::GageRr),
            "bias" => Ok(StudyType::Bias),
            "linearity" => Ok(StudyType::Linearity),
            "stability" => Ok(StudyType::Stability),
            _ => Err(SpcError::invalid(format!(
                "unknown study type '{}' (expected GageR&R, Bias, Linearity or Stability)",
                s
            ))),
        }
    }
}
