//! Measurement records and characteristic specifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::SpcError;

/// Default subgroup size for a characteristic
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// A single dimensional measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measured value
    pub value: f64,

    /// When the measurement was taken (ordering key)
    pub timestamp: DateTime<Utc>,

    /// Explicit subgroup assignment
    #[serde(
        default,
        alias = "subgroup",
        skip_serializing_if = "Option::is_none"
    )]
    pub subgroup_number: Option<u32>,

    /// Record identifier in the measurement store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Measurement {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            subgroup_number: None,
            id: None,
        }
    }

    pub fn with_subgroup(mut self, subgroup_number: u32) -> Self {
        self.subgroup_number = Some(subgroup_number);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Extract the raw values of a measurement series, in order
pub fn values_of(measurements: &[Measurement]) -> Vec<f64> {
    measurements.iter().map(|m| m.value).collect()
}

/// Control chart type configured for a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChartType {
    /// X-bar and Range
    #[default]
    #[serde(rename = "XbarR")]
    XbarR,
    /// X-bar and Standard Deviation
    #[serde(rename = "XbarS")]
    XbarS,
    /// Individuals and Moving Range
    #[serde(rename = "I-MR")]
    IndividualMr,
    /// Proportion nonconforming
    #[serde(rename = "p")]
    P,
    /// Number nonconforming
    #[serde(rename = "np")]
    Np,
    /// Defect count
    #[serde(rename = "c")]
    C,
    /// Defects per unit
    #[serde(rename = "u")]
    U,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        ChartType::XbarR,
        ChartType::XbarS,
        ChartType::IndividualMr,
        ChartType::P,
        ChartType::Np,
        ChartType::C,
        ChartType::U,
    ];

    /// Whether the chart plots continuous measurements (as opposed to counts)
    pub fn is_variables(&self) -> bool {
        matches!(
            self,
            ChartType::XbarR | ChartType::XbarS | ChartType::IndividualMr
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::XbarR => "XbarR",
            ChartType::XbarS => "XbarS",
            ChartType::IndividualMr => "I-MR",
            ChartType::P => "p",
            ChartType::Np => "np",
            ChartType::C => "c",
            ChartType::U => "u",
        }
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChartType {
    type Err = SpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "xbarr" => Ok(ChartType::XbarR),
            "xbars" => Ok(ChartType::XbarS),
            "imr" => Ok(ChartType::IndividualMr),
            "p" => Ok(ChartType::P),
            "np" => Ok(ChartType::Np),
            "c" => Ok(ChartType::C),
            "u" => Ok(ChartType::U),
            _ => Err(SpcError::invalid(format!(
                "unknown chart type '{}' (expected one of XbarR, XbarS, I-MR, p, np, c, u)",
                s
            ))),
        }
    }
}

/// Specification window for a characteristic
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    /// Upper specification limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usl: Option<f64>,

    /// Lower specification limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsl: Option<f64>,

    /// Nominal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
}

impl SpecLimits {
    pub fn new(usl: Option<f64>, lsl: Option<f64>) -> Self {
        Self {
            usl,
            lsl,
            target: None,
        }
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    /// Check that USL > LSL when both are present
    pub fn validate(&self) -> Result<(), SpcError> {
        for (name, limit) in [("USL", self.usl), ("LSL", self.lsl), ("target", self.target)] {
            if let Some(v) = limit {
                if !v.is_finite() {
                    return Err(SpcError::invalid(format!("{} must be finite, got {}", name, v)));
                }
            }
        }
        if let (Some(usl), Some(lsl)) = (self.usl, self.lsl) {
            if usl <= lsl {
                return Err(SpcError::invalid(format!(
                    "USL ({}) must be greater than LSL ({})",
                    usl, lsl
                )));
            }
        }
        Ok(())
    }

    /// Distance between the limits, when both are present
    pub fn tolerance(&self) -> Option<f64> {
        match (self.usl, self.lsl) {
            (Some(usl), Some(lsl)) => Some(usl - lsl),
            _ => None,
        }
    }
}

/// A monitored characteristic as provided by the characteristic registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Characteristic {
    /// Registry code (e.g., "CHR-001")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,

    /// Measurement unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Specification limits
    #[serde(flatten)]
    pub limits: SpecLimits,

    /// Subgroup size; the configured default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,

    /// Configured control chart
    #[serde(default)]
    pub chart_type: ChartType,

    /// Measurements embedded in the characteristic file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<Measurement>,
}

impl Characteristic {
    pub fn new(limits: SpecLimits) -> Self {
        Self {
            code: None,
            name: None,
            part_code: None,
            process_name: None,
            unit: None,
            limits,
            sample_size: None,
            chart_type: ChartType::default(),
            measurements: Vec::new(),
        }
    }

    /// Label for reports: code and name when available
    pub fn label(&self) -> String {
        match (&self.code, &self.name) {
            (Some(code), Some(name)) => format!("{} ({})", code, name),
            (Some(code), None) => code.clone(),
            (None, Some(name)) => name.clone(),
            (None, None) => "characteristic".to_string(),
        }
    }

    /// Subgroup size, or `default` when the characteristic leaves it unset
    pub fn sample_size_or(&self, default: usize) -> usize {
        self.sample_size.unwrap_or(default)
    }

    /// Check the registry invariants
    pub fn validate(&self) -> Result<(), SpcError> {
        self.limits.validate()?;
        if let Some(size) = self.sample_size {
            if size < 2 && self.chart_type != ChartType::IndividualMr {
                return Err(SpcError::invalid(format!(
                    "sample_size must be at least 2, got {}",
                    size
                )));
            }
        }
        Ok(())
    }
}
