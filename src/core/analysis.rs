//! Characteristic analysis
//!
//! Runs the configured control chart and the capability study for one
//! characteristic. Each part succeeds or fails on its own, so a missing
//! specification window does not hide a valid control chart.

use miette::Diagnostic;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::capability::{compute_capability, CapabilityRating, CapabilityResult};
use crate::core::config::EngineSettings;
use crate::core::control_limits::{compute_chart, ChartOptions, ControlLimitsResult};
use crate::core::error::SpcError;
use crate::core::measurement::{values_of, ChartType, Characteristic, Measurement};

/// Capability result with its rating and optional Taguchi index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityReport {
    #[serde(flatten)]
    pub result: CapabilityResult,
    pub rating: CapabilityRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
}

/// Full analysis of one characteristic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicAnalysis {
    pub characteristic: String,
    pub chart_type: ChartType,
    pub sample_size: usize,
    /// Measurements analysed (after the page cap)
    pub measurement_count: usize,
    /// Measurements dropped by the page cap
    #[serde(skip_serializing_if = "is_zero")]
    pub dropped_count: usize,
    #[serde(serialize_with = "serialize_outcome")]
    pub limits: Result<ControlLimitsResult, SpcError>,
    #[serde(serialize_with = "serialize_outcome")]
    pub capability: Result<CapabilityReport, SpcError>,
}

impl CharacteristicAnalysis {
    /// In statistical control and rated capable
    pub fn is_acceptable(&self) -> bool {
        let in_control = self.limits.as_ref().is_ok_and(|l| l.is_in_control());
        let capable = self
            .capability
            .as_ref()
            .is_ok_and(|c| c.rating.is_capable());
        in_control && capable
    }
}

/// Keep the `max` most recent measurements, in chronological order
pub fn most_recent(measurements: &[Measurement], max: usize) -> Vec<Measurement> {
    let mut ordered = measurements.to_vec();
    ordered.sort_by_key(|m| m.timestamp);
    let skip = ordered.len().saturating_sub(max);
    ordered.split_off(skip)
}

/// Analyse a characteristic against its measurements
///
/// # Errors
///
/// Only the characteristic definition itself can fail the whole analysis
/// (e.g., USL ≤ LSL). Chart and capability failures are reported per part.
pub fn analyze_characteristic(
    characteristic: &Characteristic,
    measurements: &[Measurement],
    settings: &EngineSettings,
) -> Result<CharacteristicAnalysis, SpcError> {
    characteristic.validate()?;

    // Individuals charts plot one reading per point
    let sample_size = if characteristic.chart_type == ChartType::IndividualMr {
        1
    } else {
        characteristic.sample_size_or(settings.default_sample_size)
    };
    let window = most_recent(measurements, settings.max_measurements);
    let dropped_count = measurements.len() - window.len();
    if dropped_count > 0 {
        tracing::info!(
            dropped = dropped_count,
            kept = window.len(),
            "measurement window capped to most recent records"
        );
    }

    let options = ChartOptions {
        strict_factors: settings.strict_factors,
    };
    let limits = compute_chart(characteristic.chart_type, &window, sample_size, &options);

    let values = values_of(&window);
    let capability = compute_capability(
        &values,
        characteristic.limits.usl,
        characteristic.limits.lsl,
    )
    .map(|result| CapabilityReport {
        rating: result.rating(),
        cpm: characteristic.limits.target.map(|t| result.cpm(t)),
        result,
    });

    Ok(CharacteristicAnalysis {
        characteristic: characteristic.label(),
        chart_type: characteristic.chart_type,
        sample_size,
        measurement_count: window.len(),
        dropped_count,
        limits,
        capability,
    })
}

#[derive(Serialize)]
struct ErrorSummary {
    code: Option<String>,
    message: String,
}

fn serialize_outcome<T, S>(outcome: &Result<T, SpcError>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match outcome {
        Ok(value) => value.serialize(serializer),
        Err(err) => {
            let summary = ErrorSummary {
                code: err.code().map(|c| c.to_string()),
                message: err.to_string(),
            };
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("error", &summary)?;
            map.end()
        }
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
