//! Engine error taxonomy
//!
//! Every engine operation either returns a complete result or one of these
//! errors. The computations are deterministic, so retrying with the same input
//! gives the same failure.

use miette::Diagnostic;
use thiserror::Error;

use crate::core::measurement::ChartType;

/// Errors raised by the SPC computation engine
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SpcError {
    #[error("Cannot compute {operation}: no measurements supplied")]
    #[diagnostic(
        code(spc::insufficient_data),
        help("Record at least one measurement for this characteristic")
    )]
    InsufficientData { operation: &'static str },

    #[error("Cannot compute control limits: {found} subgroup(s) found, at least 2 required")]
    #[diagnostic(
        code(spc::insufficient_subgroups),
        help("Control limits are meaningless with a single point; collect more subgroups")
    )]
    InsufficientSubgroups { found: usize },

    #[error("Cannot compute capability: {missing} is not defined")]
    #[diagnostic(
        code(spc::missing_spec_limits),
        help("Set both `usl` and `lsl` on the characteristic")
    )]
    MissingSpecLimits { missing: &'static str },

    #[error("Cannot compute capability: all {count} values equal {value}, standard deviation is zero")]
    #[diagnostic(
        code(spc::degenerate_distribution),
        help("Capability ratios are undefined without variation; check the gauge resolution")
    )]
    DegenerateDistribution { value: f64, count: usize },

    #[error("Invalid input: {0}")]
    #[diagnostic(code(spc::invalid_input))]
    InvalidInput(String),

    #[error("Chart type '{0}' needs attribute (count) data and cannot be built from measurements")]
    #[diagnostic(
        code(spc::unsupported_chart),
        help("Use one of the variables charts: XbarR, XbarS, I-MR")
    )]
    UnsupportedChart(ChartType),
}

impl SpcError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SpcError::InvalidInput(message.into())
    }
}
