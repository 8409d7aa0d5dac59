//! Core module - the SPC computation engine
//!
//! Everything here is a pure function over in-memory data: no I/O beyond
//! config loading, no shared state, no caching between calls.

pub mod analysis;
pub mod capability;
pub mod config;
pub mod control_limits;
pub mod error;
pub mod factors;
pub mod measurement;
pub mod msa;
pub mod normal;
pub mod subgroup;

pub use analysis::{analyze_characteristic, most_recent, CapabilityReport, CharacteristicAnalysis};
pub use capability::{compute_capability, CapabilityRating, CapabilityResult};
pub use config::{AnalysisConfig, Config, ConfigError, EngineSettings};
pub use control_limits::{
    compute_chart, compute_individuals, compute_limits, compute_xbar_s, ChartOptions, ChartPoint,
    ChartSeries, ControlLimits, ControlLimitsResult, LimitsWarning, SpreadStatistic,
};
pub use error::SpcError;
pub use factors::{ChartFactors, FactorLookup};
pub use measurement::{
    values_of, ChartType, Characteristic, Measurement, SpecLimits, DEFAULT_SAMPLE_SIZE,
};
pub use msa::{classify_gage_rr, ndc_adequate, GageRrCategory, StudyType};
pub use normal::{erf, normal_cdf};
pub use subgroup::{group, Subgroup};
