//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::{style, StyledObject};
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::capability::CapabilityRating;
use crate::core::config::{Config, EngineSettings};
use crate::core::msa::GageRrCategory;

/// Load layered config and resolve it into engine settings
pub fn load_settings(global: &GlobalOpts) -> Result<EngineSettings> {
    let config = Config::load(global.config.as_deref()).into_diagnostic()?;
    let settings = EngineSettings::from_config(&config);
    tracing::debug!(?settings, "resolved engine settings");
    Ok(settings)
}

/// Print a status line to stderr unless `--quiet`
pub fn status(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        eprintln!("{}", message);
    }
}

/// Round a value to a precision that suits the reference magnitude
///
/// Uses two more decimals than the reference needs, clamped to 2..=6.
/// `reference` is typically the tolerance band or the spread of the data.
pub fn smart_round(value: f64, reference: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let reference = reference.abs();
    let decimals = if reference > 0.0 && reference.is_finite() {
        (2 - reference.log10().floor() as i32).clamp(2, 6) as usize
    } else {
        4
    };
    format!("{:.*}", decimals, value)
}

/// Format an index (Cp, Cpk, ...) to three decimals
pub fn format_index(value: f64) -> String {
    if value.is_finite() {
        format!("{:.3}", value)
    } else {
        "-".to_string()
    }
}

/// Style a capability rating by severity
pub fn style_rating(rating: CapabilityRating) -> StyledObject<&'static str> {
    match rating {
        CapabilityRating::Excellent => style(rating.label()).green().bold(),
        CapabilityRating::Adequate => style(rating.label()).green(),
        CapabilityRating::MarginallyAcceptable => style(rating.label()).yellow(),
        CapabilityRating::Inadequate => style(rating.label()).red().bold(),
    }
}

/// Style a Gage R&R category by severity
pub fn style_category(category: GageRrCategory) -> StyledObject<&'static str> {
    match category {
        GageRrCategory::Excellent => style(category.label()).green().bold(),
        GageRrCategory::Acceptable => style(category.label()).yellow(),
        GageRrCategory::Unacceptable => style(category.label()).red().bold(),
    }
}
