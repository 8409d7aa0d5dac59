//! CLI command implementations

pub mod analyze;
pub mod capability;
pub mod completions;
pub mod config;
pub mod gage;
pub mod limits;

use miette::Result;
use std::path::Path;

use console::style;

use crate::cli::helpers::status;
use crate::cli::GlobalOpts;
use crate::core::analysis::most_recent;
use crate::core::measurement::{Characteristic, Measurement};
use crate::input::{self, InputKind};

/// Measurements loaded from a command's input file
pub(crate) struct LoadedInput {
    /// Present when the input was a characteristic file
    pub characteristic: Option<Characteristic>,
    pub measurements: Vec<Measurement>,
}

impl LoadedInput {
    /// Keep only the `max` most recent measurements, as `analyze` does
    pub fn cap(&mut self, max: usize, global: &GlobalOpts) {
        let total = self.measurements.len();
        self.measurements = most_recent(&self.measurements, max);
        let dropped = total - self.measurements.len();
        if dropped > 0 {
            tracing::info!(dropped, kept = self.measurements.len(), "applied measurement cap");
            status(
                global,
                format!(
                    "{} Using the {} most recent measurements ({} older dropped)",
                    style("!").yellow(),
                    self.measurements.len(),
                    dropped
                ),
            );
        }
    }
}

/// Load a measurement CSV or a characteristic YAML
pub(crate) fn load_input(path: &Path) -> Result<LoadedInput> {
    let loaded = match InputKind::of(path)? {
        InputKind::Csv => LoadedInput {
            characteristic: None,
            measurements: input::load_measurements(path)?,
        },
        InputKind::Characteristic => {
            let mut characteristic = input::load_characteristic(path)?;
            let measurements = std::mem::take(&mut characteristic.measurements);
            LoadedInput {
                characteristic: Some(characteristic),
                measurements,
            }
        }
    };
    tracing::info!(
        path = %path.display(),
        count = loaded.measurements.len(),
        "loaded measurements"
    );
    Ok(loaded)
}
