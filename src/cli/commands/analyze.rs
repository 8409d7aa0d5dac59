//! `spc analyze` command - control chart and capability for a characteristic

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{load_settings, status};
use crate::cli::output::{print_csv, print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analysis::analyze_characteristic;
use crate::core::measurement::ChartType;
use crate::input;

use super::capability::print_capability;
use super::limits::{chart_rows, print_limits};

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Characteristic YAML file
    pub characteristic: PathBuf,

    /// Measurement CSV (defaults to the characteristic's embedded measurements)
    #[arg(long, short = 'm')]
    pub measurements: Option<PathBuf>,

    /// Override the characteristic's subgroup size
    #[arg(long, short = 'n')]
    pub sample_size: Option<usize>,

    /// Override the characteristic's chart type
    #[arg(long, short = 'c')]
    pub chart: Option<ChartType>,

    /// Keep only the N most recent measurements
    #[arg(long)]
    pub max_measurements: Option<usize>,

    /// Exit with an error unless the process is in control and capable
    #[arg(long)]
    pub require_acceptable: bool,
}

pub fn run(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let mut settings = load_settings(global)?;
    if let Some(max) = args.max_measurements {
        settings.max_measurements = max;
    }

    let mut characteristic = input::load_characteristic(&args.characteristic)?;
    if let Some(size) = args.sample_size {
        characteristic.sample_size = Some(size);
    }
    if let Some(chart) = args.chart {
        characteristic.chart_type = chart;
    }

    let measurements = match &args.measurements {
        Some(path) => input::load_measurements(path)?,
        None => std::mem::take(&mut characteristic.measurements),
    };

    status(
        global,
        format!(
            "{} Analyzing {} with {} measurement(s)...",
            style("⚙").cyan(),
            style(characteristic.label()).cyan(),
            measurements.len()
        ),
    );

    let analysis = analyze_characteristic(&characteristic, &measurements, &settings)?;

    let format = resolve(global.format);
    if !print_structured(&analysis, format)? {
        match format {
            OutputFormat::Csv => match &analysis.limits {
                Ok(limits) => print_csv(chart_rows(limits))?,
                Err(e) => return Err(e.clone().into()),
            },
            _ => {
                if analysis.dropped_count > 0 {
                    status(
                        global,
                        format!(
                            "{} Using the {} most recent measurements ({} older dropped)",
                            style("!").yellow(),
                            analysis.measurement_count,
                            analysis.dropped_count
                        ),
                    );
                }

                match &analysis.limits {
                    Ok(limits) => print_limits(limits, Some(&analysis.characteristic), false),
                    Err(e) => println!("{} Control limits: {}", style("✗").red(), e),
                }
                match &analysis.capability {
                    Ok(report) => print_capability(report, &characteristic.limits),
                    Err(e) => {
                        println!();
                        println!("{} Capability: {}", style("✗").red(), e);
                    }
                }
            }
        }
    }

    if args.require_acceptable && !analysis.is_acceptable() {
        return Err(miette::miette!(
            code = "spc::not_acceptable",
            "{} is not in statistical control with an adequate Cpk",
            analysis.characteristic
        ));
    }
    Ok(())
}
