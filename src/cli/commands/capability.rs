//! `spc capability` command - process capability against a specification window

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_index, load_settings, smart_round, status, style_rating};
use crate::cli::output::{print_csv, print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analysis::CapabilityReport;
use crate::core::capability::compute_capability;
use crate::core::measurement::{values_of, SpecLimits};

#[derive(clap::Args, Debug)]
pub struct CapabilityArgs {
    /// Measurement CSV or characteristic YAML file
    pub input: PathBuf,

    /// Upper specification limit (overrides the characteristic's)
    #[arg(long, allow_negative_numbers = true)]
    pub usl: Option<f64>,

    /// Lower specification limit (overrides the characteristic's)
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: Option<f64>,

    /// Target value, enables Cpm
    #[arg(long, allow_negative_numbers = true)]
    pub target: Option<f64>,
}

pub fn run(args: CapabilityArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global)?;
    let mut loaded = super::load_input(&args.input)?;
    loaded.cap(settings.max_measurements, global);

    let file_limits = loaded
        .characteristic
        .as_ref()
        .map(|c| c.limits)
        .unwrap_or_default();
    let limits = SpecLimits {
        usl: args.usl.or(file_limits.usl),
        lsl: args.lsl.or(file_limits.lsl),
        target: args.target.or(file_limits.target),
    };

    status(
        global,
        format!(
            "{} Computing capability from {} measurement(s)...",
            style("⚙").cyan(),
            loaded.measurements.len()
        ),
    );

    let values = values_of(&loaded.measurements);
    let result = compute_capability(&values, limits.usl, limits.lsl)?;
    let report = CapabilityReport {
        rating: result.rating(),
        cpm: limits.target.map(|t| result.cpm(t)),
        result,
    };

    let format = resolve(global.format);
    if print_structured(&report, format)? {
        return Ok(());
    }
    match format {
        OutputFormat::Csv => print_csv([CapabilityCsvRow::from(&report)]),
        _ => {
            print_capability(&report, &limits);
            Ok(())
        }
    }
}

/// Capability report flattened to one CSV record
#[derive(Debug, Serialize)]
pub(crate) struct CapabilityCsvRow {
    mean: f64,
    std_dev: f64,
    cp: f64,
    cpk: f64,
    pp: f64,
    ppk: f64,
    cpm: Option<f64>,
    sigma_level: f64,
    defect_rate_ppm: f64,
    sample_count: usize,
    rating: &'static str,
}

impl From<&CapabilityReport> for CapabilityCsvRow {
    fn from(report: &CapabilityReport) -> Self {
        let r = &report.result;
        Self {
            mean: r.mean,
            std_dev: r.std_dev,
            cp: r.cp,
            cpk: r.cpk,
            pp: r.pp,
            ppk: r.ppk,
            cpm: report.cpm,
            sigma_level: r.sigma_level,
            defect_rate_ppm: r.defect_rate_ppm,
            sample_count: r.sample_count,
            rating: report.rating.label(),
        }
    }
}

/// Styled terminal report for a capability result
pub(crate) fn print_capability(report: &CapabilityReport, limits: &SpecLimits) {
    let result = &report.result;
    let reference = limits.tolerance().unwrap_or(result.std_dev).max(f64::EPSILON);

    println!();
    println!("   {}", style("Process Capability:").bold());
    println!(
        "     LSL: {}   USL: {}{}",
        limits
            .lsl
            .map(|v| smart_round(v, reference))
            .unwrap_or_else(|| "-".to_string()),
        limits
            .usl
            .map(|v| smart_round(v, reference))
            .unwrap_or_else(|| "-".to_string()),
        limits
            .target
            .map(|t| format!("   Target: {}", smart_round(t, reference)))
            .unwrap_or_default()
    );
    println!(
        "     Mean: {}   σ: {}   n = {}",
        smart_round(result.mean, reference),
        smart_round(result.std_dev, reference),
        result.sample_count
    );
    println!(
        "     Cp: {}   Cpk: {}   (Cpu {}, Cpl {})",
        style(format_index(result.cp)).cyan(),
        style(format_index(result.cpk)).cyan(),
        format_index(result.cpu),
        format_index(result.cpl)
    );
    println!(
        "     Pp: {}   Ppk: {}",
        format_index(result.pp),
        format_index(result.ppk)
    );
    if let Some(cpm) = report.cpm {
        println!("     Cpm: {}", format_index(cpm));
    }
    println!(
        "     Sigma level: {:.2}   Defects: {:.1} PPM   Yield: {:.4}%",
        result.sigma_level,
        result.defect_rate_ppm,
        result.yield_percent()
    );
    println!();
    println!("   Rating: {}", style_rating(report.rating));
}
