//! `spc limits` command - control limits for a measurement series

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::{load_settings, smart_round, status};
use crate::cli::output::{print_csv, print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::control_limits::{compute_chart, ChartOptions, ChartSeries, ControlLimitsResult};
use crate::core::measurement::ChartType;

#[derive(clap::Args, Debug)]
pub struct LimitsArgs {
    /// Measurement CSV or characteristic YAML file
    pub input: PathBuf,

    /// Subgroup size (defaults to the characteristic's, then the config's)
    #[arg(long, short = 'n')]
    pub sample_size: Option<usize>,

    /// Chart type: XbarR, XbarS or I-MR
    #[arg(long, short = 'c')]
    pub chart: Option<ChartType>,

    /// Reject subgroup sizes without tabulated chart factors
    #[arg(long)]
    pub strict_factors: bool,

    /// List every plotted point, not only those beyond the limits
    #[arg(long)]
    pub points: bool,
}

pub fn run(args: LimitsArgs, global: &GlobalOpts) -> Result<()> {
    let settings = load_settings(global)?;
    let mut loaded = super::load_input(&args.input)?;
    loaded.cap(settings.max_measurements, global);

    let chr = loaded.characteristic.as_ref();
    let sample_size = args
        .sample_size
        .or_else(|| chr.and_then(|c| c.sample_size))
        .unwrap_or(settings.default_sample_size);
    let chart_type = args
        .chart
        .or_else(|| chr.map(|c| c.chart_type))
        .unwrap_or_default();
    let options = ChartOptions {
        strict_factors: args.strict_factors || settings.strict_factors,
    };

    status(
        global,
        format!(
            "{} Computing {} limits from {} measurement(s)...",
            style("⚙").cyan(),
            style(chart_type).cyan(),
            loaded.measurements.len()
        ),
    );

    let result = compute_chart(chart_type, &loaded.measurements, sample_size, &options)?;

    let format = resolve(global.format);
    if print_structured(&result, format)? {
        return Ok(());
    }
    match format {
        OutputFormat::Csv => print_csv(chart_rows(&result)),
        _ => {
            let label = chr.map(|c| c.label());
            print_limits(&result, label.as_deref(), args.points);
            Ok(())
        }
    }
}

/// One plotted point, flattened for CSV output
#[derive(Debug, Serialize)]
pub(crate) struct ChartCsvRow {
    chart: &'static str,
    index: usize,
    subgroup: Option<u32>,
    value: f64,
    ucl: f64,
    cl: f64,
    lcl: f64,
    beyond_limits: bool,
}

pub(crate) fn chart_rows(result: &ControlLimitsResult) -> Vec<ChartCsvRow> {
    let (mean_name, spread_name) = chart_names(result);
    [(mean_name, &result.mean_chart), (spread_name, &result.spread_chart)]
        .into_iter()
        .flat_map(|(chart, series)| {
            series.points.iter().map(move |p| ChartCsvRow {
                chart,
                index: p.index,
                subgroup: p.subgroup_number,
                value: p.value,
                ucl: series.limits.ucl,
                cl: series.limits.cl,
                lcl: series.limits.lcl,
                beyond_limits: p.beyond_limits,
            })
        })
        .collect()
}

fn chart_names(result: &ControlLimitsResult) -> (&'static str, &'static str) {
    match result.chart_type {
        ChartType::IndividualMr => ("individuals", "moving_range"),
        ChartType::XbarS => ("xbar", "s"),
        _ => ("xbar", "range"),
    }
}

#[derive(Tabled)]
struct LimitsRow {
    #[tabled(rename = "Chart")]
    chart: String,
    #[tabled(rename = "UCL")]
    ucl: String,
    #[tabled(rename = "CL")]
    cl: String,
    #[tabled(rename = "LCL")]
    lcl: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "Beyond")]
    beyond: usize,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Chart")]
    chart: &'static str,
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Subgroup")]
    subgroup: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "")]
    flag: &'static str,
}

/// Styled terminal report for a control-limits result
pub(crate) fn print_limits(result: &ControlLimitsResult, label: Option<&str>, all_points: bool) {
    let (mean_name, spread_name) = chart_names(result);
    let reference = (result.mean_chart.limits.ucl - result.mean_chart.limits.lcl)
        .abs()
        .max(f64::EPSILON);

    println!();
    match label {
        Some(label) => println!(
            "   {} {} chart for {}",
            style("Control Limits:").bold(),
            result.chart_type,
            style(label).yellow()
        ),
        None => println!(
            "   {} {} chart",
            style("Control Limits:").bold(),
            result.chart_type
        ),
    }
    println!(
        "     Subgroup size: {}   Subgroups: {}   σ within: {}",
        result.sample_size,
        result.subgroup_count,
        smart_round(result.sigma_within(), reference)
    );
    println!();

    let row = |name: String, series: &ChartSeries| LimitsRow {
        chart: name,
        ucl: smart_round(series.limits.ucl, reference),
        cl: smart_round(series.limits.cl, reference),
        lcl: smart_round(series.limits.lcl, reference),
        points: series.points.len(),
        beyond: series.out_of_control().count(),
    };
    let mean_label = match result.chart_type {
        ChartType::IndividualMr => "X".to_string(),
        _ => "X̄".to_string(),
    };
    let rows = vec![
        row(mean_label, &result.mean_chart),
        row(result.spread_statistic.to_string(), &result.spread_chart),
    ];
    println!("{}", Table::new(rows).with(Style::rounded()));

    let points: Vec<PointRow> = [(mean_name, &result.mean_chart), (spread_name, &result.spread_chart)]
        .into_iter()
        .flat_map(|(chart, series)| {
            series
                .points
                .iter()
                .filter(|p| all_points || p.beyond_limits)
                .map(move |p| PointRow {
                    chart,
                    index: p.index,
                    subgroup: p
                        .subgroup_number
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    value: smart_round(p.value, reference),
                    flag: if p.beyond_limits { "beyond" } else { "" },
                })
        })
        .collect();
    if !points.is_empty() {
        println!();
        println!("{}", Table::new(points).with(Style::rounded()));
    }

    for warning in &result.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    println!();
    if result.is_in_control() {
        println!("{} In statistical control", style("✓").green());
    } else {
        let beyond =
            result.mean_chart.out_of_control().count() + result.spread_chart.out_of_control().count();
        println!(
            "{} {} point(s) beyond control limits",
            style("✗").red(),
            style(beyond).red()
        );
    }
}
