//! `spc gage` command - Gage R&R classification

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::style_category;
use crate::cli::output::{print_csv, print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::msa::{classify_gage_rr, ndc_adequate, GageRrCategory, StudyType, MIN_DISTINCT_CATEGORIES};

#[derive(clap::Args, Debug)]
pub struct GageArgs {
    /// %GRR (measurement variation as a percentage of total or tolerance)
    #[arg(allow_negative_numbers = true)]
    pub percent: f64,

    /// Number of distinct categories reported by the study
    #[arg(long)]
    pub ndc: Option<u32>,

    /// Study type: GageR&R, Bias, Linearity or Stability
    #[arg(long, short = 't', default_value = "GageR&R")]
    pub study_type: StudyType,
}

#[derive(Debug, Serialize)]
struct GageReport {
    study_type: StudyType,
    percent_grr: f64,
    category: GageRrCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    ndc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ndc_adequate: Option<bool>,
}

pub fn run(args: GageArgs, global: &GlobalOpts) -> Result<()> {
    if !args.study_type.uses_grr() {
        tracing::warn!(
            study_type = %args.study_type,
            "%GRR categories are defined for Gage R&R studies"
        );
    }

    let category = classify_gage_rr(args.percent)?;
    let report = GageReport {
        study_type: args.study_type,
        percent_grr: args.percent,
        category,
        ndc: args.ndc,
        ndc_adequate: args.ndc.map(ndc_adequate),
    };

    let format = resolve(global.format);
    if print_structured(&report, format)? {
        return Ok(());
    }
    match format {
        OutputFormat::Csv => print_csv([&report]),
        _ => {
            println!(
                "   {} {:.1}% GRR: {}",
                style(report.study_type).bold(),
                report.percent_grr,
                style_category(report.category)
            );
            if let (Some(ndc), Some(adequate)) = (report.ndc, report.ndc_adequate) {
                let verdict = if adequate {
                    style("adequate".to_string()).green()
                } else {
                    style(format!("below {}", MIN_DISTINCT_CATEGORIES)).red()
                };
                println!("   ndc: {} ({})", ndc, verdict);
            }
            Ok(())
        }
    }
}
