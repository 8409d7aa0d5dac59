//! Command-line argument definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::analyze::AnalyzeArgs;
use crate::cli::commands::capability::CapabilityArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::config::ConfigArgs;
use crate::cli::commands::gage::GageArgs;
use crate::cli::commands::limits::LimitsArgs;

#[derive(Parser, Debug)]
#[command(
    name = "spc",
    version,
    about = "Statistical process control for dimensional measurements",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Config file layered over the user and ./.spc.yaml configs
    #[arg(long, global = true, env = "SPC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress status lines on stderr
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse a characteristic: control chart plus capability
    Analyze(AnalyzeArgs),

    /// Compute control limits for a measurement series
    Limits(LimitsArgs),

    /// Compute process capability against a specification window
    Capability(CapabilityArgs),

    /// Classify a Gage R&R result
    Gage(GageArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text on a terminal, JSON when piped
    #[default]
    Auto,
    /// Styled terminal report
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Comma-separated values
    Csv,
}
