use clap::Parser;
use miette::Result;
use spc::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Analyze(args) => spc::cli::commands::analyze::run(args, global),
        Commands::Limits(args) => spc::cli::commands::limits::run(args, global),
        Commands::Capability(args) => spc::cli::commands::capability::run(args, global),
        Commands::Gage(args) => spc::cli::commands::gage::run(args, global),
        Commands::Config(args) => spc::cli::commands::config::run(args, global),
        Commands::Completions(args) => spc::cli::commands::completions::run(args),
    }
}

/// Logs go to stderr; SPC_LOG overrides the -v level, SPC_LOG_FORMAT=json
/// switches to JSON lines.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "spc=warn",
        1 => "spc=info",
        _ => "spc=debug",
    };
    let filter = EnvFilter::try_from_env("SPC_LOG").unwrap_or_else(|_| default_level.into());
    let log_format = std::env::var("SPC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
        }
    }
}
