//! `spc config` command - show effective configuration

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::output::{print_structured, resolve};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{Config, EngineSettings, LOCAL_CONFIG_FILE};

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Print the config file locations instead of the settings
    #[arg(long)]
    pub paths: bool,
}

#[derive(Debug, Serialize)]
struct ConfigPaths {
    user: Option<String>,
    local: String,
    explicit: Option<String>,
}

pub fn run(args: ConfigArgs, global: &GlobalOpts) -> Result<()> {
    let format = resolve(global.format);

    if args.paths {
        let paths = ConfigPaths {
            user: Config::user_config_path().map(|p| p.display().to_string()),
            local: LOCAL_CONFIG_FILE.to_string(),
            explicit: global.config.as_ref().map(|p| p.display().to_string()),
        };
        if print_structured(&paths, format)? {
            return Ok(());
        }
        println!("user:     {}", paths.user.as_deref().unwrap_or("-"));
        println!("local:    {}", paths.local);
        println!("explicit: {}", paths.explicit.as_deref().unwrap_or("-"));
        return Ok(());
    }

    let config = Config::load(global.config.as_deref()).into_diagnostic()?;
    let settings = EngineSettings::from_config(&config);

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            print_structured(&settings, format)?;
        }
        _ => {
            println!("{}", style("Effective settings").bold());
            println!("  default_sample_size: {}", settings.default_sample_size);
            println!("  max_measurements:    {}", settings.max_measurements);
            println!("  strict_factors:      {}", settings.strict_factors);
        }
    }
    Ok(())
}
