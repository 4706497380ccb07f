use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::cli::Output;
use crate::config::ParallelizeConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display the effective settings after merging every layer
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Toml)]
        format: ShowFormat,
    },
    /// Check that the merged configuration is valid
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Toml,
    Json,
}

pub fn execute(args: ConfigArgs, output: &Output, custom_config: Option<&str>) -> Result<()> {
    let config = ParallelizeConfig::load(custom_config, None::<()>)?;

    match args.command {
        ConfigCommand::Show { format } => {
            let settings = config.settings()?;
            let rendered = match format {
                ShowFormat::Toml => toml::to_string_pretty(&settings)?,
                ShowFormat::Json => serde_json::to_string_pretty(&settings)?,
            };
            println!("{}", rendered.trim_end());
        }
        ConfigCommand::Validate => {
            let settings = config.settings()?;
            output.verbose(&format!("{settings:?}"));
            output.success("configuration is valid");
        }
    }
    Ok(())
}
