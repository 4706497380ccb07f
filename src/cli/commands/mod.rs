use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::cli::Output;

pub mod bench;
pub mod config;
pub mod run;

#[derive(Parser)]
#[command(
    name = "parallelize",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run a command over every input line in parallel, keeping input order",
    long_about = "parallelize spreads a per-item task across a pool of worker threads and \
                  returns the results in exactly the order of the input."
)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command once per input line across a worker pool
    Run(run::RunArgs),
    /// Time a CPU-bound workload sequentially and across the pool
    Bench(bench::BenchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose, self.quiet);

        match self.command {
            Some(Commands::Run(args)) => run::execute(args, &output, self.config.as_deref()),
            Some(Commands::Bench(args)) => bench::execute(args, &output, self.config.as_deref()),
            Some(Commands::Config(args)) => config::execute(args, &output, self.config.as_deref()),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
