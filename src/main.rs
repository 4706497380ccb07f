use anyhow::Result;
use clap::Parser;

use parallelize::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
