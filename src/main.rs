use anyhow::Result;
use clap::Parser;

use credsweep::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
