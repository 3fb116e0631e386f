use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::report;
use crate::config::Config;
use crate::scanner::Scanner;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory tree (or single directory) to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// YAML configuration merged over the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show scan statistics after the results
    #[arg(long)]
    pub stats: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Machine-readable JSON
    Json,
}

pub fn execute(args: ScanArgs, verbose: bool) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    crate::cli::init_logging(verbose || config.verbose);

    if args.no_color || config.disable_output_colors {
        console::set_colors_enabled(false);
    }

    let scanner = Scanner::new(&config)?;
    let mut report = scanner.scan(&args.path)?;

    match args.format {
        OutputFormat::Text => {
            report::print_findings(&mut report.findings);
            if args.stats {
                report::print_statistics(&report.statistics);
            }
        }
        OutputFormat::Json => {
            report::sort_findings(&mut report.findings);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    // CI contract: a scan with findings fails the pipeline
    if report.statistics.results_found > 0 {
        std::process::exit(1);
    }

    Ok(())
}
