//! Goldenrun CLI
//!
//! Runs the reference image suites declared in one or more JSON manifests.

use anyhow::{Context, Result};
use clap::Parser;
use goldenrun::config::HarnessConfig;
use goldenrun::manifest::{load_suites, SuiteDefaults};
use goldenrun::report::ReportStore;
use goldenrun::test_runner::TestRunner;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status of a run that could not complete
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "goldenrun")]
#[command(author, version, about = "Reference-image regression harness for signal decoders", long_about = None)]
struct Cli {
    /// Suite manifests (JSON), run in the given order
    #[arg(value_name = "MANIFEST", required = true)]
    manifests: Vec<PathBuf>,

    /// Decoder executable for suites that do not name one
    #[arg(long, value_name = "PATH")]
    decoder: Option<PathBuf>,

    /// Fixture directory for suites that do not name one
    #[arg(long, value_name = "DIR")]
    test_srcdir: Option<PathBuf>,

    /// Root directory where report files will be stored
    #[arg(long, value_name = "DIR")]
    report_rootdir: Option<PathBuf>,

    /// Replace references which are missing or do not match
    #[arg(long)]
    update_references: bool,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn setup_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    let config = HarnessConfig::from_env().with_overrides(cli.report_rootdir, cli.update_references);
    let defaults = SuiteDefaults {
        decoder: cli.decoder,
        test_srcdir: cli.test_srcdir,
        update_references: config.update_references,
    };

    let mut runner = TestRunner::new(ReportStore::new(config.report_rootdir));
    for manifest in &cli.manifests {
        let suites = load_suites(manifest, &defaults)
            .with_context(|| format!("Failed to load suites from {}", manifest.display()))?;
        for suite in suites {
            runner.add_suite(suite);
        }
    }

    let summary = runner.run().context("Test run aborted")?;
    Ok(summary.exit_code())
}
