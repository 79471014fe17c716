use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use picopack::{config::Config, orchestrator::BundleOrchestrator};

#[derive(Debug, Parser)]
#[command(
    name = "picopack",
    version,
    about = "Bundle a tree of JavaScript modules into one self-executing file"
)]
struct Cli {
    /// Entry module of the bundle
    entry: PathBuf,

    /// Output path for the emitted bundle
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Re-extract a file for every import instead of sharing one identity
    /// per resolved path; emits the reference loader shape
    #[arg(long)]
    no_dedupe: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(Path::new("."))?;
    if let Some(output) = cli.output {
        config.output = output;
    }
    if cli.no_dedupe {
        config.dedupe = false;
    }

    BundleOrchestrator::new(config).run(&cli.entry)
}
