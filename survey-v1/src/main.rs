//! Legacy Survey Converter
//!
//! Converts the generated surveys of a study to the v1 (1.1) format so they
//! can be uploaded to deployments still running the older survey engine.
//!
//! **Usage:**
//! ```bash
//! survey-v1 [--output-root <dir>] [--recursive] [--skip-existing] <study>
//! ```
//!
//! Reads `output/<study>/surveys/*.json` and writes `<name>.v1.json` next to
//! each input. The scanned folder is printed to stdout; logs go to stderr.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use survey_common::{BatchConverter, ConverterConfig, TransformKind};
use tracing::info;

/// Legacy survey converter
#[derive(Parser, Debug)]
#[command(name = "survey-v1", version)]
#[command(about = "Convert a study's surveys to the legacy v1 format")]
struct Args {
    /// Study key (`study=<key>` is accepted too)
    study: String,

    /// Folder holding one sub-folder per study [default: output]
    #[arg(long, value_name = "DIR", env = "SURVEY_V1_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// Also convert surveys in nested folders
    #[arg(long)]
    recursive: bool,

    /// Leave surveys alone when their .v1.json output already exists
    #[arg(long)]
    skip_existing: bool,

    /// Transform applied to each survey [default: legacy]
    #[arg(long, value_enum)]
    transform: Option<TransformArg>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransformArg {
    Legacy,
    Identity,
}

impl From<TransformArg> for TransformKind {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Legacy => TransformKind::Legacy,
            TransformArg::Identity => TransformKind::Identity,
        }
    }
}

impl Args {
    /// Study key with the optional `study=` prefix removed
    fn study_key(&self) -> &str {
        self.study.strip_prefix("study=").unwrap_or(&self.study)
    }

    /// Apply command-line overrides on top of the file config
    fn apply(&self, mut config: ConverterConfig) -> ConverterConfig {
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if self.recursive {
            config.recursive = true;
        }
        if self.skip_existing {
            config.skip_existing = true;
        }
        if let Some(transform) = self.transform {
            config.transform = transform.into();
        }
        config
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.apply(ConverterConfig::load(args.config.as_deref())?);

    // Logs go to stderr; stdout carries only the survey folder
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting survey-v1 v{} for study '{}'",
        env!("CARGO_PKG_VERSION"),
        args.study_key()
    );

    let converter = BatchConverter::from_config(config);
    converter.run(args.study_key())?;

    Ok(())
}
