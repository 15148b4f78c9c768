//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kanata_diff::StageSet;

#[derive(Parser)]
#[command(name = "kanata-diff")]
#[command(
    about = "Compare two Kanata logs and find the first instruction with different stage timings"
)]
#[command(version)]
#[command(after_help = "\
Examples:
  kanata-diff file1.kanata file2.kanata
  kanata-diff --stages IF,EX,WB file1.kanata file2.kanata
  kanata-diff -s IF -s EX file1.kanata file2.kanata")]
pub struct Cli {
    /// First Kanata log file
    #[arg(value_name = "FILE1")]
    pub file1: PathBuf,

    /// Second Kanata log file
    #[arg(value_name = "FILE2")]
    pub file2: PathBuf,

    /// Stages to check (comma-separated, may be repeated) [default: IF,WB,RN,EX,PNR,CO]
    #[arg(short, long = "stages", value_name = "STAGES")]
    pub stages: Vec<String>,

    /// When to style the report
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorArg,

    /// Show metrics summary after the comparison
    #[arg(long)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve `--stages` into the set of stages to compare.
    pub fn stage_set(&self) -> Result<StageSet, clap::Error> {
        StageSet::from_args(&self.stages).ok_or_else(|| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                "--stages must name at least one stage\n",
            )
        })
    }
}

/// Report styling choice.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorArg {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorArg {
    /// Whether stdout output should carry ANSI styles.
    pub fn enabled(self) -> bool {
        match self {
            Self::Auto => console::colors_enabled(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}
