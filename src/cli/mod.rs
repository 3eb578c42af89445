//! Command-line interface for ref-threader.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **thread**: Thread a reference path through every flower of a graph snapshot
//! - **inspect**: Summarize the flowers of a graph snapshot
//!
//! ## Usage
//!
//! ```text
//! # Thread the reference and write the threaded snapshot
//! ref-threader thread graph.json -o threaded.json
//!
//! # Use the exact solver with a custom reference header
//! ref-threader thread graph.json.gz --solver exact --reference-header hg38
//!
//! # JSON output for scripting
//! ref-threader inspect graph.json --format json
//! ```

use clap::{Parser, Subcommand};

pub mod inspect;
pub mod thread;

#[derive(Parser)]
#[command(name = "ref-threader")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Thread a reference genome path through a nested alignment graph")]
#[command(
    long_about = "ref-threader walks a nested multiple-genome alignment graph top-down and, in every flower, chooses how the open ends of the unresolved tangles pair up on a synthetic reference genome.\n\nPairings inherited from the parent level and fixed by aligned blocks are always kept; the remaining ends are paired to agree with as many embedded genomes as possible."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Thread the reference through every flower of a snapshot
    Thread(thread::ThreadArgs),

    /// Summarize the flowers of a snapshot
    Inspect(inspect::InspectArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
