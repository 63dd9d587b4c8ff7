//! cdl - ASC CDL converter
//!
//! Converts between `.cc`, `.ccc` and `.cdl` documents and prints their
//! contents.

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cdl")]
#[command(author, version, about = "ASC CDL converter")]
#[command(long_about = "
Reads and writes ASC Color Decision List documents.

Examples:
  cdl info grades.cdl                   # Show corrections and media refs
  cdl convert grades.cdl -o ccc         # Write grades.ccc next to the input
  cdl convert 'reels/*.ccc' -o cc,cdl --dest out/
  cdl convert shot.cc -o cdl --halt     # Stop on the first bad value
  cdl convert grades.ccc -o cdl --check # Flag unusual grade values
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Display corrections, decisions and media references
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Convert between CDL formats
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input document(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input documents or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Output format(s), comma separated: cc, ccc, cdl
    #[arg(short, long)]
    output: Option<String>,

    /// Abort on the first invalid value or entity
    #[arg(long)]
    halt: bool,

    /// Output directory (defaults to each input's directory)
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report values outside the usual grading range
    #[arg(long)]
    check: bool,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
    }
}
