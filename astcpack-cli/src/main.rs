//! astcpack CLI - Command-line interface
//!
//! Compresses images to ASTC block payloads with the astcpack library.

mod commands;
mod error;

use std::process;

use clap::{Parser, Subcommand};

use commands::compress::CompressArgs;
use commands::footprints::FootprintsArgs;

#[derive(Debug, Parser)]
#[command(name = "astcpack", version, about = "Multi-threaded ASTC texture compression")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress an image in memory and report the result
    Compress(CompressArgs),
    /// List supported block footprints
    Footprints(FootprintsArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = astcpack::logging::init(cli.verbose) {
        eprintln!("{}", e);
    }

    let result = match cli.command {
        Command::Compress(args) => commands::compress::run(args),
        Command::Footprints(args) => commands::footprints::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
