//! List the supported block footprints.

use astcpack::footprint::BlockFootprint;
use clap::Args;

use crate::error::CliError;

/// Arguments for `astcpack footprints`.
#[derive(Debug, Args)]
pub struct FootprintsArgs {
    /// Image width used for the payload size column
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Image height used for the payload size column
    #[arg(long, default_value_t = 1024)]
    pub height: u32,
}

/// Print one line per footprint.
pub fn run(args: FootprintsArgs) -> Result<(), CliError> {
    println!("Footprint   Bits/pixel   Payload for {}x{}", args.width, args.height);
    for footprint in BlockFootprint::ALL {
        println!(
            "{:<11} {:>10.2}   {} bytes",
            footprint.to_string(),
            footprint.bits_per_pixel(),
            footprint.payload_size(args.width, args.height)
        );
    }
    Ok(())
}
