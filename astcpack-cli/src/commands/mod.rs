//! CLI subcommands.

pub mod compress;
pub mod footprints;
