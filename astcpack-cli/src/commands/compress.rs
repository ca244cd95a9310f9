//! Compress an image in memory and report timing.

use std::path::PathBuf;
use std::time::Duration;

use astcpack::config::{EncoderSettings, JobCount};
use astcpack::context::quality::parse_quality_or_preset;
use astcpack::footprint::BlockFootprint;
use astcpack::{AstcCodec, EncoderSession};
use clap::Args;

use crate::error::CliError;

/// Arguments for `astcpack compress`.
#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Image to compress (any format the `image` crate can decode)
    pub input: PathBuf,

    /// Block footprint, e.g. 4x4 or 6x6
    #[arg(short, long, default_value = "6x6")]
    pub block: BlockFootprint,

    /// Quality preset (fastest, fast, medium, thorough, exhaustive) or 0-100.
    /// Takes precedence over ASTC_QUALITY.
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Number of parallel jobs (default: one per hardware thread)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Compress the image this many times, reusing the context
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Config file (default: ~/.astcpack/config.ini if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the compress command.
pub fn run(args: CompressArgs) -> Result<(), CliError> {
    let settings = resolve_settings(&args)?;

    let image = image::open(&args.input)
        .map_err(|e| CliError::Image {
            path: args.input.clone(),
            reason: e.to_string(),
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();

    let (block_width, block_height) = args.block.dims();
    let payload_len = args.block.payload_size(width, height);
    let mut payload = vec![0u8; payload_len];

    let mut session = EncoderSession::with_settings(AstcCodec::new(), settings);
    let passes = args.repeat.max(1);
    let mut timings = Vec::with_capacity(passes as usize);

    for pass in 0..passes {
        let report = session.compress(
            width,
            height,
            payload_len,
            block_width,
            block_height,
            image.as_raw(),
            &mut payload,
        )?;
        tracing::debug!(
            pass,
            context = ?report.context,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pass complete"
        );
        timings.push(report.elapsed);
    }

    println!(
        "Compressed {} ({}x{}) with {} blocks",
        args.input.display(),
        width,
        height,
        args.block
    );
    println!(
        "  Payload:  {} bytes ({:.2} bits/pixel)",
        payload_len,
        args.block.bits_per_pixel()
    );
    if let Some(context) = session.context() {
        println!("  Quality:  {}", context.quality().value);
        println!("  Jobs:     {}", context.job_count());
    }
    println!("  Timing:   {}", summarize(&timings));
    println!("  Session:  {}", session.metrics());

    Ok(())
}

/// Build settings from the config file, then apply command-line overrides.
fn resolve_settings(args: &CompressArgs) -> Result<EncoderSettings, CliError> {
    let mut settings = match &args.config {
        Some(path) => EncoderSettings::load(path)?,
        None => EncoderSettings::load_default()?,
    };

    if let Some(raw) = &args.quality {
        settings = settings
            .with_quality(parse_quality_or_preset(raw)?)
            .without_quality_env();
    }
    if let Some(jobs) = args.jobs {
        settings = settings.with_jobs(JobCount::Fixed(jobs));
    }

    Ok(settings)
}

fn summarize(timings: &[Duration]) -> String {
    let Some(best) = timings.iter().min() else {
        return "no passes".to_string();
    };
    let total: Duration = timings.iter().sum();
    let mean = total / timings.len() as u32;

    if timings.len() == 1 {
        format!("{:.1} ms", ms(*best))
    } else {
        format!(
            "{} passes, mean {:.1} ms, best {:.1} ms",
            timings.len(),
            ms(mean),
            ms(*best)
        )
    }
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
