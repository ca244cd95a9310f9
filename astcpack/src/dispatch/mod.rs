//! Parallel compression dispatcher.
//!
//! An [`EncoderSession`] owns an engine, its single live context and the
//! worker pool bound to that context. Each [`compress`](EncoderSession::compress)
//! call:
//!
//! 1. ensures a context for the requested block geometry,
//! 2. wraps the input in an [`ImageDescriptor`],
//! 3. splits the output into the engine's per-job ranges,
//! 4. runs one task per job index on the pool and waits for all of them,
//! 5. resets the context exactly once, then reports the first failure, if any.
//!
//! `compress` takes `&mut self`, so a context can never be rebuilt while
//! another call is still compressing with it. Callers that share a session
//! across threads wrap it in a mutex (see [`crate::ffi`]).
//!
//! # Example
//!
//! ```
//! use astcpack::codec::AstcCodec;
//! use astcpack::config::{EncoderSettings, JobCount};
//! use astcpack::dispatch::EncoderSession;
//! use astcpack::footprint::payload_size;
//!
//! let settings = EncoderSettings::new().with_jobs(JobCount::Fixed(2));
//! let mut session = EncoderSession::with_settings(AstcCodec::new(), settings);
//!
//! let rgba = vec![255u8; 16 * 16 * 4];
//! let mut payload = vec![0u8; payload_size(16, 16, 4, 4)];
//! let len = payload.len();
//!
//! let report = session.compress(16, 16, len, 4, 4, &rgba, &mut payload).unwrap();
//! assert_eq!(report.job_count, 2);
//! assert_eq!(report.payload_len, 256);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codec::partition;
use crate::codec::{BlockCodec, CodecStatus, EncoderConfig, ImageDescriptor, JobOutput, Swizzle};
use crate::config::EncoderSettings;
use crate::context::{ActiveContext, ContextManager, ContextStatus};
use crate::error::EncodeError;
use crate::telemetry::{MetricsSnapshot, SessionMetrics};

/// Swizzle applied to every image.
pub const SWIZZLE: Swizzle = Swizzle::IDENTITY;

/// Summary of a successful [`EncoderSession::compress`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    /// Config of the context that produced the payload.
    pub config: EncoderConfig,
    /// Number of jobs the image was split into.
    pub job_count: usize,
    /// Bytes of output the jobs were given.
    pub payload_len: usize,
    /// Whether the context was reused or built for this call.
    pub context: ContextStatus,
    /// Wall time of the whole call, including any context build.
    pub elapsed: Duration,
}

/// An engine plus its live context, driven one call at a time.
pub struct EncoderSession<C: BlockCodec> {
    codec: C,
    contexts: ContextManager<C>,
    metrics: Arc<SessionMetrics>,
}

impl<C: BlockCodec> EncoderSession<C> {
    /// Create a session with default settings.
    pub fn new(codec: C) -> Self {
        Self::with_settings(codec, EncoderSettings::default())
    }

    /// Create a session with explicit settings.
    pub fn with_settings(codec: C, settings: EncoderSettings) -> Self {
        let metrics = Arc::new(SessionMetrics::new());
        Self {
            codec,
            contexts: ContextManager::new(settings, Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn settings(&self) -> &EncoderSettings {
        self.contexts.settings()
    }

    /// The live context, if one has been built.
    pub fn context(&self) -> Option<&ActiveContext<C::Context>> {
        self.contexts.active()
    }

    /// Config of the live context, if any.
    pub fn current_config(&self) -> Option<&EncoderConfig> {
        self.contexts.active().map(|active| active.config())
    }

    /// Point-in-time copy of the session counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Make sure a context for the block geometry is ready without compressing.
    pub fn ensure_context(
        &mut self,
        block_width: u32,
        block_height: u32,
    ) -> Result<ContextStatus, EncodeError> {
        self.contexts.ensure(&self.codec, block_width, block_height)
    }

    /// Free the live context. The next call builds a new one.
    pub fn release_context(&mut self) -> bool {
        self.contexts.release()
    }

    /// Compress a `width`×`height` RGBA8 image into the first `payload_len`
    /// bytes of `output`.
    ///
    /// The output buffer belongs to the caller and is never reallocated. When
    /// this returns an error after jobs ran, the contents of `output` are
    /// unspecified and should be discarded.
    #[allow(clippy::too_many_arguments)]
    pub fn compress(
        &mut self,
        width: u32,
        height: u32,
        payload_len: usize,
        block_width: u32,
        block_height: u32,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<CompressionReport, EncodeError> {
        let started = Instant::now();
        let metrics = Arc::clone(&self.metrics);
        let reject = |e: EncodeError| {
            metrics.compression_rejected();
            e
        };

        let (context, active) = self
            .contexts
            .acquire(&self.codec, block_width, block_height)
            .map_err(reject)?;

        if output.len() < payload_len {
            return Err(reject(EncodeError::OutputTooSmall {
                required: payload_len,
                capacity: output.len(),
            }));
        }

        let image = ImageDescriptor::rgba8(width, height, input).map_err(reject)?;
        let config = *active.config();
        let job_count = active.job_count();

        let required = self.codec.payload_size(&config, width, height);
        if payload_len < required {
            return Err(reject(EncodeError::OutputTooSmall {
                required,
                capacity: payload_len,
            }));
        }

        let ranges = self.codec.partition(&config, &image, payload_len, job_count);
        partition::validate(&ranges, payload_len, job_count)
            .map_err(|e| reject(e.into()))?;
        let outputs = partition::split_output(&mut output[..payload_len], &ranges);

        tracing::debug!(
            width,
            height,
            block_width,
            block_height,
            jobs = job_count,
            payload_len,
            "Dispatching compression jobs"
        );

        let results = run_jobs(&self.codec, active, &image, outputs);

        // Reset exactly once, after every job has joined
        let reset = self.codec.reset(active.handle_mut());

        let failed: Vec<(usize, CodecStatus)> = results
            .iter()
            .enumerate()
            .filter_map(|(job, result)| result.as_ref().err().map(|status| (job, *status)))
            .collect();

        if let Err(status) = reset {
            tracing::error!(error = %status, "Failed to reset encoder context");
            self.metrics.reset_failed();
            self.metrics.compression_failed(job_count, failed.len());
            // The context is in an unknown state; the next call rebuilds it
            self.contexts.release();
            return Err(EncodeError::Reset(status));
        }

        if let Some(&(job, status)) = failed.first() {
            tracing::error!(
                job,
                failed_jobs = failed.len(),
                jobs = job_count,
                error = %status,
                "Compression job failed"
            );
            self.metrics.compression_failed(job_count, failed.len());
            return Err(EncodeError::Job { job, status });
        }

        let elapsed = started.elapsed();
        self.metrics.compression_succeeded(job_count, payload_len);
        tracing::debug!(
            width,
            height,
            jobs = job_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Compression complete"
        );

        Ok(CompressionReport {
            config,
            job_count,
            payload_len,
            context,
            elapsed,
        })
    }
}

/// Run one task per job on the context's pool and collect every result.
///
/// Each job writes its status into its own slot, so no locking is needed.
fn run_jobs<C: BlockCodec>(
    codec: &C,
    active: &ActiveContext<C::Context>,
    image: &ImageDescriptor<'_>,
    outputs: Vec<(usize, &mut [u8])>,
) -> Vec<Result<(), CodecStatus>> {
    let mut results: Vec<Result<(), CodecStatus>> = vec![Ok(()); outputs.len()];
    let handle = active.handle();

    active.pool().scope(|scope| {
        for (job, ((offset, bytes), slot)) in outputs.into_iter().zip(results.iter_mut()).enumerate()
        {
            scope.spawn(move |_| {
                *slot = codec.compress(handle, image, &SWIZZLE, JobOutput { offset, bytes }, job);
            });
        }
    });

    results
}
