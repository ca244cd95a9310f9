//! Encoder context lifecycle.
//!
//! A [`ContextManager`] owns at most one live engine context, keyed by block
//! geometry. Requests for the geometry it already holds are served from the
//! existing context; any other geometry releases the current context before a
//! replacement is configured, so two contexts never coexist.
//!
//! ```text
//!                 ensure(w, h)
//!  ┌───────────┐ ─────────────► ┌────────────────────┐
//!  │   Empty   │                │ Ready(w, h, jobs)  │ ◄─┐ ensure(w, h): reuse
//!  └───────────┘ ◄───────────── └────────────────────┘ ──┘
//!        ▲        config / alloc         │
//!        │        failure                │ ensure(w', h'): release, rebuild
//!        └───────────────────────────────┘
//! ```
//!
//! Quality and job count are resolved only when a context is built. Changing
//! the quality override between calls with the same geometry has no effect
//! until the geometry changes.

pub mod quality;

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::codec::{BlockCodec, EncoderConfig, Profile};
use crate::config::EncoderSettings;
use crate::error::EncodeError;
use crate::telemetry::SessionMetrics;

use quality::{resolve_quality_from_env, ResolvedQuality};

/// Profile every context is configured with.
pub const PROFILE: Profile = Profile::Ldr;

/// Outcome of [`ContextManager::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    /// The existing context matched and was kept.
    Reused,
    /// A new context was built.
    Built,
}

/// The live engine context and everything bound to it.
pub struct ActiveContext<X> {
    config: EncoderConfig,
    job_count: usize,
    quality: ResolvedQuality,
    generation: u64,
    pool: ThreadPool,
    handle: X,
}

impl<X> ActiveContext<X> {
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Number of jobs (and worker threads) this context serves.
    pub fn job_count(&self) -> usize {
        self.job_count
    }

    pub fn quality(&self) -> &ResolvedQuality {
        &self.quality
    }

    /// Increments each time a context is built by the same manager.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn handle(&self) -> &X {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut X {
        &mut self.handle
    }
}

/// Owns the single live context of a session.
pub struct ContextManager<C: BlockCodec> {
    settings: EncoderSettings,
    active: Option<ActiveContext<C::Context>>,
    generation: u64,
    metrics: Arc<SessionMetrics>,
}

impl<C: BlockCodec> ContextManager<C> {
    pub fn new(settings: EncoderSettings, metrics: Arc<SessionMetrics>) -> Self {
        Self {
            settings,
            active: None,
            generation: 0,
            metrics,
        }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    pub fn active(&self) -> Option<&ActiveContext<C::Context>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveContext<C::Context>> {
        self.active.as_mut()
    }

    /// Make sure a context for `block_width`×`block_height` is current.
    ///
    /// On failure no context is left alive, and the next call starts over.
    pub fn ensure(
        &mut self,
        codec: &C,
        block_width: u32,
        block_height: u32,
    ) -> Result<ContextStatus, EncodeError> {
        self.acquire(codec, block_width, block_height)
            .map(|(status, _)| status)
    }

    /// Like [`ensure`](Self::ensure), also handing back the current context.
    pub fn acquire(
        &mut self,
        codec: &C,
        block_width: u32,
        block_height: u32,
    ) -> Result<(ContextStatus, &mut ActiveContext<C::Context>), EncodeError> {
        let (status, active) = match self.active.take() {
            Some(active) if active.config.matches_block(block_width, block_height) => {
                self.metrics.context_reused();
                tracing::debug!(
                    block_width,
                    block_height,
                    generation = active.generation,
                    "Reusing encoder context"
                );
                (ContextStatus::Reused, active)
            }
            previous => {
                if let Some(old) = previous {
                    self.free(old);
                }
                (ContextStatus::Built, self.build(codec, block_width, block_height)?)
            }
        };

        Ok((status, self.active.insert(active)))
    }

    fn build(
        &mut self,
        codec: &C,
        block_width: u32,
        block_height: u32,
    ) -> Result<ActiveContext<C::Context>, EncodeError> {
        let job_count = self.settings.jobs.resolve();
        let quality =
            resolve_quality_from_env(self.settings.quality, self.settings.quality_env.as_deref());

        tracing::info!(
            codec = codec.name(),
            block_width,
            block_height,
            quality = quality.value,
            jobs = job_count,
            "Building encoder context"
        );

        let config = codec
            .configure(PROFILE, block_width, block_height, quality.value)
            .map_err(|status| {
                tracing::error!(
                    block_width,
                    block_height,
                    quality = quality.value,
                    error = %status,
                    "Encoder configuration failed"
                );
                self.metrics.context_failed();
                EncodeError::Configuration {
                    block_width,
                    block_height,
                    quality: quality.value,
                    status,
                }
            })?;

        let handle = codec.allocate(&config, job_count).map_err(|status| {
            tracing::error!(jobs = job_count, error = %status, "Context allocation failed");
            self.metrics.context_failed();
            EncodeError::Allocation { job_count, status }
        })?;

        // `handle` is dropped (freed) if the pool cannot start
        let pool = ThreadPoolBuilder::new()
            .num_threads(job_count)
            .thread_name(|i| format!("astcpack-job-{}", i))
            .build()
            .map_err(|e| {
                tracing::error!(jobs = job_count, error = %e, "Failed to start worker threads");
                self.metrics.context_failed();
                EncodeError::WorkerPool {
                    job_count,
                    reason: e.to_string(),
                }
            })?;

        self.generation += 1;
        self.metrics.context_built();

        Ok(ActiveContext {
            config,
            job_count,
            quality,
            generation: self.generation,
            pool,
            handle,
        })
    }

    /// Free the current context, if any. Returns true if one was freed.
    pub fn release(&mut self) -> bool {
        match self.active.take() {
            Some(old) => {
                self.free(old);
                true
            }
            None => false,
        }
    }

    fn free(&self, old: ActiveContext<C::Context>) {
        tracing::debug!(
            block_width = old.config.block_width,
            block_height = old.config.block_height,
            generation = old.generation,
            "Releasing encoder context"
        );
        drop(old);
        self.metrics.context_released();
    }
}

impl<C: BlockCodec> Drop for ContextManager<C> {
    fn drop(&mut self) {
        self.release();
    }
}
