//! Shared helpers for integration tests.
//!
//! [`RecordingCodec`] is a stand-in engine that records every call the
//! dispatcher makes and fills each job's output range with a marker byte.

#![allow(dead_code)]

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use astcpack::codec::{EncoderConfig, ImageDescriptor, JobOutput, Profile, Swizzle};
use astcpack::{BlockCodec, CodecStatus};

/// One `compress` call as seen by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job: usize,
    pub range: Range<usize>,
    pub image_width: u32,
    pub image_height: u32,
    pub generation: usize,
}

/// Engine state; decrements the live counter when freed.
#[derive(Debug)]
pub struct RecordingContext {
    generation: usize,
    live: Arc<AtomicUsize>,
}

impl Drop for RecordingContext {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct RecordingCodec {
    pub fail_configure: AtomicBool,
    pub fail_reset: AtomicBool,
    /// Job index that reports `CodecStatus::Internal`, or `usize::MAX` for none.
    pub fail_job: AtomicUsize,
    configures: Mutex<Vec<(u32, u32, f32)>>,
    allocations: AtomicUsize,
    overlapping_allocations: AtomicUsize,
    resets: AtomicUsize,
    live: Arc<AtomicUsize>,
    jobs: Mutex<Vec<JobRecord>>,
}

impl RecordingCodec {
    pub fn new() -> Self {
        Self {
            fail_job: AtomicUsize::new(usize::MAX),
            ..Default::default()
        }
    }

    pub fn failing_configure() -> Self {
        let codec = Self::new();
        codec.fail_configure.store(true, Ordering::SeqCst);
        codec
    }

    pub fn failing_reset() -> Self {
        let codec = Self::new();
        codec.fail_reset.store(true, Ordering::SeqCst);
        codec
    }

    pub fn failing_job(job: usize) -> Self {
        let codec = Self::new();
        codec.fail_job.store(job, Ordering::SeqCst);
        codec
    }

    /// `(block_width, block_height, quality)` of every configure call.
    pub fn configures(&self) -> Vec<(u32, u32, f32)> {
        self.configures.lock().clone()
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Allocations made while another context was still alive.
    pub fn overlapping_allocations(&self) -> usize {
        self.overlapping_allocations.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn live_contexts(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Every job recorded so far, sorted by job index.
    pub fn jobs(&self) -> Vec<JobRecord> {
        let mut jobs = self.jobs.lock().clone();
        jobs.sort_by_key(|record| (record.generation, record.job));
        jobs
    }

    pub fn clear_jobs(&self) {
        self.jobs.lock().clear();
    }

    /// Byte each job writes into its range.
    pub fn marker(job: usize) -> u8 {
        (job % 255) as u8 + 1
    }
}

impl BlockCodec for RecordingCodec {
    type Context = RecordingContext;

    fn name(&self) -> &str {
        "recording"
    }

    fn configure(
        &self,
        profile: Profile,
        block_width: u32,
        block_height: u32,
        quality: f32,
    ) -> Result<EncoderConfig, CodecStatus> {
        self.configures
            .lock()
            .push((block_width, block_height, quality));
        if self.fail_configure.load(Ordering::SeqCst) {
            return Err(CodecStatus::BadBlockSize);
        }
        Ok(EncoderConfig {
            profile,
            block_width,
            block_height,
            block_depth: 1,
            quality,
            flags: 0,
        })
    }

    fn allocate(
        &self,
        _config: &EncoderConfig,
        _job_count: usize,
    ) -> Result<RecordingContext, CodecStatus> {
        if self.live.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapping_allocations.fetch_add(1, Ordering::SeqCst);
        }
        let generation = self.allocations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RecordingContext {
            generation,
            live: Arc::clone(&self.live),
        })
    }

    fn compress(
        &self,
        context: &RecordingContext,
        image: &ImageDescriptor<'_>,
        _swizzle: &Swizzle,
        output: JobOutput<'_>,
        job: usize,
    ) -> Result<(), CodecStatus> {
        let range = output.range();
        let JobOutput { bytes, .. } = output;
        self.jobs.lock().push(JobRecord {
            job,
            range,
            image_width: image.width(),
            image_height: image.height(),
            generation: context.generation,
        });
        bytes.fill(Self::marker(job));

        if self.fail_job.load(Ordering::SeqCst) == job {
            return Err(CodecStatus::Internal);
        }
        Ok(())
    }

    fn reset(&self, _context: &mut RecordingContext) -> Result<(), CodecStatus> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset.load(Ordering::SeqCst) {
            return Err(CodecStatus::BadContext);
        }
        Ok(())
    }
}

/// A solid RGBA8 image.
pub fn solid_image(width: u32, height: u32) -> Vec<u8> {
    vec![200u8; width as usize * height as usize * 4]
}

/// Assert that the non-empty ranges are disjoint and cover `[0, len)`.
pub fn assert_covers(ranges: &[Range<usize>], len: usize) {
    let mut ranges: Vec<Range<usize>> = ranges.iter().filter(|r| !r.is_empty()).cloned().collect();
    ranges.sort_by_key(|r| r.start);

    let mut cursor = 0;
    for range in &ranges {
        assert_eq!(range.start, cursor, "gap or overlap at byte {}", cursor);
        cursor = range.end;
    }
    assert_eq!(cursor, len, "ranges stop short of the payload");
}
