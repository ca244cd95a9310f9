//! Block-compression engine abstraction.
//!
//! The dispatcher never compresses anything itself. It drives an engine
//! through the [`BlockCodec`] trait, which mirrors the lifecycle of a typical
//! native block encoder:
//!
//! ```text
//! configure(profile, block, quality) ──► EncoderConfig
//!                                            │
//! allocate(config, job_count) ──────────► Context ◄─── reset() after each call
//!                                            │
//!                 ┌──────────────┬───────────┴──────────────┐
//!                 ▼              ▼                          ▼
//!          compress(job 0) compress(job 1)   ...   compress(job N-1)
//!                 │              │                          │
//!                 ▼              ▼                          ▼
//!          output[range 0] output[range 1]         output[range N-1]
//! ```
//!
//! Releasing a context is dropping it. Engines that hold native resources free
//! them in their context's `Drop` implementation.
//!
//! # Available Engines
//!
//! - [`AstcCodec`] - native ASTC LDR compression for every 2D footprint

mod astc;
pub mod partition;
mod status;

use std::ops::Range;

use crate::error::EncodeError;
use crate::footprint;

pub use astc::{AstcCodec, AstcContext, BlockEncoder, ColorFormat, FOOTPRINTS};
pub use status::CodecStatus;

/// Color profile the engine compresses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Low dynamic range, linear color.
    Ldr,
    /// Low dynamic range, sRGB color.
    LdrSrgb,
    /// HDR color with LDR alpha.
    HdrRgbLdrAlpha,
    /// HDR color and alpha.
    Hdr,
}

/// Source of one output channel in a [`Swizzle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    R,
    G,
    B,
    A,
    /// Constant zero.
    Zero,
    /// Constant one (255 for 8-bit data).
    One,
}

/// Channel mapping applied to texels before compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle {
    pub r: Component,
    pub g: Component,
    pub b: Component,
    pub a: Component,
}

impl Swizzle {
    /// RGBA passes through unchanged.
    pub const IDENTITY: Swizzle = Swizzle {
        r: Component::R,
        g: Component::G,
        b: Component::B,
        a: Component::A,
    };

    /// Returns true if this swizzle leaves every channel in place.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply the swizzle to one RGBA8 texel.
    pub fn apply(&self, texel: [u8; 4]) -> [u8; 4] {
        let pick = |c: Component| match c {
            Component::R => texel[0],
            Component::G => texel[1],
            Component::B => texel[2],
            Component::A => texel[3],
            Component::Zero => 0,
            Component::One => u8::MAX,
        };
        [pick(self.r), pick(self.g), pick(self.b), pick(self.a)]
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Element type of the image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    F16,
    F32,
}

/// Immutable encoder configuration produced by [`BlockCodec::configure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderConfig {
    pub profile: Profile,
    pub block_width: u32,
    pub block_height: u32,
    pub block_depth: u32,
    pub quality: f32,
    pub flags: u32,
}

impl EncoderConfig {
    /// Block dimensions as `(width, height)`.
    pub fn block_dims(&self) -> (u32, u32) {
        (self.block_width, self.block_height)
    }

    /// Returns true if this config was built for the given block geometry.
    pub fn matches_block(&self, block_width: u32, block_height: u32) -> bool {
        self.block_width == block_width && self.block_height == block_height
    }
}

/// Read-only view of a single slice of interleaved RGBA8 texels.
///
/// Built per call and shared by every job; it never outlives the input buffer.
#[derive(Debug, Clone, Copy)]
pub struct ImageDescriptor<'a> {
    width: u32,
    height: u32,
    depth: u32,
    element_type: ElementType,
    data: &'a [u8],
}

impl<'a> ImageDescriptor<'a> {
    /// Bytes per RGBA8 texel.
    pub const BYTES_PER_TEXEL: usize = 4;

    /// Wrap an RGBA8 buffer holding at least `width * height * 4` bytes.
    pub fn rgba8(width: u32, height: u32, data: &'a [u8]) -> Result<Self, EncodeError> {
        if width == 0 || height == 0 {
            return Err(EncodeError::InvalidImage {
                width,
                height,
                reason: "dimensions must be non-zero".to_string(),
            });
        }

        let required = width as usize * height as usize * Self::BYTES_PER_TEXEL;
        if data.len() < required {
            return Err(EncodeError::InvalidImage {
                width,
                height,
                reason: format!("input holds {} bytes, need {}", data.len(), required),
            });
        }

        Ok(Self {
            width,
            height,
            depth: 1,
            element_type: ElementType::U8,
            data: &data[..required],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Raw texel bytes, row-major with no padding.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Fetch the texel at `(x, y)`, clamping coordinates to the image edge.
    pub fn texel_clamped(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let i = (y * self.width as usize + x) * Self::BYTES_PER_TEXEL;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// The slice of the output buffer owned by a single job.
#[derive(Debug)]
pub struct JobOutput<'a> {
    /// Offset of `bytes` within the full output buffer.
    pub offset: usize,
    /// Bytes this job may write.
    pub bytes: &'a mut [u8],
}

impl JobOutput<'_> {
    /// Byte range this job owns in the full output buffer.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }
}

/// A block-compression engine.
///
/// Implementations must be shareable across worker threads: `compress` is
/// called concurrently for different job indices against the same context.
/// Each call only receives the output range that [`BlockCodec::partition`]
/// assigned to its job, so writes are disjoint by construction.
pub trait BlockCodec: Send + Sync {
    /// Engine state bound to one config and job count.
    type Context: Send + Sync;

    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Build a configuration for the given profile, block geometry and quality.
    fn configure(
        &self,
        profile: Profile,
        block_width: u32,
        block_height: u32,
        quality: f32,
    ) -> Result<EncoderConfig, CodecStatus>;

    /// Allocate a context able to serve `job_count` concurrent jobs.
    fn allocate(
        &self,
        config: &EncoderConfig,
        job_count: usize,
    ) -> Result<Self::Context, CodecStatus>;

    /// Compressed size of a `width`×`height` image under `config`.
    fn payload_size(&self, config: &EncoderConfig, width: u32, height: u32) -> usize {
        footprint::payload_size(width, height, config.block_width, config.block_height)
    }

    /// Split `[0, capacity)` into one output range per job.
    ///
    /// Ranges must be sorted, non-overlapping and within `capacity`. The
    /// default assigns contiguous bands of block rows.
    fn partition(
        &self,
        config: &EncoderConfig,
        image: &ImageDescriptor<'_>,
        capacity: usize,
        job_count: usize,
    ) -> Vec<Range<usize>> {
        partition::block_rows(config, image.width(), image.height(), capacity, job_count)
    }

    /// Compress the part of `image` that belongs to `job`.
    fn compress(
        &self,
        context: &Self::Context,
        image: &ImageDescriptor<'_>,
        swizzle: &Swizzle,
        output: JobOutput<'_>,
        job: usize,
    ) -> Result<(), CodecStatus>;

    /// Prepare the context for the next image.
    fn reset(&self, context: &mut Self::Context) -> Result<(), CodecStatus>;
}
