//! Native ASTC LDR engine.
//!
//! Every block is encoded with one partition and one weight plane, using
//! direct RGB or RGBA endpoints at full 8-bit precision. Uniform blocks become
//! void-extent blocks. Quality controls how many weight grids are searched per
//! block and how many times the endpoints are refined.
//!
//! Each job walks its band of block rows and gathers every block's texels
//! through the image's edge clamp, so partial blocks at the right and bottom
//! edges replicate the last texel.

mod encode;
mod layout;
mod physical;

pub use encode::{BlockEncoder, ColorFormat};

use super::{
    BlockCodec, CodecStatus, EncoderConfig, ImageDescriptor, JobOutput, Profile, Swizzle,
};
use crate::footprint::{blocks_along, BLOCK_BYTES};

/// 2D block footprints the format defines.
pub const FOOTPRINTS: [(u32, u32); 14] = [
    (4, 4),
    (5, 4),
    (5, 5),
    (6, 5),
    (6, 6),
    (8, 5),
    (8, 6),
    (8, 8),
    (10, 5),
    (10, 6),
    (10, 8),
    (10, 10),
    (12, 10),
    (12, 12),
];

/// ASTC LDR engine.
///
/// # Example
///
/// ```
/// use astcpack::codec::{AstcCodec, BlockCodec, Profile};
///
/// let codec = AstcCodec::new();
/// let config = codec.configure(Profile::Ldr, 6, 6, 60.0).unwrap();
/// assert_eq!(config.block_dims(), (6, 6));
///
/// // 7×7 is not an ASTC footprint
/// assert!(codec.configure(Profile::Ldr, 7, 7, 60.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AstcCodec;

impl AstcCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Context for [`AstcCodec`]: the block encoder built for one footprint and
/// quality.
#[derive(Debug, Clone)]
pub struct AstcContext {
    config: EncoderConfig,
    job_count: usize,
    encoder: BlockEncoder,
}

impl AstcContext {
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    pub fn encoder(&self) -> &BlockEncoder {
        &self.encoder
    }
}

impl BlockCodec for AstcCodec {
    type Context = AstcContext;

    fn name(&self) -> &str {
        "astc"
    }

    fn configure(
        &self,
        profile: Profile,
        block_width: u32,
        block_height: u32,
        quality: f32,
    ) -> Result<EncoderConfig, CodecStatus> {
        if !matches!(profile, Profile::Ldr | Profile::LdrSrgb) {
            return Err(CodecStatus::BadProfile);
        }

        if !FOOTPRINTS.contains(&(block_width, block_height)) {
            return Err(CodecStatus::BadBlockSize);
        }

        if !(0.0..=100.0).contains(&quality) {
            return Err(CodecStatus::BadQuality);
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
        config: &EncoderConfig,
        job_count: usize,
    ) -> Result<AstcContext, CodecStatus> {
        if job_count == 0 {
            return Err(CodecStatus::BadParam);
        }

        let (bw, bh) = config.block_dims();
        let encoder = BlockEncoder::new(bw, bh, config.quality).ok_or(CodecStatus::BadBlockSize)?;

        Ok(AstcContext {
            config: *config,
            job_count,
            encoder,
        })
    }

    fn compress(
        &self,
        context: &AstcContext,
        image: &ImageDescriptor<'_>,
        swizzle: &Swizzle,
        output: JobOutput<'_>,
        job: usize,
    ) -> Result<(), CodecStatus> {
        if job >= context.job_count {
            return Err(CodecStatus::BadParam);
        }

        let JobOutput { offset, bytes } = output;
        let (bw, bh) = context.config.block_dims();
        let blocks_x = blocks_along(image.width(), bw);
        let blocks_y = blocks_along(image.height(), bh);
        let row_bytes = blocks_x * BLOCK_BYTES;

        // Bands must start on a whole row of blocks
        if offset % row_bytes != 0 {
            return Err(CodecStatus::BadParam);
        }

        let first_row = offset / row_bytes;
        let rows = (bytes.len() / row_bytes).min(blocks_y.saturating_sub(first_row));

        let mut texels = Vec::with_capacity(context.encoder.texel_count());
        for row in 0..rows {
            let y0 = (first_row + row) as u32 * bh;
            for column in 0..blocks_x {
                let x0 = column as u32 * bw;

                texels.clear();
                for y in y0..y0 + bh {
                    for x in x0..x0 + bw {
                        texels.push(swizzle.apply(image.texel_clamped(x, y)));
                    }
                }

                let at = (row * blocks_x + column) * BLOCK_BYTES;
                bytes[at..at + BLOCK_BYTES].copy_from_slice(&context.encoder.encode(&texels));
            }
        }

        Ok(())
    }

    fn reset(&self, _context: &mut AstcContext) -> Result<(), CodecStatus> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::physical::tests::{unpack, Unpacked};
    use super::*;
    use crate::codec::Component;
    use crate::footprint::payload_size;

    fn context(block: u32, quality: f32, job_count: usize) -> AstcContext {
        let codec = AstcCodec::new();
        let config = codec
            .configure(Profile::Ldr, block, block, quality)
            .unwrap();
        codec.allocate(&config, job_count).unwrap()
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 12) as u8, (y * 12) as u8, 128, 255]);
            }
        }
        data
    }

    fn compress_all(ctx: &AstcContext, image: &ImageDescriptor<'_>, swizzle: &Swizzle) -> Vec<u8> {
        let (bw, bh) = ctx.config().block_dims();
        let mut out = vec![0u8; payload_size(image.width(), image.height(), bw, bh)];
        AstcCodec::new()
            .compress(
                ctx,
                image,
                swizzle,
                JobOutput {
                    offset: 0,
                    bytes: &mut out,
                },
                0,
            )
            .unwrap();
        out
    }

    #[test]
    fn test_configure_accepts_every_footprint() {
        let codec = AstcCodec::new();
        for (w, h) in FOOTPRINTS {
            let config = codec.configure(Profile::Ldr, w, h, 60.0).unwrap();
            assert_eq!(config.block_dims(), (w, h));
            assert_eq!(config.block_depth, 1);
            assert_eq!(config.flags, 0);
            assert!(codec.allocate(&config, 2).is_ok(), "{}x{}", w, h);
        }
    }

    #[test]
    fn test_configure_rejects_block_size() {
        let codec = AstcCodec::new();
        for (w, h) in [(3, 4), (4, 5), (7, 7), (8, 4), (14, 14)] {
            assert_eq!(
                codec.configure(Profile::Ldr, w, h, 60.0),
                Err(CodecStatus::BadBlockSize),
                "{}x{}",
                w,
                h
            );
        }
    }

    #[test]
    fn test_configure_rejects_quality() {
        let codec = AstcCodec::new();
        assert_eq!(
            codec.configure(Profile::Ldr, 4, 4, 101.0),
            Err(CodecStatus::BadQuality)
        );
        assert_eq!(
            codec.configure(Profile::Ldr, 4, 4, f32::NAN),
            Err(CodecStatus::BadQuality)
        );
    }

    #[test]
    fn test_configure_rejects_hdr() {
        let codec = AstcCodec::new();
        assert_eq!(
            codec.configure(Profile::Hdr, 4, 4, 60.0),
            Err(CodecStatus::BadProfile)
        );
    }

    #[test]
    fn test_allocate_rejects_zero_jobs() {
        let codec = AstcCodec::new();
        let config = codec.configure(Profile::Ldr, 4, 4, 60.0).unwrap();
        assert_eq!(
            codec.allocate(&config, 0).map(|_| ()),
            Err(CodecStatus::BadParam)
        );
    }

    #[test]
    fn test_compress_solid_image_repeats_block() {
        let ctx = context(4, 60.0, 1);
        let data = [200u8, 40, 90, 255].repeat(64);
        let image = ImageDescriptor::rgba8(8, 8, &data).unwrap();
        let out = compress_all(&ctx, &image, &Swizzle::IDENTITY);

        assert_eq!(out.len(), 64);
        for block in out.chunks_exact(BLOCK_BYTES) {
            let block: [u8; 16] = block.try_into().unwrap();
            assert_eq!(unpack(&block), Unpacked::Void([200, 40, 90, 255]));
        }
    }

    #[test]
    fn test_compress_writes_real_blocks_for_each_footprint() {
        // 20×20 leaves no edge block made only of clamped texels
        let data = gradient(20, 20);
        let image = ImageDescriptor::rgba8(20, 20, &data).unwrap();

        for block in [4, 5, 6, 8] {
            let ctx = context(block, 60.0, 1);
            let out = compress_all(&ctx, &image, &Swizzle::IDENTITY);
            assert_eq!(out.len(), payload_size(20, 20, block, block));

            for chunk in out.chunks_exact(BLOCK_BYTES) {
                let chunk: [u8; 16] = chunk.try_into().unwrap();
                match unpack(&chunk) {
                    Unpacked::Block {
                        grid,
                        endpoint_mode,
                        ..
                    } => {
                        assert!(grid.0 <= block && grid.1 <= block);
                        assert_eq!(endpoint_mode, 8, "opaque input");
                    }
                    Unpacked::Void(_) => panic!("{}x{} gradient block is not uniform", block, block),
                }
            }
        }
    }

    #[test]
    fn test_compress_bands_match_single_job() {
        let codec = AstcCodec::new();
        let data = gradient(16, 16);
        let image = ImageDescriptor::rgba8(16, 16, &data).unwrap();
        let size = payload_size(16, 16, 4, 4);

        let whole = compress_all(&context(4, 20.0, 1), &image, &Swizzle::IDENTITY);

        let split = context(4, 20.0, 2);
        let mut banded = vec![0u8; size];
        let (top, bottom) = banded.split_at_mut(size / 2);
        codec
            .compress(
                &split,
                &image,
                &Swizzle::IDENTITY,
                JobOutput {
                    offset: 0,
                    bytes: top,
                },
                0,
            )
            .unwrap();
        codec
            .compress(
                &split,
                &image,
                &Swizzle::IDENTITY,
                JobOutput {
                    offset: size / 2,
                    bytes: bottom,
                },
                1,
            )
            .unwrap();

        assert_eq!(whole, banded);
    }

    #[test]
    fn test_compress_partial_blocks_clamp_to_edge() {
        let ctx = context(6, 60.0, 1);
        // 7×7 image: the right and bottom blocks hold one real texel column/row
        let mut data = [0u8, 0, 0, 255].repeat(49);
        for y in 0..7 {
            let i = (y * 7 + 6) * 4;
            data[i..i + 4].copy_from_slice(&[10, 20, 30, 255]);
        }
        let image = ImageDescriptor::rgba8(7, 7, &data).unwrap();
        let out = compress_all(&ctx, &image, &Swizzle::IDENTITY);

        assert_eq!(out.len(), 4 * BLOCK_BYTES);
        let block = |i: usize| -> [u8; 16] { out[i * 16..(i + 1) * 16].try_into().unwrap() };
        // Right column replicates the edge texel across the whole block
        assert_eq!(unpack(&block(1)), Unpacked::Void([10, 20, 30, 255]));
        assert_eq!(unpack(&block(3)), Unpacked::Void([10, 20, 30, 255]));
        // Bottom-left block replicates the black bottom row
        assert_eq!(unpack(&block(2)), Unpacked::Void([0, 0, 0, 255]));
    }

    #[test]
    fn test_compress_applies_swizzle() {
        let ctx = context(4, 60.0, 1);
        let data = [10u8, 20, 30, 40].repeat(16);
        let image = ImageDescriptor::rgba8(4, 4, &data).unwrap();
        let swizzle = Swizzle {
            r: Component::A,
            g: Component::B,
            b: Component::G,
            a: Component::R,
        };
        let out = compress_all(&ctx, &image, &swizzle);
        let block: [u8; 16] = out[..16].try_into().unwrap();
        assert_eq!(unpack(&block), Unpacked::Void([40, 30, 20, 10]));
    }

    #[test]
    fn test_compress_empty_band_is_noop() {
        let codec = AstcCodec::new();
        let ctx = context(4, 60.0, 2);
        let data = gradient(8, 8);
        let image = ImageDescriptor::rgba8(8, 8, &data).unwrap();
        let mut out: [u8; 0] = [];

        let result = codec.compress(
            &ctx,
            &image,
            &Swizzle::IDENTITY,
            JobOutput {
                offset: 32,
                bytes: &mut out,
            },
            1,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_compress_rejects_misaligned_band() {
        let codec = AstcCodec::new();
        let ctx = context(4, 60.0, 2);
        let data = gradient(8, 8);
        let image = ImageDescriptor::rgba8(8, 8, &data).unwrap();
        let mut out = vec![0u8; 16];

        let result = codec.compress(
            &ctx,
            &image,
            &Swizzle::IDENTITY,
            JobOutput {
                offset: 16,
                bytes: &mut out,
            },
            1,
        );
        assert_eq!(result, Err(CodecStatus::BadParam));
    }

    #[test]
    fn test_compress_rejects_unknown_job() {
        let codec = AstcCodec::new();
        let ctx = context(4, 60.0, 1);
        let data = gradient(4, 4);
        let image = ImageDescriptor::rgba8(4, 4, &data).unwrap();
        let mut out = vec![0u8; 16];

        let result = codec.compress(
            &ctx,
            &image,
            &Swizzle::IDENTITY,
            JobOutput {
                offset: 0,
                bytes: &mut out,
            },
            1,
        );
        assert_eq!(result, Err(CodecStatus::BadParam));
    }

    #[test]
    fn test_reset_succeeds() {
        let codec = AstcCodec::new();
        let mut ctx = context(4, 60.0, 1);
        assert!(codec.reset(&mut ctx).is_ok());
        assert_eq!(ctx.job_count(), 1);
        assert_eq!(ctx.config().block_dims(), (4, 4));
        assert_eq!(ctx.encoder().block_dims(), (4, 4));
    }
}
