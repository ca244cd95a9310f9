//! ASTC block footprints and payload sizing.
//!
//! Every ASTC block occupies 16 bytes regardless of its footprint, so the
//! payload size of a texture only depends on how many blocks cover it.

use std::fmt;
use std::str::FromStr;

/// Size of one compressed ASTC block in bytes.
pub const BLOCK_BYTES: usize = 16;

/// Number of blocks needed to cover `extent` pixels with blocks of `block` pixels.
pub fn blocks_along(extent: u32, block: u32) -> usize {
    if block == 0 {
        return 0;
    }
    extent.div_ceil(block) as usize
}

/// Calculate the compressed payload size for a single-slice texture.
///
/// Partial blocks at the right and bottom edges count as whole blocks.
///
/// # Example
///
/// ```
/// use astcpack::footprint::payload_size;
///
/// // 8×8 image in 4×4 blocks: 2×2 blocks of 16 bytes
/// assert_eq!(payload_size(8, 8, 4, 4), 64);
/// // 10×10 image in 4×4 blocks rounds up to 3×3 blocks
/// assert_eq!(payload_size(10, 10, 4, 4), 144);
/// ```
pub fn payload_size(width: u32, height: u32, block_width: u32, block_height: u32) -> usize {
    blocks_along(width, block_width) * blocks_along(height, block_height) * BLOCK_BYTES
}

/// Square block footprints used by the asset pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFootprint {
    /// 4×4 texels per block (8.00 bpp)
    B4x4,
    /// 5×5 texels per block (5.12 bpp)
    B5x5,
    /// 6×6 texels per block (3.56 bpp)
    B6x6,
    /// 8×8 texels per block (2.00 bpp)
    B8x8,
}

impl BlockFootprint {
    /// All supported footprints, from highest to lowest bit rate.
    pub const ALL: [BlockFootprint; 4] = [
        BlockFootprint::B4x4,
        BlockFootprint::B5x5,
        BlockFootprint::B6x6,
        BlockFootprint::B8x8,
    ];

    /// Look up the footprint for the given block dimensions.
    pub fn from_dims(block_width: u32, block_height: u32) -> Option<Self> {
        match (block_width, block_height) {
            (4, 4) => Some(BlockFootprint::B4x4),
            (5, 5) => Some(BlockFootprint::B5x5),
            (6, 6) => Some(BlockFootprint::B6x6),
            (8, 8) => Some(BlockFootprint::B8x8),
            _ => None,
        }
    }

    /// Block dimensions as `(width, height)` in texels.
    pub fn dims(&self) -> (u32, u32) {
        match self {
            BlockFootprint::B4x4 => (4, 4),
            BlockFootprint::B5x5 => (5, 5),
            BlockFootprint::B6x6 => (6, 6),
            BlockFootprint::B8x8 => (8, 8),
        }
    }

    /// Bits stored per texel at this footprint.
    pub fn bits_per_pixel(&self) -> f32 {
        let (w, h) = self.dims();
        (BLOCK_BYTES * 8) as f32 / (w * h) as f32
    }

    /// Payload size of a `width`×`height` texture at this footprint.
    pub fn payload_size(&self, width: u32, height: u32) -> usize {
        let (bw, bh) = self.dims();
        payload_size(width, height, bw, bh)
    }
}

impl fmt::Display for BlockFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dims();
        write!(f, "{}x{}", w, h)
    }
}

/// Error returned when parsing a footprint string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported block footprint '{0}' (expected one of 4x4, 5x5, 6x6, 8x8)")]
pub struct ParseFootprintError(pub String);

impl FromStr for BlockFootprint {
    type Err = ParseFootprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFootprintError(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let w: u32 = w.trim().parse().map_err(|_| err())?;
        let h: u32 = h.trim().parse().map_err(|_| err())?;
        BlockFootprint::from_dims(w, h).ok_or_else(err)
    }
}
