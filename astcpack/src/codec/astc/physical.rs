//! Bit layout of one 128-bit block.
//!
//! ```text
//! bit 0          11   13      17                        127
//!     │ mode     │ 00 │ CEM   │ endpoints ──►  ◄── weights │
//! ```
//!
//! Endpoint values are stored upwards from bit 17. Weights are stored
//! downwards from bit 127 with each value's bits reversed.

use super::layout::WeightLayout;

pub const BLOCK_BITS: u32 = 128;

/// First bit of the endpoint data in a single-partition block.
pub const ENDPOINT_START: u32 = 17;

/// Bits shared by endpoints and weights in a single-partition block.
pub const PAYLOAD_BITS: u32 = BLOCK_BITS - ENDPOINT_START;

/// Void-extent marker, LDR flag clear, reserved bits set.
const VOID_EXTENT_HEADER: u128 = 0x1FC | (0b11 << 10);

/// Extent coordinates all ones: the color covers the whole block.
const NO_EXTENT: u128 = ((1u128 << 52) - 1) << 12;

/// A block that decodes to `color` everywhere.
pub fn void_extent(color: [u8; 4]) -> [u8; 16] {
    let mut bits = VOID_EXTENT_HEADER | NO_EXTENT;
    for (channel, value) in color.iter().enumerate() {
        // UNORM16, so 0xAB becomes 0xABAB
        bits |= (u128::from(*value) * 257) << (64 + 16 * channel);
    }
    bits.to_le_bytes()
}

/// Pack a single-partition, single-plane block with 8-bit endpoints.
pub fn pack(
    layout: &WeightLayout,
    endpoint_mode: u32,
    endpoints: &[u8],
    weights: &[u8],
) -> [u8; 16] {
    let mut bits = u128::from(layout.block_mode()) | (u128::from(endpoint_mode & 0xF) << 13);

    for (i, value) in endpoints.iter().enumerate() {
        bits |= u128::from(*value) << (ENDPOINT_START + 8 * i as u32);
    }

    let width = layout.range().bits();
    for (k, weight) in weights.iter().enumerate() {
        for j in 0..width {
            if (weight >> j) & 1 == 1 {
                bits |= 1u128 << (BLOCK_BITS - 1 - (k as u32 * width + j));
            }
        }
    }

    bits.to_le_bytes()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::astc::layout::tests::decode_block_mode;
    use crate::codec::astc::layout::WeightRange;

    /// Fields of a packed block, read back from its bits.
    #[derive(Debug, PartialEq)]
    pub(crate) enum Unpacked {
        Void([u8; 4]),
        Block {
            grid: (u32, u32),
            range: WeightRange,
            endpoint_mode: u32,
            endpoints: Vec<u8>,
            weights: Vec<u8>,
        },
    }

    pub(crate) fn unpack(block: &[u8; 16]) -> Unpacked {
        let bits = u128::from_le_bytes(*block);
        if bits & 0x1FF == 0x1FC {
            assert_eq!(bits & (1 << 9), 0, "HDR void extent");
            assert_eq!((bits >> 10) & 0b11, 0b11);
            let channel = |c: u32| ((bits >> (64 + 16 * c)) >> 8) as u8;
            return Unpacked::Void([channel(0), channel(1), channel(2), channel(3)]);
        }

        let (gw, gh, r, h, dual) = decode_block_mode((bits & 0x7FF) as u16).unwrap();
        assert!(!dual);
        assert_eq!((bits >> 11) & 0b11, 0, "one partition");
        let range = WeightRange::ALL
            .into_iter()
            .find(|range| range.max_value() as u32 + 1 == levels(r, h))
            .unwrap();

        let endpoint_mode = ((bits >> 13) & 0xF) as u32;
        let endpoint_count = if endpoint_mode == 12 { 8 } else { 6 };
        let endpoints = (0..endpoint_count)
            .map(|i| (bits >> (ENDPOINT_START + 8 * i)) as u8)
            .collect();

        let width = range.bits();
        let weights = (0..gw * gh)
            .map(|k| {
                (0..width).fold(0u8, |value, j| {
                    let bit = (bits >> (BLOCK_BITS - 1 - (k * width + j))) & 1;
                    value | ((bit as u8) << j)
                })
            })
            .collect();

        Unpacked::Block {
            grid: (gw, gh),
            range,
            endpoint_mode,
            endpoints,
            weights,
        }
    }

    fn levels(r: u32, h: u32) -> u32 {
        match (r, h) {
            (2, 0) => 2,
            (4, 0) => 4,
            (7, 0) => 8,
            (4, 1) => 16,
            (7, 1) => 32,
            other => panic!("range {:?} is not stored as plain bits", other),
        }
    }

    #[test]
    fn test_void_extent_layout() {
        let block = void_extent([0x12, 0x34, 0x56, 0x78]);
        assert_eq!(block[0], 0xFC);
        assert_eq!(block[1], 0xFD);
        // No extent: bits 12..64 set
        assert!(block[2..8].iter().all(|&b| b == 0xFF));
        assert_eq!(&block[8..], &[0x12, 0x12, 0x34, 0x34, 0x56, 0x56, 0x78, 0x78]);
        assert_eq!(unpack(&block), Unpacked::Void([0x12, 0x34, 0x56, 0x78]));
    }

    #[test]
    fn test_pack_places_fields() {
        let layout = WeightLayout::new(4, 4, 4, 4, WeightRange::Levels4).unwrap();
        let endpoints = [1, 2, 3, 4, 5, 6, 7, 8];
        let weights: Vec<u8> = (0..16).map(|k| (k % 4) as u8).collect();
        let block = pack(&layout, 12, &endpoints, &weights);

        assert_eq!(
            unpack(&block),
            Unpacked::Block {
                grid: (4, 4),
                range: WeightRange::Levels4,
                endpoint_mode: 12,
                endpoints: endpoints.to_vec(),
                weights,
            }
        );

        // Endpoints fill bits 17..81 and weights fill bits 96..128
        let bits = u128::from_le_bytes(block);
        assert_eq!((bits >> 81) & ((1 << 15) - 1), 0);
    }

    #[test]
    fn test_first_weight_sits_in_top_bits() {
        let layout = WeightLayout::new(4, 4, 4, 4, WeightRange::Levels4).unwrap();
        let mut weights = vec![0u8; 16];
        weights[0] = 0b01;
        let block = pack(&layout, 12, &[0; 8], &weights);
        // Bit 0 of weight 0 lands on block bit 127
        assert_eq!(block[15], 0x80);
    }
}
