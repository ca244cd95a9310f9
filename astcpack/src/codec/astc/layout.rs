//! Weight grids and the block mode field.
//!
//! A block stores its weights on a grid that may be coarser than the block
//! footprint. Decoders bilinearly infill the grid back to one weight per
//! texel, so the encoder keeps the same infill table to evaluate its fits.

/// Most weights a single block may carry.
pub const MAX_WEIGHTS: u32 = 64;

/// Fewest weight bits a valid block may carry.
pub const MIN_WEIGHT_BITS: u32 = 24;

/// Most weight bits a valid block may carry.
pub const MAX_WEIGHT_BITS: u32 = 96;

/// Weight ranges whose values are stored as plain bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightRange {
    Levels2,
    Levels4,
    Levels8,
    Levels16,
    Levels32,
}

impl WeightRange {
    pub const ALL: [WeightRange; 5] = [
        WeightRange::Levels2,
        WeightRange::Levels4,
        WeightRange::Levels8,
        WeightRange::Levels16,
        WeightRange::Levels32,
    ];

    /// Bits per stored weight.
    pub fn bits(self) -> u32 {
        match self {
            WeightRange::Levels2 => 1,
            WeightRange::Levels4 => 2,
            WeightRange::Levels8 => 3,
            WeightRange::Levels16 => 4,
            WeightRange::Levels32 => 5,
        }
    }

    /// Largest stored weight value.
    pub fn max_value(self) -> u8 {
        ((1u32 << self.bits()) - 1) as u8
    }

    /// The `R` and `H` fields of the block mode for this range.
    fn mode_fields(self) -> (u32, u32) {
        match self {
            WeightRange::Levels2 => (2, 0),
            WeightRange::Levels4 => (4, 0),
            WeightRange::Levels8 => (7, 0),
            WeightRange::Levels16 => (4, 1),
            WeightRange::Levels32 => (7, 1),
        }
    }

    /// Expand a stored weight to the 0..=64 interpolation range.
    ///
    /// The value is bit-replicated to six bits and values above 32 are
    /// bumped by one so the top of the range lands on 64.
    pub fn unquantize(self, value: u8) -> u8 {
        let bits = self.bits();
        let value = u32::from(value) & u32::from(self.max_value());
        let mut replicated = 0u32;
        let mut filled = 0;
        while filled < 6 {
            replicated = (replicated << bits) | value;
            filled += bits;
        }
        replicated >>= filled - 6;
        if replicated > 32 {
            replicated as u8 + 1
        } else {
            replicated as u8
        }
    }

    /// Every unquantized level, indexed by stored value.
    pub fn levels(self) -> Vec<u8> {
        (0..=self.max_value()).map(|v| self.unquantize(v)).collect()
    }
}

/// Encode the 11-bit block mode for a single-plane 2D weight grid.
///
/// Returns `None` for grids that have no encoding.
pub fn block_mode(grid_width: u32, grid_height: u32, range: WeightRange) -> Option<u16> {
    let (r, h) = range.mode_fields();
    let fields = ((r >> 1) & 0b11) | ((r & 1) << 4) | (h << 9);

    let (w, gh) = (grid_width, grid_height);
    let layout = match (w, gh) {
        (4..=7, 2..=5) => ((gh - 2) << 5) | ((w - 4) << 7),
        (8..=11, 2..=5) => (0b01 << 2) | ((gh - 2) << 5) | ((w - 8) << 7),
        (2..=5, 8..=11) => (0b10 << 2) | ((w - 2) << 5) | ((gh - 8) << 7),
        (2..=5, 6..=7) => (0b11 << 2) | ((w - 2) << 5) | ((gh - 6) << 7),
        (2..=3, 2..=5) => (0b11 << 2) | ((gh - 2) << 5) | ((w - 2) << 7) | (1 << 8),
        _ => return None,
    };

    Some((fields | layout) as u16)
}

/// A weight grid, its range and the infill table for one block footprint.
#[derive(Debug, Clone)]
pub struct WeightLayout {
    grid_width: u32,
    grid_height: u32,
    range: WeightRange,
    block_mode: u16,
    levels: Vec<u8>,
    /// Per texel: `(grid index, factor in sixteenths)`.
    infill: Vec<Vec<(usize, u32)>>,
}

impl WeightLayout {
    /// Build a layout, or `None` if the grid cannot be stored in a block of
    /// `block_width`×`block_height` texels.
    pub fn new(
        block_width: u32,
        block_height: u32,
        grid_width: u32,
        grid_height: u32,
        range: WeightRange,
    ) -> Option<Self> {
        if block_width < 2 || block_height < 2 {
            return None;
        }
        if grid_width > block_width || grid_height > block_height {
            return None;
        }

        let count = grid_width * grid_height;
        let bits = count * range.bits();
        if count > MAX_WEIGHTS || !(MIN_WEIGHT_BITS..=MAX_WEIGHT_BITS).contains(&bits) {
            return None;
        }

        let block_mode = block_mode(grid_width, grid_height, range)?;

        Some(Self {
            grid_width,
            grid_height,
            range,
            block_mode,
            levels: range.levels(),
            infill: infill_table(block_width, block_height, grid_width, grid_height),
        })
    }

    pub fn grid_dims(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn range(&self) -> WeightRange {
        self.range
    }

    pub fn block_mode(&self) -> u16 {
        self.block_mode
    }

    pub fn weight_count(&self) -> usize {
        (self.grid_width * self.grid_height) as usize
    }

    pub fn weight_bits(&self) -> u32 {
        self.grid_width * self.grid_height * self.range.bits()
    }

    pub fn texel_count(&self) -> usize {
        self.infill.len()
    }

    /// Grid points feeding `texel` and their factors in sixteenths.
    pub fn contributions(&self, texel: usize) -> &[(usize, u32)] {
        self.infill.get(texel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stored value whose level is closest to `weight` (0.0..=64.0).
    pub fn quantize(&self, weight: f32) -> u8 {
        let mut best = 0u8;
        let mut best_distance = f32::INFINITY;
        for (value, level) in self.levels.iter().enumerate() {
            let distance = (f32::from(*level) - weight).abs();
            if distance < best_distance {
                best = value as u8;
                best_distance = distance;
            }
        }
        best
    }

    /// Infilled weight of `texel` given unquantized grid weights.
    pub fn texel_weight(&self, texel: usize, grid: &[u8]) -> u32 {
        let sum: u32 = self
            .contributions(texel)
            .iter()
            .map(|&(index, factor)| u32::from(grid.get(index).copied().unwrap_or(0)) * factor)
            .sum();
        (sum + 8) >> 4
    }
}

fn infill_table(
    block_width: u32,
    block_height: u32,
    grid_width: u32,
    grid_height: u32,
) -> Vec<Vec<(usize, u32)>> {
    let ds = (1024 + block_width / 2) / (block_width - 1);
    let dt = (1024 + block_height / 2) / (block_height - 1);
    let count = (grid_width * grid_height) as usize;
    let stride = grid_width as usize;

    let mut table = Vec::with_capacity((block_width * block_height) as usize);
    for t in 0..block_height {
        for s in 0..block_width {
            let gs = (ds * s * (grid_width - 1) + 32) >> 6;
            let gt = (dt * t * (grid_height - 1) + 32) >> 6;
            let (js, fs) = ((gs >> 4) as usize, (gs & 0xF) as i32);
            let (jt, ft) = ((gt >> 4) as usize, (gt & 0xF) as i32);

            let w11 = (fs * ft + 8) >> 4;
            let w10 = ft - w11;
            let w01 = fs - w11;
            let w00 = 16 + w11 - fs - ft;

            let base = js + jt * stride;
            let taps = [
                (base, w00),
                (base + 1, w01),
                (base + stride, w10),
                (base + stride + 1, w11),
            ];
            table.push(
                taps.into_iter()
                    .filter(|&(index, factor)| factor > 0 && index < count)
                    .map(|(index, factor)| (index, factor as u32))
                    .collect(),
            );
        }
    }
    table
}

/// Every storable layout for a footprint whose weights fit in `budget` bits.
///
/// Finer grids with at least two bits per weight come first, then more
/// weight bits. The order is deterministic.
pub fn candidates(block_width: u32, block_height: u32, budget: u32) -> Vec<WeightLayout> {
    let mut layouts = Vec::new();
    for grid_height in 2..=block_height {
        for grid_width in 2..=block_width {
            for range in WeightRange::ALL {
                if let Some(layout) =
                    WeightLayout::new(block_width, block_height, grid_width, grid_height, range)
                {
                    if layout.weight_bits() <= budget {
                        layouts.push(layout);
                    }
                }
            }
        }
    }

    layouts.sort_by(|a, b| {
        let coarse = |l: &WeightLayout| l.range == WeightRange::Levels2;
        coarse(a)
            .cmp(&coarse(b))
            .then(b.weight_count().cmp(&a.weight_count()))
            .then(b.weight_bits().cmp(&a.weight_bits()))
            .then(a.grid_height.cmp(&b.grid_height))
            .then(a.grid_width.cmp(&b.grid_width))
    });
    layouts
}
