//! Single-partition block fitting.
//!
//! Each block is fit with one color line. Endpoints start from the principal
//! axis of the block's texels and are refined by least squares against the
//! weights the decoder will actually see, so decimated grids are accounted
//! for. Uniform blocks are written as void-extent blocks.

use super::layout::{candidates, WeightLayout};
use super::physical;

/// Endpoint format of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// RGB endpoints, alpha decodes as 255.
    Rgb,
    /// RGBA endpoints.
    Rgba,
}

impl ColorFormat {
    /// Color endpoint mode stored in the block.
    pub fn endpoint_mode(self) -> u32 {
        match self {
            ColorFormat::Rgb => 8,
            ColorFormat::Rgba => 12,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            ColorFormat::Rgb => 3,
            ColorFormat::Rgba => 4,
        }
    }

    /// Number of stored endpoint values.
    pub fn endpoint_count(self) -> usize {
        self.channels() * 2
    }

    /// Weight bits left once the endpoints are stored at full precision.
    pub fn weight_budget(self) -> u32 {
        physical::PAYLOAD_BITS - self.endpoint_count() as u32 * 8
    }
}

/// Number of weight layouts tried per block at `quality`.
fn search_width(quality: f32) -> usize {
    match quality {
        q if q < 10.0 => 1,
        q if q < 60.0 => 2,
        q if q < 98.0 => 4,
        _ => 8,
    }
}

/// Endpoint refinement passes per layout at `quality`.
fn refine_iterations(quality: f32) -> usize {
    1 + (quality.clamp(0.0, 100.0) / 25.0) as usize
}

/// Encodes blocks of one footprint.
///
/// Built once per context; the candidate layouts and their infill tables
/// are shared by every job.
#[derive(Debug, Clone)]
pub struct BlockEncoder {
    block_width: u32,
    block_height: u32,
    rgb: Vec<WeightLayout>,
    rgba: Vec<WeightLayout>,
    iterations: usize,
}

impl BlockEncoder {
    /// Prepare an encoder, or `None` if no weight layout fits the footprint.
    pub fn new(block_width: u32, block_height: u32, quality: f32) -> Option<Self> {
        let width = search_width(quality);
        let mut rgb = candidates(block_width, block_height, ColorFormat::Rgb.weight_budget());
        let mut rgba = candidates(block_width, block_height, ColorFormat::Rgba.weight_budget());
        rgb.truncate(width);
        rgba.truncate(width);

        if rgb.is_empty() || rgba.is_empty() {
            return None;
        }

        Some(Self {
            block_width,
            block_height,
            rgb,
            rgba,
            iterations: refine_iterations(quality),
        })
    }

    pub fn block_dims(&self) -> (u32, u32) {
        (self.block_width, self.block_height)
    }

    pub fn texel_count(&self) -> usize {
        (self.block_width * self.block_height) as usize
    }

    /// Encode one block of texels in row-major order.
    pub fn encode(&self, texels: &[[u8; 4]]) -> [u8; 16] {
        let Some(&first) = texels.first() else {
            return physical::void_extent([0; 4]);
        };
        if texels.iter().all(|t| *t == first) {
            return physical::void_extent(first);
        }

        let (format, layouts) = if texels.iter().all(|t| t[3] == u8::MAX) {
            (ColorFormat::Rgb, &self.rgb)
        } else {
            (ColorFormat::Rgba, &self.rgba)
        };

        let mut best: Option<Fit<'_>> = None;
        for layout in layouts {
            let fit = fit_layout(texels, format, layout, self.iterations);
            if best.as_ref().map_or(true, |b| fit.error < b.error) {
                best = Some(fit);
            }
        }

        match best {
            Some(fit) => physical::pack(
                fit.layout,
                format.endpoint_mode(),
                &fit.endpoints[..format.endpoint_count()],
                &fit.weights,
            ),
            None => physical::void_extent(first),
        }
    }
}

/// Quantized endpoints and weights for one layout.
#[derive(Debug, Clone)]
struct Fit<'a> {
    layout: &'a WeightLayout,
    /// Interleaved `r0 r1 g0 g1 b0 b1 a0 a1`.
    endpoints: [u8; 8],
    weights: Vec<u8>,
    error: u64,
}

type Color = [f32; 4];

fn fit_layout<'a>(
    texels: &[[u8; 4]],
    format: ColorFormat,
    layout: &'a WeightLayout,
    iterations: usize,
) -> Fit<'a> {
    let channels = format.channels();
    let pixels: Vec<Color> = texels
        .iter()
        .map(|t| [t[0].into(), t[1].into(), t[2].into(), t[3].into()])
        .collect();

    let (low, high) = principal_endpoints(&pixels, channels);
    let mut best = quantize(texels, format, layout, low, high);

    for _ in 1..iterations {
        // Refit against the weights the decoder will interpolate with
        let grid: Vec<u8> = best
            .weights
            .iter()
            .map(|w| layout.range().unquantize(*w))
            .collect();
        let fractions: Vec<f32> = (0..pixels.len())
            .map(|i| layout.texel_weight(i, &grid) as f32 / 64.0)
            .collect();

        let Some((low, high)) = least_squares(&pixels, &fractions, channels) else {
            break;
        };

        let fit = quantize(texels, format, layout, low, high);
        if fit.error < best.error {
            best = fit;
        } else {
            break;
        }
    }

    best
}

fn to_endpoint(color: Color, format: ColorFormat) -> [u32; 4] {
    let mut out = [0u32; 4];
    for (c, value) in color.iter().enumerate() {
        out[c] = value.round().clamp(0.0, 255.0) as u32;
    }
    if format == ColorFormat::Rgb {
        out[3] = 255;
    }
    out
}

/// Quantize a color line to endpoints and grid weights.
fn quantize<'a>(
    texels: &[[u8; 4]],
    format: ColorFormat,
    layout: &'a WeightLayout,
    low: Color,
    high: Color,
) -> Fit<'a> {
    let channels = format.channels();
    let mut e0 = to_endpoint(low, format);
    let mut e1 = to_endpoint(high, format);

    let axis: Vec<f32> = (0..channels).map(|c| e1[c] as f32 - e0[c] as f32).collect();
    let length: f32 = axis.iter().map(|d| d * d).sum();

    let ideal: Vec<f32> = texels
        .iter()
        .map(|t| {
            if length <= f32::EPSILON {
                return 0.0;
            }
            let projected: f32 = (0..channels)
                .map(|c| (f32::from(t[c]) - e0[c] as f32) * axis[c])
                .sum();
            (projected / length).clamp(0.0, 1.0) * 64.0
        })
        .collect();

    let mut weights: Vec<u8> = decimate(layout, &ideal)
        .into_iter()
        .map(|w| layout.quantize(w))
        .collect();

    // Endpoint pairs whose second color sums lower decode blue-contracted
    let sum = |e: &[u32; 4]| e[0] + e[1] + e[2];
    if sum(&e1) < sum(&e0) {
        std::mem::swap(&mut e0, &mut e1);
        let max = layout.range().max_value();
        for w in &mut weights {
            *w = max - *w;
        }
    }

    let mut endpoints = [0u8; 8];
    for c in 0..4 {
        endpoints[2 * c] = e0[c] as u8;
        endpoints[2 * c + 1] = e1[c] as u8;
    }

    let decoded = reconstruct(layout, format, &endpoints, &weights);
    let error = texels
        .iter()
        .zip(&decoded)
        .map(|(a, b)| {
            a.iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = i64::from(*x) - i64::from(*y);
                    (d * d) as u64
                })
                .sum::<u64>()
        })
        .sum();

    Fit {
        layout,
        endpoints,
        weights,
        error,
    }
}

/// Average the per-texel ideal weights onto the grid points that feed them.
fn decimate(layout: &WeightLayout, ideal: &[f32]) -> Vec<f32> {
    let count = layout.weight_count();
    let mut sum = vec![0.0f32; count];
    let mut total = vec![0.0f32; count];

    for (texel, weight) in ideal.iter().enumerate() {
        for &(index, factor) in layout.contributions(texel) {
            sum[index] += factor as f32 * weight;
            total[index] += factor as f32;
        }
    }

    sum.iter()
        .zip(&total)
        .map(|(s, t)| if *t > 0.0 { s / t } else { 32.0 })
        .collect()
}

/// Endpoint colors as the decoder sees them.
fn decode_endpoints(format: ColorFormat, v: &[u8; 8]) -> ([u32; 4], [u32; 4]) {
    let v = (*v).map(u32::from);
    let (a0, a1) = match format {
        ColorFormat::Rgb => (255, 255),
        ColorFormat::Rgba => (v[6], v[7]),
    };

    if v[1] + v[3] + v[5] >= v[0] + v[2] + v[4] {
        ([v[0], v[2], v[4], a0], [v[1], v[3], v[5], a1])
    } else {
        let contract = |r: u32, g: u32, b: u32, a: u32| [(r + b) >> 1, (g + b) >> 1, b, a];
        (contract(v[1], v[3], v[5], a1), contract(v[0], v[2], v[4], a0))
    }
}

/// Decode the texels of a block from its endpoints and stored weights.
pub(crate) fn reconstruct(
    layout: &WeightLayout,
    format: ColorFormat,
    endpoints: &[u8; 8],
    weights: &[u8],
) -> Vec<[u8; 4]> {
    let (e0, e1) = decode_endpoints(format, endpoints);
    let grid: Vec<u8> = weights
        .iter()
        .map(|w| layout.range().unquantize(*w))
        .collect();

    (0..layout.texel_count())
        .map(|texel| {
            let w = layout.texel_weight(texel, &grid);
            let mut color = [0u8; 4];
            for c in 0..4 {
                let lerp = (e0[c] * 257 * (64 - w) + e1[c] * 257 * w + 32) >> 6;
                color[c] = (lerp >> 8) as u8;
            }
            color
        })
        .collect()
}

/// Endpoints spanning the texels along their principal axis.
fn principal_endpoints(pixels: &[Color], channels: usize) -> (Color, Color) {
    let n = pixels.len().max(1) as f32;
    let mut mean = [0.0f32; 4];
    for p in pixels {
        for c in 0..channels {
            mean[c] += p[c] / n;
        }
    }

    let mut covariance = [[0.0f32; 4]; 4];
    for p in pixels {
        for i in 0..channels {
            for j in 0..channels {
                covariance[i][j] += (p[i] - mean[i]) * (p[j] - mean[j]);
            }
        }
    }

    // Power iteration seeded with the column of the widest channel
    let widest = (0..channels)
        .max_by(|&a, &b| covariance[a][a].total_cmp(&covariance[b][b]))
        .unwrap_or(0);
    let mut axis = [0.0f32; 4];
    axis[..channels].copy_from_slice(&covariance[widest][..channels]);
    for _ in 0..8 {
        let mut next = [0.0f32; 4];
        for i in 0..channels {
            for j in 0..channels {
                next[i] += covariance[i][j] * axis[j];
            }
        }
        let norm = next.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            break;
        }
        axis = next.map(|v| v / norm);
    }

    let norm = axis.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return (mean, mean);
    }
    let axis = axis.map(|v| v / norm);

    let (mut t_min, mut t_max) = (f32::INFINITY, f32::NEG_INFINITY);
    for p in pixels {
        let t: f32 = (0..channels).map(|c| (p[c] - mean[c]) * axis[c]).sum();
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    let along = |t: f32| {
        let mut color = [255.0f32; 4];
        for c in 0..channels {
            color[c] = (mean[c] + axis[c] * t).clamp(0.0, 255.0);
        }
        color
    };
    (along(t_min), along(t_max))
}

/// Least-squares endpoints for texels at the given interpolation fractions.
fn least_squares(pixels: &[Color], fractions: &[f32], channels: usize) -> Option<(Color, Color)> {
    let (mut aa, mut ab, mut bb) = (0.0f32, 0.0f32, 0.0f32);
    let mut ax = [0.0f32; 4];
    let mut bx = [0.0f32; 4];

    for (p, &f) in pixels.iter().zip(fractions) {
        let a = 1.0 - f;
        aa += a * a;
        ab += a * f;
        bb += f * f;
        for c in 0..channels {
            ax[c] += a * p[c];
            bx[c] += f * p[c];
        }
    }

    let det = aa * bb - ab * ab;
    if det.abs() <= 1e-3 {
        return None;
    }

    let mut low = [255.0f32; 4];
    let mut high = [255.0f32; 4];
    for c in 0..channels {
        low[c] = ((bb * ax[c] - ab * bx[c]) / det).clamp(0.0, 255.0);
        high[c] = ((aa * bx[c] - ab * ax[c]) / det).clamp(0.0, 255.0);
    }
    Some((low, high))
}
