//! Pixel-level background removal over straight-alpha RGBA8 buffers.
//!
//! Stages, in order:
//!
//! 1. estimate the background color from the four corner blocks ([`estimate_background`])
//! 2. color-distance alpha mask ([`distance_alpha`])
//! 3. Sobel edge mask over the red channel ([`sobel_edges`])
//! 4. edges forced opaque, near-white forced transparent
//! 5. 3x3 erosion then 3x3 dilation of the alpha channel ([`erode3x3`], [`dilate3x3`])
//!
//! Everything here is pure; caching and IO live in [`crate::removal::engine`].

use crate::foundation::{
    core::Rgb8,
    error::{FigError, FigResult},
};

/// Side of the square block sampled from each corner.
pub const CORNER_SAMPLE: u32 = 10;
/// Distances below this are fully transparent.
pub const TRANSPARENT_DISTANCE: f64 = 30.0;
/// Distances at or above this are fully opaque.
pub const OPAQUE_DISTANCE: f64 = 50.0;
/// Alpha gained per unit of distance inside the ramp.
pub const ALPHA_RAMP: f64 = 12.75;
/// Sobel magnitude above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: f64 = 30.0;
/// Channels strictly above this on all of r, g, b are treated as background halo.
pub const NEAR_WHITE: u8 = 245;

/// Tunables for [`strip_background`]. Defaults are the named constants above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemovalParams {
    /// Corner block side.
    pub corner_sample: u32,
    /// Lower distance threshold.
    pub transparent_distance: f64,
    /// Upper distance threshold.
    pub opaque_distance: f64,
    /// Ramp slope between the thresholds.
    pub alpha_ramp: f64,
    /// Sobel threshold.
    pub edge_threshold: f64,
    /// Near-white channel cutoff.
    pub near_white: u8,
}

impl Default for RemovalParams {
    fn default() -> Self {
        Self {
            corner_sample: CORNER_SAMPLE,
            transparent_distance: TRANSPARENT_DISTANCE,
            opaque_distance: OPAQUE_DISTANCE,
            alpha_ramp: ALPHA_RAMP,
            edge_threshold: EDGE_THRESHOLD,
            near_white: NEAR_WHITE,
        }
    }
}

/// Run the full pipeline in place, rewriting only the alpha channel.
#[tracing::instrument(skip(img), fields(width = img.width(), height = img.height()))]
pub fn strip_background(img: &mut image::RgbaImage, params: &RemovalParams) -> FigResult<()> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(FigError::validation("cannot strip background of an empty image"));
    }

    let bg = estimate_background(img, params.corner_sample);
    let edges = sobel_edges(img, params.edge_threshold);

    let data: &mut [u8] = img;
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        let color = Rgb8::new(px[0], px[1], px[2]);
        px[3] = if edges[i] {
            255
        } else {
            distance_alpha(color.distance(bg), params)
        };
        if px[0] > params.near_white && px[1] > params.near_white && px[2] > params.near_white {
            px[3] = 0;
        }
    }

    let alpha: Vec<u8> = data.chunks_exact(4).map(|px| px[3]).collect();
    let eroded = erode3x3(&alpha, width, height);
    let opened = dilate3x3(&eroded, width, height);
    for_each_interior(width, height, |idx| data[idx * 4 + 3] = opened[idx]);

    tracing::trace!(?bg, "background stripped");
    Ok(())
}

/// Average RGB of the `sample x sample` blocks in the four corners, rounded to nearest.
///
/// Blocks are clipped to the image, so small images sample (and count) overlapping pixels more
/// than once.
pub fn estimate_background(img: &image::RgbaImage, sample: u32) -> Rgb8 {
    let (w, h) = img.dimensions();
    let sw = sample.min(w);
    let sh = sample.min(h);
    let xs = [(0, sw), (w - sw, w)];
    let ys = [(0, sh), (h - sh, h)];

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for &(y0, y1) in &ys {
        for &(x0, x1) in &xs {
            for y in y0..y1 {
                for x in x0..x1 {
                    let p = img.get_pixel(x, y).0;
                    sum[0] += u64::from(p[0]);
                    sum[1] += u64::from(p[1]);
                    sum[2] += u64::from(p[2]);
                    count += 1;
                }
            }
        }
    }
    if count == 0 {
        return Rgb8::default();
    }

    let avg = |s: u64| ((s as f64) / (count as f64)).round().clamp(0.0, 255.0) as u8;
    Rgb8::new(avg(sum[0]), avg(sum[1]), avg(sum[2]))
}

/// Alpha for a pixel at `distance` from the background color.
pub fn distance_alpha(distance: f64, params: &RemovalParams) -> u8 {
    if distance < params.transparent_distance {
        0
    } else if distance < params.opaque_distance {
        ((distance - params.transparent_distance) * params.alpha_ramp)
            .floor()
            .clamp(0.0, 255.0) as u8
    } else {
        255
    }
}

/// Sobel gradient magnitude over the red channel, thresholded.
///
/// The one-pixel border is never marked.
pub fn sobel_edges(img: &image::RgbaImage, threshold: f64) -> Vec<bool> {
    let (w, h) = img.dimensions();
    let data: &[u8] = img;
    let stride = w as usize;
    let red =
        |x: u32, y: u32| -> i32 { i32::from(data[(y as usize * stride + x as usize) * 4]) };

    let mut edges = vec![false; w as usize * h as usize];
    for_each_interior(w, h, |idx| {
        let x = (idx % w as usize) as u32;
        let y = (idx / w as usize) as u32;
        let gx = -red(x - 1, y - 1) - 2 * red(x - 1, y) - red(x - 1, y + 1)
            + red(x + 1, y - 1)
            + 2 * red(x + 1, y)
            + red(x + 1, y + 1);
        let gy = -red(x - 1, y - 1) - 2 * red(x, y - 1) - red(x + 1, y - 1)
            + red(x - 1, y + 1)
            + 2 * red(x, y + 1)
            + red(x + 1, y + 1);
        let magnitude = f64::from(gx * gx + gy * gy).sqrt();
        edges[idx] = magnitude > threshold;
    });
    edges
}

/// 3x3 minimum filter over interior pixels; border entries of the result are 0.
pub fn erode3x3(mask: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0u8; mask.len()];
    for_each_interior(width, height, |idx| {
        out[idx] = neighborhood(mask, width, idx).min().unwrap_or(0);
    });
    out
}

/// 3x3 maximum filter over interior pixels; border entries of the result are 0.
pub fn dilate3x3(mask: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![0u8; mask.len()];
    for_each_interior(width, height, |idx| {
        out[idx] = neighborhood(mask, width, idx).max().unwrap_or(0);
    });
    out
}

fn neighborhood(mask: &[u8], width: u32, idx: usize) -> impl Iterator<Item = u8> + '_ {
    let w = width as usize;
    [idx - w, idx, idx + w]
        .into_iter()
        .flat_map(move |row| [mask[row - 1], mask[row], mask[row + 1]])
}

fn for_each_interior(width: u32, height: u32, mut f: impl FnMut(usize)) {
    if width < 3 || height < 3 {
        return;
    }
    let w = width as usize;
    for y in 1..(height as usize - 1) {
        for x in 1..(w - 1) {
            f(y * w + x);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/removal/pipeline.rs"]
mod tests;
