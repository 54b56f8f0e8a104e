//! Flatten placed parts into one raster.
//!
//! Parts are drawn bottom to top in `layer` order with `vello_cpu`. Each image is stretched into
//! a `part_box`-sided square centered on the part origin, then mapped through the part transform.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    assets::{
        decode,
        fetch::{ImageFetcher, load_rgba},
    },
    compose::part::PlacedPart,
    config::ExportSettings,
    foundation::{
        core::Affine,
        error::{FigError, FigResult},
    },
};

/// Default file name for exported compositions.
pub const EXPORT_FILE_NAME: &str = "minifig-composition.png";

/// Straight-alpha RGBA8 raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8, not premultiplied.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Copy into an `image` buffer.
    pub fn to_image(&self) -> FigResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| FigError::render("frame byte length does not match its dimensions"))
    }
}

/// Encode a frame as PNG bytes.
pub fn encode_png(frame: &FrameRGBA) -> FigResult<Vec<u8>> {
    decode::encode_png(&frame.to_image()?)
}

/// Rasterize `parts` onto a fresh canvas.
///
/// Images are fetched in parallel. A part whose image cannot be loaded is skipped; raster
/// failures are returned as [`FigError::Render`].
#[tracing::instrument(skip(parts, fetcher, settings), fields(count = parts.len()))]
pub fn export_composition(
    parts: &[PlacedPart],
    fetcher: &dyn ImageFetcher,
    settings: &ExportSettings,
) -> FigResult<FrameRGBA> {
    let width: u16 = settings
        .canvas
        .width
        .try_into()
        .map_err(|_| FigError::render("canvas width exceeds u16"))?;
    let height: u16 = settings
        .canvas
        .height
        .try_into()
        .map_err(|_| FigError::render("canvas height exceeds u16"))?;
    if width == 0 || height == 0 {
        return Err(FigError::render("canvas dimensions must be > 0"));
    }

    let mut ordered: Vec<&PlacedPart> = parts.iter().collect();
    ordered.sort_by_key(|p| p.layer);

    let loaded: Vec<Option<vello_cpu::Image>> = ordered
        .par_iter()
        .map(|part| {
            let url = part.display_url(settings.view);
            match load_rgba(fetcher, url).and_then(|img| image_paint(&img)) {
                Ok(paint) => Some(paint),
                Err(err) => {
                    tracing::debug!(id = %part.id, %url, error = %err, "skipping part image");
                    None
                }
            }
        })
        .collect();

    let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    if let Some([r, g, b, a]) = settings.clear_rgba {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&full);
    }

    let mut drawn = 0usize;
    for (part, paint) in ordered.iter().zip(loaded) {
        let Some(paint) = paint else { continue };
        let (w, h) = image_paint_size(&paint)?;
        ctx.set_transform(affine_to_cpu(part_affine(part, settings.part_box, w, h)));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        drawn += 1;
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);

    let mut data = pixmap.data_as_u8_slice().to_vec();
    decode::unpremultiply_rgba8_in_place(&mut data);
    tracing::debug!(drawn, "composition rasterized");

    Ok(FrameRGBA {
        width: u32::from(width),
        height: u32::from(height),
        data,
    })
}

/// Maps image pixel space `(0, 0, w, h)` onto the part box `(-box/2, -box/2, box, box)`, then
/// through the part transform.
fn part_affine(part: &PlacedPart, part_box: f64, w: f64, h: f64) -> Affine {
    let half = part_box / 2.0;
    part.transform()
        * Affine::translate((-half, -half))
        * Affine::scale_non_uniform(part_box / w, part_box / h)
}

fn image_paint(img: &image::RgbaImage) -> FigResult<vello_cpu::Image> {
    let w: u16 = img
        .width()
        .try_into()
        .map_err(|_| FigError::render("image width exceeds u16"))?;
    let h: u16 = img
        .height()
        .try_into()
        .map_err(|_| FigError::render("image height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(FigError::render("image has no pixels"));
    }

    let mut premul = img.as_raw().clone();
    decode::premultiply_rgba8_in_place(&mut premul);

    let mut may_have_opacities = false;
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_paint_size(image: &vello_cpu::Image) -> FigResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => {
            Err(FigError::render("opaque image ids are not supported"))
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
