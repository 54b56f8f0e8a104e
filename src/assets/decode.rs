use std::io::Cursor;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::error::{FigError, FigResult};

/// MIME prefix of the data URLs produced for processed images.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP) into straight-alpha RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> FigResult<image::RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| FigError::decode(format!("decode image from memory: {e}")))?;
    Ok(dyn_img.to_rgba8())
}

/// Encode a straight-alpha RGBA8 buffer as PNG bytes.
pub fn encode_png(img: &image::RgbaImage) -> FigResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Wrap PNG bytes into a `data:image/png;base64,` URL.
pub fn png_data_url(png: &[u8]) -> String {
    let mut out = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len().div_ceil(3) * 4);
    out.push_str(PNG_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(png, &mut out);
    out
}

/// Return `true` for `data:` URLs.
pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// Extract the payload bytes of a base64 `data:` URL.
///
/// Only the `;base64` form is accepted; the media type is not checked since the bytes are
/// sniffed by the decoder anyway.
pub fn parse_data_url(url: &str) -> FigResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| FigError::validation("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| FigError::validation("data URL has no payload separator"))?;
    if !meta.ends_with(";base64") {
        return Err(FigError::validation("only base64 data URLs are supported"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| FigError::decode(format!("invalid base64 payload: {e}")))
}

/// Convert straight RGBA8 to premultiplied in place.
pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Convert premultiplied RGBA8 back to straight alpha in place.
pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
