//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::load_from_memory` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resample | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder` at `CompressionType::Best` |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → TIFF, BMP, GIF | `DynamicImage::write_to` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{MAX_SURFACE_SIDE, clamp_to_bounds, surface_within_limit};
use super::params::{Quality, RenderParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an in-memory image. Zero-sized results count as load failures.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| BackendError::ImageLoad(format!("decode failed: {e}")))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BackendError::ImageLoad("image has no pixels".into()));
    }
    Ok(img)
}

/// Draw the source region onto a surface of the requested size.
///
/// When the requested region overhangs the image, the overhang stays
/// transparent and the visible part lands where it would on a canvas.
fn draw_region(img: &DynamicImage, params: &RenderParams) -> Result<DynamicImage, BackendError> {
    let (out_w, out_h) = (params.output_width, params.output_height);
    if out_w == 0 || out_h == 0 {
        return Err(BackendError::Draw(format!(
            "output surface is empty ({out_w}x{out_h})"
        )));
    }
    if !surface_within_limit((out_w, out_h)) {
        return Err(BackendError::Draw(format!(
            "output surface too large ({out_w}x{out_h}, max {MAX_SURFACE_SIDE}x{MAX_SURFACE_SIDE})"
        )));
    }

    let src = params.source;
    let (x, y, w, h) = clamp_to_bounds(src, (img.width(), img.height())).ok_or_else(|| {
        BackendError::Draw("crop area lies outside the image".into())
    })?;

    let scale_x = out_w as f64 / src.width;
    let scale_y = out_h as f64 / src.height;
    let dest_x = ((x as f64 - src.x) * scale_x).round() as i64;
    let dest_y = ((y as f64 - src.y) * scale_y).round() as i64;
    let dest_w = ((w as f64 * scale_x).round() as u32).max(1);
    let dest_h = ((h as f64 * scale_y).round() as u32).max(1);

    let region = img.crop_imm(x, y, w, h);

    if dest_x == 0 && dest_y == 0 && dest_w == out_w && dest_h == out_h {
        return Ok(region.resize_exact(out_w, out_h, FilterType::Lanczos3));
    }

    let resampled = region.resize_exact(dest_w, dest_h, FilterType::Lanczos3);
    let mut surface = RgbaImage::new(out_w, out_h);
    image::imageops::overlay(&mut surface, &resampled.to_rgba8(), dest_x, dest_y);
    Ok(DynamicImage::ImageRgba8(surface))
}

/// Encode with the format named by `media_type`.
///
/// Unknown or non-writable types fall back to PNG bytes.
fn encode(img: &DynamicImage, media_type: &str, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let format = ImageFormat::from_mime_type(media_type)
        .filter(|f| f.writing_enabled())
        .unwrap_or(ImageFormat::Png);

    let mut buf = Vec::new();
    let encoded = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
        }
        ImageFormat::WebP => {
            let encoder = WebPEncoder::new_lossless(&mut buf);
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)
        }
        other => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut Cursor::new(&mut buf), other),
    };

    encoded.map_err(|e| BackendError::Encode(format!("{format:?} encode failed: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::ImageLoad(format!("failed to read dimensions: {e}")))?;
        if width == 0 || height == 0 {
            return Err(BackendError::ImageLoad("image has no pixels".into()));
        }
        Ok(Dimensions { width, height })
    }

    fn render(&self, bytes: &[u8], params: &RenderParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(bytes)?;
        let surface = draw_region(&img, params)?;
        encode(&surface, &params.media_type, params.quality)
    }
}
