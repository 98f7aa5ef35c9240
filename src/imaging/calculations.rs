//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! The order of operations mirrors how a 2D canvas would draw the crop:
//! scale factors first, then the natural-space rectangle, then the
//! density-aware output surface.

use super::params::CropRect;

/// Base width of a preview thumbnail, in CSS pixels.
pub const PREVIEW_BASE_WIDTH: u32 = 120;

/// Largest output surface side the rasterizer will allocate.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Scale factors mapping display space to natural pixel space.
///
/// # Examples
/// ```
/// # use cropstage::imaging::scale_factors;
/// // 2000x1000 image shown at 1000x500 → everything doubles
/// assert_eq!(scale_factors((2000, 1000), (1000.0, 500.0)), (2.0, 2.0));
/// ```
pub fn scale_factors(natural: (u32, u32), display: (f64, f64)) -> (f64, f64) {
    let (nat_w, nat_h) = natural;
    let (disp_w, disp_h) = display;
    (nat_w as f64 / disp_w, nat_h as f64 / disp_h)
}

/// Map a display-space rectangle into natural pixel space.
///
/// Origin and extent are both multiplied by the per-axis scale.
pub fn to_natural_rect(rect: CropRect, scale: (f64, f64)) -> CropRect {
    let (scale_x, scale_y) = scale;
    CropRect {
        x: rect.x * scale_x,
        y: rect.y * scale_y,
        width: rect.width * scale_x,
        height: rect.height * scale_y,
    }
}

/// Output surface size for a crop at the given device pixel ratio.
///
/// Fractional results are truncated, the way a canvas truncates assigned
/// dimensions.
pub fn output_surface_size(rect: CropRect, pixel_ratio: f64) -> (u32, u32) {
    let w = (rect.width * pixel_ratio).floor().max(0.0) as u32;
    let h = (rect.height * pixel_ratio).floor().max(0.0) as u32;
    (w, h)
}

/// Whether an output surface is small enough to allocate.
///
/// Surfaces computed from huge rectangles saturate at `u32::MAX` and land
/// outside the limit.
pub fn surface_within_limit(size: (u32, u32)) -> bool {
    size.0 <= MAX_SURFACE_SIDE && size.1 <= MAX_SURFACE_SIDE
}

/// Integer pixel region `(x, y, width, height)` of `rect` that lies inside
/// an image of `bounds` size. Returns `None` if nothing overlaps.
pub fn clamp_to_bounds(rect: CropRect, bounds: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let (bound_w, bound_h) = (bounds.0 as f64, bounds.1 as f64);

    let x0 = rect.x.max(0.0).floor();
    let y0 = rect.y.max(0.0).floor();
    let x1 = (rect.x + rect.width).min(bound_w).ceil();
    let y1 = (rect.y + rect.height).min(bound_h).ceil();

    if x1 <= x0 || y1 <= y0 || x0 >= bound_w || y0 >= bound_h {
        return None;
    }

    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Largest `(width, height)` with the given aspect ratio that fits inside
/// `media`.
pub fn fit_aspect(media: (f64, f64), aspect: f64) -> (f64, f64) {
    let (media_w, media_h) = media;
    if media_w >= media_h * aspect {
        // Media is wider than the target: height is the limit
        (media_h * aspect, media_h)
    } else {
        (media_w, media_w / aspect)
    }
}

/// Crop rectangle selected by a pan/zoom view over displayed media.
///
/// At zoom 1 the window is the largest `aspect` rectangle inside the media,
/// centred. Zooming shrinks the window; panning by `position` moves the media
/// under a fixed window, so the window moves by `-position / zoom`. The result
/// is clamped to stay inside the media. Without an aspect the media's own
/// aspect is used.
pub fn crop_area_for_view(
    media: (f64, f64),
    aspect: Option<f64>,
    position: (f64, f64),
    zoom: f64,
) -> CropRect {
    let (media_w, media_h) = media;
    let aspect = aspect
        .filter(|a| a.is_finite() && *a > 0.0)
        .unwrap_or(media_w / media_h);
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };

    let (fit_w, fit_h) = fit_aspect(media, aspect);
    let width = fit_w / zoom;
    let height = fit_h / zoom;

    let center_x = media_w / 2.0 - position.0 / zoom;
    let center_y = media_h / 2.0 - position.1 / zoom;

    let x = (center_x - width / 2.0).clamp(0.0, (media_w - width).max(0.0));
    let y = (center_y - height / 2.0).clamp(0.0, (media_h - height).max(0.0));

    CropRect {
        x,
        y,
        width,
        height,
    }
}

/// Preview thumbnail box: fixed base width, height following the crop aspect.
pub fn preview_size(aspect: Option<f64>) -> (u32, u32) {
    match aspect.filter(|a| a.is_finite() && *a > 0.0) {
        Some(a) => (
            PREVIEW_BASE_WIDTH,
            (PREVIEW_BASE_WIDTH as f64 / a).round() as u32,
        ),
        None => (PREVIEW_BASE_WIDTH, PREVIEW_BASE_WIDTH),
    }
}
