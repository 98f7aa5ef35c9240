//! Parameter types for crop rendering.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! [`operations`](super::operations) module (which decides the geometry) and
//! the [`backend`](super::backend) (which does the pixel work), so a mock
//! backend can stand in during tests.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1 to 100). Crops always encode at [`Quality::MAX`].
//! - [`CropRect`]: A rectangle in pixel space, as reported by the crop surface.
//! - [`DisplayMetrics`]: Size the image was shown at, plus device pixel ratio.
//! - [`RenderParams`]: Fully resolved job for the backend: natural-space source rect and output surface size.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}

/// A crop rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Positive, finite extent. Origins may be anything finite.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// How the source image was displayed while the user picked the crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    /// Displayed `(width, height)`. `None` means the image was shown at its
    /// natural size, so no rescaling applies.
    pub display_size: Option<(f64, f64)>,
    pub device_pixel_ratio: f64,
}

impl DisplayMetrics {
    pub fn natural() -> Self {
        Self {
            display_size: None,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn with_display_size(mut self, width: f64, height: f64) -> Self {
        self.display_size = Some((width, height));
        self
    }

    /// Pixel ratio with non-finite or non-positive values treated as 1,
    /// matching `window.devicePixelRatio || 1`.
    pub fn effective_pixel_ratio(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self::natural()
    }
}

/// A resolved crop job for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Source region in natural image pixels.
    pub source: CropRect,
    /// Output surface dimensions in device pixels.
    pub output_width: u32,
    pub output_height: u32,
    /// Media type to encode as.
    pub media_type: String,
    pub quality: Quality,
}
