//! Crop rasterization in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop + resample** | `crop_imm` + `resize_exact` (Lanczos3) |
//! | **Encode** | original media type at maximum quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing a render job
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`render`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    MAX_SURFACE_SIDE, PREVIEW_BASE_WIDTH, crop_area_for_view, fit_aspect, output_surface_size,
    preview_size, scale_factors, surface_within_limit, to_natural_rect,
};
pub use operations::{get_dimensions, plan_render, render};
pub use params::{CropRect, DisplayMetrics, Quality, RenderParams};
pub use rust_backend::RustBackend;
