//! High-level crop rendering.
//!
//! [`render`] is the crop rasterizer: it resolves the geometry with the pure
//! [`calculations`](super::calculations), hands a [`RenderParams`] job to the
//! backend, and wraps the encoded bytes as a new file carrying the original
//! name and media type.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    MAX_SURFACE_SIDE, output_surface_size, scale_factors, surface_within_limit, to_natural_rect,
};
use super::params::{CropRect, DisplayMetrics, Quality, RenderParams};
use crate::types::CandidateFile;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(
    backend: &(impl ImageBackend + ?Sized),
    file: &CandidateFile,
) -> Result<(u32, u32)> {
    let dims = backend.identify(&file.bytes)?;
    Ok((dims.width, dims.height))
}

/// Plan a render without executing it.
///
/// The display-space rectangle is scaled into natural pixels for the source
/// region, while the output surface keeps the display-space extent multiplied
/// by the device pixel ratio. Surfaces larger than [`MAX_SURFACE_SIDE`] on
/// either side are refused with [`BackendError::Draw`].
pub fn plan_render(
    natural: Dimensions,
    rect: CropRect,
    metrics: &DisplayMetrics,
    media_type: &str,
) -> Result<RenderParams> {
    let display = metrics
        .display_size
        .unwrap_or((natural.width as f64, natural.height as f64));
    if !(display.0 > 0.0 && display.1 > 0.0) {
        return Err(BackendError::ImageLoad(format!(
            "display size must be positive, got {}x{}",
            display.0, display.1
        )));
    }

    let scale = scale_factors((natural.width, natural.height), display);
    let source = to_natural_rect(rect, scale);
    let (output_width, output_height) = output_surface_size(rect, metrics.effective_pixel_ratio());
    if !surface_within_limit((output_width, output_height)) {
        return Err(BackendError::Draw(format!(
            "output surface too large ({output_width}x{output_height}, max {MAX_SURFACE_SIDE}x{MAX_SURFACE_SIDE})"
        )));
    }

    Ok(RenderParams {
        source,
        output_width,
        output_height,
        media_type: media_type.to_string(),
        quality: Quality::MAX,
    })
}

/// Crop `file` to `rect` and encode the result as a new file.
///
/// Fails without touching the backend when the rectangle has no area.
pub fn render(
    backend: &(impl ImageBackend + ?Sized),
    file: &CandidateFile,
    rect: CropRect,
    metrics: &DisplayMetrics,
) -> Result<CandidateFile> {
    if !rect.is_valid() {
        return Err(BackendError::InvalidCrop);
    }

    let natural = backend.identify(&file.bytes)?;
    let params = plan_render(natural, rect, metrics, &file.media_type)?;
    debug!(
        name = %file.name,
        source = ?params.source,
        width = params.output_width,
        height = params.output_height,
        "rendering crop"
    );

    let bytes = backend.render(&file.bytes, &params)?;
    if bytes.is_empty() {
        return Err(BackendError::EmptyOutput);
    }

    Ok(CandidateFile::new(
        file.name.clone(),
        file.media_type.clone(),
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{jpeg_file, png_file};

    fn file() -> CandidateFile {
        CandidateFile::new("cover.jpg", "image/jpeg", vec![1, 2, 3])
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(1920, 1080);
        assert_eq!(get_dimensions(&backend, &file()).unwrap(), (1920, 1080));
    }

    #[test]
    fn plan_maps_display_rect_to_natural_space() {
        // Image shown at half its natural size → scale 2 on both axes
        let metrics = DisplayMetrics::natural().with_display_size(1000.0, 1000.0);
        let params = plan_render(
            Dimensions {
                width: 2000,
                height: 2000,
            },
            CropRect::new(10.0, 10.0, 300.0, 400.0),
            &metrics,
            "image/png",
        )
        .unwrap();

        assert_eq!(params.source, CropRect::new(20.0, 20.0, 600.0, 800.0));
        assert_eq!((params.output_width, params.output_height), (300, 400));
        assert_eq!(params.quality, Quality::MAX);
    }

    #[test]
    fn plan_multiplies_surface_by_pixel_ratio() {
        let metrics = DisplayMetrics::natural().with_pixel_ratio(2.0);
        let params = plan_render(
            Dimensions {
                width: 800,
                height: 800,
            },
            CropRect::new(0.0, 0.0, 300.0, 400.0),
            &metrics,
            "image/png",
        )
        .unwrap();

        assert_eq!(params.source, CropRect::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!((params.output_width, params.output_height), (600, 800));
    }

    #[test]
    fn plan_rejects_degenerate_display() {
        let metrics = DisplayMetrics::natural().with_display_size(0.0, 100.0);
        let result = plan_render(
            Dimensions {
                width: 10,
                height: 10,
            },
            CropRect::new(0.0, 0.0, 1.0, 1.0),
            &metrics,
            "image/png",
        );
        assert!(matches!(result, Err(BackendError::ImageLoad(_))));
    }

    #[test]
    fn plan_rejects_oversized_surface() {
        let result = plan_render(
            Dimensions {
                width: 100,
                height: 100,
            },
            CropRect::new(0.0, 0.0, 1e10, 1e10),
            &DisplayMetrics::natural(),
            "image/png",
        );
        match result {
            Err(BackendError::Draw(msg)) => assert!(msg.contains("too large")),
            other => panic!("expected Draw error, got {other:?}"),
        }
    }

    #[test]
    fn plan_rejects_surface_blown_up_by_pixel_ratio() {
        let metrics = DisplayMetrics::natural().with_pixel_ratio(1000.0);
        let result = plan_render(
            Dimensions {
                width: 100,
                height: 100,
            },
            CropRect::new(0.0, 0.0, 20.0, 10.0),
            &metrics,
            "image/png",
        );
        assert!(matches!(result, Err(BackendError::Draw(_))));
    }

    #[test]
    fn plan_accepts_surface_at_the_limit() {
        let side = MAX_SURFACE_SIDE as f64;
        let params = plan_render(
            Dimensions {
                width: 100,
                height: 100,
            },
            CropRect::new(0.0, 0.0, side, 1.0),
            &DisplayMetrics::natural(),
            "image/png",
        )
        .unwrap();
        assert_eq!(params.output_width, MAX_SURFACE_SIDE);
    }

    #[test]
    fn render_oversized_rect_never_reaches_backend_render() {
        let backend = MockBackend::with_dimensions(100, 100);
        let result = render(
            &backend,
            &file(),
            CropRect::new(0.0, 0.0, 1e10, 1e10),
            &DisplayMetrics::natural(),
        );

        assert!(matches!(result, Err(BackendError::Draw(_))));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn render_invalid_rect_never_reaches_backend() {
        let backend = MockBackend::with_dimensions(100, 100);
        let result = render(
            &backend,
            &file(),
            CropRect::new(0.0, 0.0, 0.0, 10.0),
            &DisplayMetrics::natural(),
        );

        assert!(matches!(result, Err(BackendError::InvalidCrop)));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn render_passes_plan_to_backend() {
        let backend = MockBackend::with_dimensions(2000, 2000);
        let metrics = DisplayMetrics::natural().with_display_size(1000.0, 1000.0);

        render(&backend, &file(), CropRect::new(10.0, 10.0, 300.0, 400.0), &metrics).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[1],
            RecordedOp::Render {
                source: CropRect::new(20.0, 20.0, 600.0, 800.0),
                output_width: 300,
                output_height: 400,
                media_type: "image/jpeg".into(),
                quality: 100,
            }
        );
    }

    #[test]
    fn render_keeps_name_and_media_type() {
        let backend = MockBackend::with_dimensions(100, 100).with_output(vec![9; 10]);
        let out = render(
            &backend,
            &file(),
            CropRect::new(0.0, 0.0, 50.0, 50.0),
            &DisplayMetrics::natural(),
        )
        .unwrap();

        assert_eq!(out.name, "cover.jpg");
        assert_eq!(out.media_type, "image/jpeg");
        assert_eq!(&*out.bytes, &[9; 10]);
    }

    #[test]
    fn render_empty_output_fails() {
        let backend = MockBackend::with_dimensions(100, 100).with_output(Vec::new());
        let result = render(
            &backend,
            &file(),
            CropRect::new(0.0, 0.0, 50.0, 50.0),
            &DisplayMetrics::natural(),
        );
        assert!(matches!(result, Err(BackendError::EmptyOutput)));
    }

    #[test]
    fn render_load_failure_propagates() {
        let backend = MockBackend::new();
        let result = render(
            &backend,
            &file(),
            CropRect::new(0.0, 0.0, 50.0, 50.0),
            &DisplayMetrics::natural(),
        );
        assert!(matches!(result, Err(BackendError::ImageLoad(_))));
    }

    #[test]
    fn render_real_backend_produces_bytes() {
        let backend = RustBackend::new();
        for (source, rect) in [
            (png_file("a.png", 400, 300), CropRect::new(0.0, 0.0, 90.0, 120.0)),
            (jpeg_file("b.jpg", 640, 480), CropRect::new(100.5, 20.25, 160.0, 90.0)),
        ] {
            let out = render(&backend, &source, rect, &DisplayMetrics::natural()).unwrap();
            assert!(out.size() > 0);
            assert_eq!(out.name, source.name);
        }
    }

    #[test]
    fn render_real_backend_honours_pixel_ratio() {
        let backend = RustBackend::new();
        let metrics = DisplayMetrics::natural().with_pixel_ratio(2.0);
        let out = render(
            &backend,
            &png_file("a.png", 400, 300),
            CropRect::new(0.0, 0.0, 30.0, 40.0),
            &metrics,
        )
        .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (60, 80));
    }

    // =========================================================================
    // Boundary extents through the real backend
    // =========================================================================

    #[test]
    fn render_real_backend_rejects_huge_extent() {
        let backend = RustBackend::new();
        let result = render(
            &backend,
            &png_file("a.png", 40, 30),
            CropRect::new(0.0, 0.0, 1e10, 1e10),
            &DisplayMetrics::natural(),
        );
        assert!(matches!(result, Err(BackendError::Draw(_))));
    }

    #[test]
    fn render_real_backend_rejects_sub_pixel_width() {
        // Valid rectangle, but the surface truncates to zero columns
        let backend = RustBackend::new();
        let result = render(
            &backend,
            &png_file("a.png", 40, 30),
            CropRect::new(0.0, 0.0, 0.4, 10.0),
            &DisplayMetrics::natural(),
        );
        assert!(matches!(result, Err(BackendError::Draw(_))));
    }

    #[test]
    fn render_real_backend_truncates_fractional_pixel_ratio() {
        let backend = RustBackend::new();
        let metrics = DisplayMetrics::natural().with_pixel_ratio(1.5);
        let out = render(
            &backend,
            &png_file("a.png", 400, 300),
            CropRect::new(10.0, 10.0, 33.3, 20.7),
            &metrics,
        )
        .unwrap();

        assert!(out.size() > 0);
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        // floor(49.95) x floor(31.05)
        assert_eq!((decoded.width(), decoded.height()), (49, 31));
    }

    #[test]
    fn render_real_backend_handles_overhanging_fractional_rect() {
        let backend = RustBackend::new();
        let metrics = DisplayMetrics::natural().with_pixel_ratio(1.25);
        let out = render(
            &backend,
            &jpeg_file("b.jpg", 64, 48),
            CropRect::new(50.5, 40.25, 30.3, 20.9),
            &metrics,
        )
        .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (37, 26));
    }
}
