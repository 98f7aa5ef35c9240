//! Crop staging: one interactive crop session over a candidate file.
//!
//! A session tracks pan, zoom and the latest crop rectangle reported by the
//! crop surface. Confirmation is split in two so an asynchronous driver can
//! run the render elsewhere:
//!
//! ```text
//! begin_confirm()  → busy = true, returns PendingRender
//! PendingRender::run(backend)  (anywhere, any thread)
//! complete(result) → busy = false; Ok closes the session, Err keeps it open
//! ```
//!
//! The `busy` flag is set before `begin_confirm` returns and is the only
//! guard against a second render. Cancel is refused while busy, and
//! `complete` is refused while not busy.

use crate::imaging::{self, BackendError, CropRect, DisplayMetrics, ImageBackend};
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::types::CandidateFile;
use thiserror::Error;
use tracing::{debug, warn};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("No crop session is open")]
    NoSession,
    #[error("Select a crop area first")]
    NoCropArea,
    #[error("The image is still being processed")]
    Busy,
    #[error("No render is in progress")]
    NoRenderInFlight,
}

/// Message shown inside the session when a render fails.
pub fn render_failure_message(err: &BackendError) -> String {
    format!("Image cropping failed: {err}. Please try again with a different image.")
}

/// A render job handed out by [`CropSession::begin_confirm`].
#[derive(Debug, Clone)]
pub struct PendingRender {
    file: CandidateFile,
    rect: CropRect,
}

impl PendingRender {
    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    /// Run the crop rasterizer for this job.
    pub fn run(
        &self,
        backend: &(impl ImageBackend + ?Sized),
        metrics: &DisplayMetrics,
    ) -> Result<CandidateFile, BackendError> {
        imaging::render(backend, &self.file, self.rect, metrics)
    }
}

#[derive(Debug)]
pub struct CropSession {
    file: CandidateFile,
    preview: PreviewHandle,
    position: (f64, f64),
    zoom: f64,
    crop: Option<CropRect>,
    busy: bool,
    error: Option<String>,
}

impl CropSession {
    /// Open a session. The file's preview handle lives as long as the session.
    pub fn open(file: CandidateFile, registry: &PreviewRegistry) -> Self {
        let preview = registry.create(&file);
        debug!(name = %file.name, preview = preview.url(), "crop session opened");
        Self {
            file,
            preview,
            position: (0.0, 0.0),
            zoom: MIN_ZOOM,
            crop: None,
            busy: false,
            error: None,
        }
    }

    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Latest pixel-space rectangle from the crop surface. Not validated here.
    pub fn on_crop_change(&mut self, rect: CropRect) {
        self.crop = Some(rect);
    }

    pub fn on_position_change(&mut self, x: f64, y: f64) {
        self.position = (x, y);
    }

    pub fn on_zoom_change(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Derive the crop rectangle from the current pan and zoom, for drivers
    /// without an interactive crop surface.
    pub fn apply_view(&mut self, display: (f64, f64), aspect: Option<f64>) -> CropRect {
        let rect = imaging::crop_area_for_view(display, aspect, self.position, self.zoom);
        self.crop = Some(rect);
        rect
    }

    /// Enter the busy state and hand out the render job.
    pub fn begin_confirm(&mut self) -> Result<PendingRender, StagingError> {
        if self.busy {
            return Err(StagingError::Busy);
        }
        let rect = self.crop.ok_or(StagingError::NoCropArea)?;

        self.busy = true;
        self.error = None;
        Ok(PendingRender {
            file: self.file.clone(),
            rect,
        })
    }

    /// Leave the busy state with the render outcome.
    ///
    /// Returns the rendered file on success; on failure records the message
    /// and keeps the session open for a retry or cancel. Outcomes arriving
    /// while no render is in flight are refused and change nothing.
    pub fn complete(
        &mut self,
        result: Result<CandidateFile, BackendError>,
    ) -> Result<Option<CandidateFile>, StagingError> {
        if !self.busy {
            return Err(StagingError::NoRenderInFlight);
        }
        self.busy = false;
        match result {
            Ok(file) => Ok(Some(file)),
            Err(err) => {
                warn!(name = %self.file.name, error = %err, "crop render failed");
                self.error = Some(render_failure_message(&err));
                Ok(None)
            }
        }
    }

    /// Begin, render inline, complete.
    pub fn confirm(
        &mut self,
        backend: &(impl ImageBackend + ?Sized),
        metrics: &DisplayMetrics,
    ) -> Result<Option<CandidateFile>, StagingError> {
        let pending = self.begin_confirm()?;
        let result = pending.run(backend, metrics);
        self.complete(result)
    }

    /// Cancel is disabled while a render is in flight.
    pub fn ensure_cancellable(&self) -> Result<(), StagingError> {
        if self.busy {
            return Err(StagingError::Busy);
        }
        Ok(())
    }
}

impl Drop for CropSession {
    fn drop(&mut self) {
        debug!(name = %self.file.name, "crop session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::png_file;

    fn session(registry: &PreviewRegistry) -> CropSession {
        CropSession::open(png_file("cover.png", 200, 200), registry)
    }

    #[test]
    fn defaults_on_open() {
        let registry = PreviewRegistry::new();
        let s = session(&registry);
        assert_eq!(s.position(), (0.0, 0.0));
        assert_eq!(s.zoom(), 1.0);
        assert!(s.crop().is_none());
        assert!(!s.is_busy());
        assert_eq!(registry.live(), 1);
        assert!(registry.contains(s.preview_url()));
    }

    #[test]
    fn crop_change_keeps_latest_unvalidated() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_crop_change(CropRect::new(0.0, 0.0, 10.0, 10.0));
        s.on_crop_change(CropRect::new(1.0, 1.0, -5.0, 0.0));
        assert_eq!(s.crop(), Some(CropRect::new(1.0, 1.0, -5.0, 0.0)));
    }

    #[test]
    fn zoom_is_clamped() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_zoom_change(10.0);
        assert_eq!(s.zoom(), MAX_ZOOM);
        s.on_zoom_change(0.1);
        assert_eq!(s.zoom(), MIN_ZOOM);
        s.on_zoom_change(f64::NAN);
        assert_eq!(s.zoom(), MIN_ZOOM);
    }

    #[test]
    fn confirm_requires_crop_area() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        assert_eq!(s.begin_confirm().unwrap_err(), StagingError::NoCropArea);
        assert!(!s.is_busy());
    }

    #[test]
    fn second_confirm_while_busy_is_rejected() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_crop_change(CropRect::new(0.0, 0.0, 50.0, 50.0));

        let pending = s.begin_confirm().unwrap();
        assert!(s.is_busy());
        assert_eq!(s.begin_confirm().unwrap_err(), StagingError::Busy);
        assert_eq!(s.ensure_cancellable().unwrap_err(), StagingError::Busy);

        let backend = MockBackend::with_dimensions(200, 200);
        let result = pending.run(&backend, &DisplayMetrics::natural());
        assert!(s.complete(result).unwrap().is_some());
        assert!(!s.is_busy());
        assert_eq!(backend.render_count(), 1);
    }

    #[test]
    fn complete_without_begin_is_refused() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_crop_change(CropRect::new(0.0, 0.0, 50.0, 50.0));

        let forged = png_file("forged.png", 1, 1);
        assert_eq!(
            s.complete(Ok(forged.clone())).unwrap_err(),
            StagingError::NoRenderInFlight
        );
        assert!(!s.is_busy());

        // A finished render cannot be completed a second time
        let pending = s.begin_confirm().unwrap();
        let result = pending.run(&RustBackend::new(), &DisplayMetrics::natural());
        assert!(s.complete(result).unwrap().is_some());
        assert_eq!(
            s.complete(Ok(forged)).unwrap_err(),
            StagingError::NoRenderInFlight
        );
    }

    #[test]
    fn failed_render_keeps_session_open_with_message() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_crop_change(CropRect::new(0.0, 0.0, 0.0, 50.0));

        let out = s.confirm(&RustBackend::new(), &DisplayMetrics::natural()).unwrap();
        assert!(out.is_none());
        assert!(!s.is_busy());
        let msg = s.error().unwrap();
        assert!(msg.starts_with("Image cropping failed: Invalid crop dimensions"));
        assert!(s.ensure_cancellable().is_ok());
    }

    #[test]
    fn retry_after_failure_clears_message() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_crop_change(CropRect::new(0.0, 0.0, 0.0, 50.0));
        s.confirm(&RustBackend::new(), &DisplayMetrics::natural()).unwrap();
        assert!(s.error().is_some());

        s.on_crop_change(CropRect::new(0.0, 0.0, 50.0, 50.0));
        let out = s.confirm(&RustBackend::new(), &DisplayMetrics::natural()).unwrap();
        assert!(out.unwrap().size() > 0);
        assert!(s.error().is_none());
    }

    #[test]
    fn apply_view_sets_crop_from_pan_and_zoom() {
        let registry = PreviewRegistry::new();
        let mut s = session(&registry);
        s.on_zoom_change(2.0);
        let rect = s.apply_view((200.0, 200.0), Some(1.0));
        assert_eq!(rect, CropRect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(s.crop(), Some(rect));
    }

    #[test]
    fn dropping_session_releases_preview() {
        let registry = PreviewRegistry::new();
        let s = session(&registry);
        drop(s);
        assert_eq!(registry.live(), 0);
    }
}
