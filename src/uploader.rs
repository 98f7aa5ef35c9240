//! The image uploader: intake, staging, rasterizer and selection set wired
//! together behind the contract a form sees.
//!
//! The form supplies `max_files`, an optional `crop_aspect`, a
//! `file_size_limit_kb` ceiling and an `on_select_complete` callback. All
//! failures end up in a single inline message ([`ImageUploader::error`]);
//! nothing is thrown across to the form, and the callback only fires when
//! the selection actually changes.
//!
//! Renders run on a worker thread and are awaited with a deadline. A render
//! that misses the deadline is abandoned: the session returns to idle with a
//! timeout message and the late result is discarded when it arrives.

use crate::imaging::{self, BackendError, DisplayMetrics, ImageBackend};
use crate::intake::{self, IntakeError};
use crate::preview::PreviewRegistry;
use crate::selection::{AcceptedImage, SelectionSet};
use crate::staging::{CropSession, PendingRender, StagingError};
use crate::types::CandidateFile;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default render deadline.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Inputs from the consumer form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploaderProps {
    pub max_files: usize,
    pub crop_aspect: Option<f64>,
    pub file_size_limit_kb: u64,
    pub metrics: DisplayMetrics,
    /// `None` renders inline with no deadline.
    pub render_timeout: Option<Duration>,
}

impl UploaderProps {
    pub fn new(file_size_limit_kb: u64) -> Self {
        Self {
            max_files: 1,
            crop_aspect: None,
            file_size_limit_kb,
            metrics: DisplayMetrics::natural(),
            render_timeout: Some(DEFAULT_RENDER_TIMEOUT),
        }
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_crop_aspect(mut self, aspect: f64) -> Self {
        self.crop_aspect = Some(aspect);
        self
    }

    pub fn with_metrics(mut self, metrics: DisplayMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.render_timeout = timeout;
        self
    }
}

pub struct ImageUploader {
    props: UploaderProps,
    backend: Arc<dyn ImageBackend>,
    registry: PreviewRegistry,
    selection: SelectionSet,
    session: Option<CropSession>,
    error: Option<String>,
}

impl ImageUploader {
    pub fn new(
        props: UploaderProps,
        backend: Arc<dyn ImageBackend>,
        registry: PreviewRegistry,
        on_select_complete: impl FnMut(&[CandidateFile]) + 'static,
    ) -> Self {
        let selection = SelectionSet::new(props.max_files, on_select_complete);
        Self {
            props,
            backend,
            registry,
            selection,
            session: None,
            error: None,
        }
    }

    pub fn props(&self) -> &UploaderProps {
        &self.props
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    /// Forward crop surface events to the open session.
    pub fn session_mut(&mut self) -> Option<&mut CropSession> {
        self.session.as_mut()
    }

    pub fn is_busy(&self) -> bool {
        self.session.as_ref().is_some_and(CropSession::is_busy)
    }

    /// Current inline message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Preview thumbnail box for the configured aspect.
    pub fn preview_size(&self) -> (u32, u32) {
        imaging::preview_size(self.props.crop_aspect)
    }

    /// Accept a dropped or picked batch and open a crop session for the
    /// first acceptable file.
    ///
    /// Drops while a session is open are refused rather than queued.
    pub fn drop_files(&mut self, batch: Vec<CandidateFile>) -> Result<(), IntakeError> {
        self.error = None;

        let gate = match &self.session {
            Some(s) if s.is_busy() => Some(IntakeError::Busy),
            Some(_) => Some(IntakeError::SessionOpen),
            None => None,
        };
        if let Some(err) = gate {
            debug!(error = %err, "drop refused");
            self.error = Some(err.to_string());
            return Err(err);
        }

        match intake::select_first(batch, self.props.file_size_limit_kb) {
            Ok(file) => {
                self.session = Some(CropSession::open(file, &self.registry));
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Start the render for the open session and return the job. Pair with
    /// [`finish_crop`](Self::finish_crop).
    pub fn begin_crop(&mut self) -> Result<PendingRender, StagingError> {
        let session = self.session.as_mut().ok_or(StagingError::NoSession)?;
        self.error = None;
        session.begin_confirm()
    }

    /// Apply a render outcome. Returns `true` when the image was accepted.
    ///
    /// Refused with [`StagingError::NoRenderInFlight`] unless
    /// [`begin_crop`](Self::begin_crop) started a render that has not been
    /// finished yet.
    pub fn finish_crop(
        &mut self,
        result: Result<CandidateFile, BackendError>,
    ) -> Result<bool, StagingError> {
        let session = self.session.as_mut().ok_or(StagingError::NoSession)?;

        match session.complete(result)? {
            Some(file) => {
                info!(name = %file.name, size = file.size(), "crop accepted");
                self.session = None;
                self.selection.add(AcceptedImage::new(file, &self.registry));
                Ok(true)
            }
            None => {
                self.error = session.error().map(str::to_string);
                Ok(false)
            }
        }
    }

    /// Render the current crop and, on success, add it to the selection.
    ///
    /// Rejected with [`StagingError::Busy`] while another render is running;
    /// no second render starts.
    pub fn confirm_crop(&mut self) -> Result<bool, StagingError> {
        let pending = self.begin_crop()?;
        let result = self.run_render(pending);
        self.finish_crop(result)
    }

    /// Close the open session without rendering. Refused while busy.
    pub fn cancel_crop(&mut self) -> Result<(), StagingError> {
        let session = self.session.as_ref().ok_or(StagingError::NoSession)?;
        session.ensure_cancellable()?;
        self.session = None;
        Ok(())
    }

    /// Empty the selection and release its previews.
    pub fn reset(&mut self) {
        self.selection.reset();
    }

    fn run_render(&self, pending: PendingRender) -> Result<CandidateFile, BackendError> {
        let metrics = self.props.metrics;
        let Some(timeout) = self.props.render_timeout else {
            return pending.run(self.backend.as_ref(), &metrics);
        };

        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        std::thread::spawn(move || {
            // The receiver is gone if the deadline already passed
            let _ = tx.send(pending.run(backend.as_ref(), &metrics));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "crop render timed out");
                Err(BackendError::TimedOut(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(BackendError::Draw(
                "render worker stopped without a result".into(),
            )),
        }
    }
}
