//! # Cropstage
//!
//! Image intake, cropping and selection for a game catalog's submission form.
//! A user drops or picks image files; the first acceptable one opens a crop
//! session; confirming the crop renders a new image file at the selected
//! region; the result joins a bounded selection set whose full contents are
//! pushed to the form after every change.
//!
//! # Architecture: One File, Four Stages
//!
//! ```text
//! 1. Intake      batch        →  first valid file     (size + type checks)
//! 2. Staging     file         →  crop rectangle       (pan, zoom, crop surface)
//! 3. Rasterize   file + rect  →  new encoded file     (decode, resample, encode)
//! 4. Selection   new file     →  bounded list         (evict oldest, notify form)
//! ```
//!
//! The [`uploader`] module wires the stages together behind the contract the
//! form sees: props in, one callback out, one inline error message.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | Size and extension checks, first-valid-file selection |
//! | [`staging`] | One crop session: pan, zoom, crop rect, busy flag, two-phase confirm |
//! | [`imaging`] | Crop rasterizer behind the `ImageBackend` trait, pure geometry helpers |
//! | [`selection`] | Bounded, ordered selection set with eviction and snapshot notification |
//! | [`preview`] | Preview handle registry; handles release themselves on drop |
//! | [`uploader`] | Composition of the above with render deadline and inline errors |
//! | [`submission`] | "Add game" draft validation and create-game payload |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Shared [`types::CandidateFile`] |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Release By Ownership
//!
//! Every preview URL is a [`preview::PreviewHandle`] owned by exactly one
//! session or accepted image. Eviction, reset, cancel and teardown all
//! release previews by dropping their owner, so there is no release call to
//! forget on an error path. [`preview::PreviewRegistry::live`] makes leaks
//! observable in tests.
//!
//! ## Busy Before Await
//!
//! Confirming a crop is split into `begin` (sets busy, hands out the job) and
//! `finish` (clears busy, applies the result). A second confirm between the
//! two is refused without starting a render. The blocking driver runs the job
//! on a worker thread with a deadline so a stalled decode cannot wedge the
//! session.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding use the `image` crate only. No
//! system libraries are needed, and the output keeps the source file's name
//! and media type.

pub mod config;
pub mod imaging;
pub mod intake;
pub mod output;
pub mod preview;
pub mod selection;
pub mod staging;
pub mod submission;
pub mod types;
pub mod uploader;

#[cfg(test)]
pub(crate) mod test_helpers;
