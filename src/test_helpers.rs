//! Shared test utilities for the cropstage test suite.
//!
//! Builds synthetic encoded images and candidate files, and records the
//! snapshots a selection set emits.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let file = png_file("cover.png", 400, 300);
//! let (recorder, callback) = SnapshotRecorder::new();
//! let mut set = SelectionSet::new(1, callback);
//! ...
//! assert_eq!(recorder.last_names(), vec!["cover.png"]);
//! ```

use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::sync::{Arc, Mutex};

use crate::types::CandidateFile;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encoded JPEG bytes with the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encoded PNG bytes with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A PNG candidate file.
pub fn png_file(name: &str, width: u32, height: u32) -> CandidateFile {
    CandidateFile::new(name, "image/png", png_bytes(width, height))
}

/// A JPEG candidate file.
pub fn jpeg_file(name: &str, width: u32, height: u32) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", jpeg_bytes(width, height))
}

// =========================================================================
// Snapshot recording
// =========================================================================

/// Collects every snapshot passed to a selection callback.
#[derive(Clone, Default)]
pub struct SnapshotRecorder {
    snapshots: Arc<Mutex<Vec<Vec<CandidateFile>>>>,
}

impl SnapshotRecorder {
    /// A recorder plus a callback feeding it.
    pub fn new() -> (Self, impl FnMut(&[CandidateFile]) + Send + 'static) {
        let recorder = Self::default();
        let sink = recorder.snapshots.clone();
        let callback = move |files: &[CandidateFile]| sink.lock().unwrap().push(files.to_vec());
        (recorder, callback)
    }

    /// Number of emissions so far.
    pub fn count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    /// File names of the most recent snapshot. Panics if nothing was emitted.
    pub fn last_names(&self) -> Vec<String> {
        let snapshots = self.snapshots.lock().unwrap();
        let last = snapshots
            .last()
            .unwrap_or_else(|| panic!("no snapshot has been emitted"));
        last.iter().map(|f| f.name.clone()).collect()
    }

    /// The most recent snapshot. Panics if nothing was emitted.
    pub fn last(&self) -> Vec<CandidateFile> {
        self.snapshots
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("no snapshot has been emitted"))
    }
}
