//! Selection set: the bounded, ordered list of accepted images.
//!
//! The set is the only owner of its images. Every mutation pushes the full
//! current list of files to the consumer callback, so the consumer never has
//! to reconcile partial updates.

use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::types::CandidateFile;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// A rendered file plus the preview handle used to display it.
#[derive(Debug)]
pub struct AcceptedImage {
    file: CandidateFile,
    preview: PreviewHandle,
}

impl AcceptedImage {
    pub fn new(file: CandidateFile, registry: &PreviewRegistry) -> Self {
        let preview = registry.create(&file);
        Self { file, preview }
    }

    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }
}

/// Consumer notification: receives the authoritative list after every change.
pub type SelectCallback = Box<dyn FnMut(&[CandidateFile])>;

pub struct SelectionSet {
    max_count: usize,
    images: VecDeque<AcceptedImage>,
    on_select_complete: SelectCallback,
}

impl SelectionSet {
    /// Capacities below one are raised to one.
    pub fn new(max_count: usize, on_select_complete: impl FnMut(&[CandidateFile]) + 'static) -> Self {
        let max_count = max_count.max(1);
        Self {
            max_count,
            images: VecDeque::with_capacity(max_count + 1),
            on_select_complete: Box::new(on_select_complete),
        }
    }

    /// Append `image`, evict the oldest entries beyond capacity, then notify.
    ///
    /// Evicted previews are released before the notification goes out.
    pub fn add(&mut self, image: AcceptedImage) {
        self.images.push_back(image);
        while self.images.len() > self.max_count {
            if let Some(evicted) = self.images.pop_front() {
                debug!(
                    name = %evicted.file.name,
                    preview = evicted.preview_url(),
                    "evicting oldest selection"
                );
            }
        }
        self.emit();
    }

    /// Release every preview and empty the set. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.images.clear();
        self.emit();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Snapshot of the current files, oldest first.
    pub fn files(&self) -> Vec<CandidateFile> {
        self.images.iter().map(|i| i.file.clone()).collect()
    }

    /// Preview URLs in display order.
    pub fn previews(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.preview_url()).collect()
    }

    pub fn images(&self) -> impl Iterator<Item = &AcceptedImage> {
        self.images.iter()
    }

    fn emit(&mut self) {
        let snapshot = self.files();
        (self.on_select_complete)(&snapshot);
    }
}

impl fmt::Debug for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionSet")
            .field("max_count", &self.max_count)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}
