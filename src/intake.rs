//! File intake: gate raw selections before they reach the crop stage.
//!
//! Checks run in a fixed order: media type filter, then size ceiling, then
//! extension. Only the first file of a batch that survives every check is
//! forwarded, because only one crop session can be open at a time.

use crate::types::CandidateFile;
use thiserror::Error;
use tracing::debug;

/// Extensions the drop zone accepts even when the media type is missing.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("File size exceeds {limit_kb} KB")]
    SizeExceeded { limit_kb: u64 },
    #[error("File must have an extension")]
    MissingExtension,
    #[error("File {name} is not a supported image type")]
    UnsupportedType { name: String },
    #[error("No files were selected")]
    EmptyBatch,
    #[error("An image is still being processed")]
    Busy,
    #[error("Finish or cancel the current crop before adding another image")]
    SessionOpen,
}

/// Validate a single file against the size ceiling and extension rule.
///
/// Never panics and has no side effects; the file comes back unchanged on
/// success.
pub fn validate(file: &CandidateFile, limit_kb: u64) -> Result<&CandidateFile, IntakeError> {
    if file.size() > limit_kb.saturating_mul(1024) {
        return Err(IntakeError::SizeExceeded { limit_kb });
    }
    if !file.name.contains('.') {
        return Err(IntakeError::MissingExtension);
    }
    Ok(file)
}

/// Whether the drop zone's `image/*` filter lets this file through.
pub fn accepts_type(file: &CandidateFile) -> bool {
    if file.media_type.starts_with("image/") {
        return true;
    }
    file.extension()
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Run every intake check on one file: type filter, then [`validate`].
pub fn check(file: &CandidateFile, limit_kb: u64) -> Result<(), IntakeError> {
    if !accepts_type(file) {
        return Err(IntakeError::UnsupportedType {
            name: file.name.clone(),
        });
    }
    validate(file, limit_kb).map(|_| ())
}

/// Pick the first acceptable file from a batch.
///
/// When nothing passes, the error of the last rejected file is returned.
pub fn select_first(batch: Vec<CandidateFile>, limit_kb: u64) -> Result<CandidateFile, IntakeError> {
    let mut last_error = IntakeError::EmptyBatch;

    for file in batch {
        match check(&file, limit_kb) {
            Ok(()) => {
                debug!(name = %file.name, size = file.size(), "intake accepted file");
                return Ok(file);
            }
            Err(err) => {
                debug!(name = %file.name, error = %err, "intake rejected file");
                last_error = err;
            }
        }
    }

    Err(last_error)
}
