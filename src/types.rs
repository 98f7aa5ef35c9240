//! Shared types used across the pipeline stages.
//!
//! A [`CandidateFile`] is the unit that moves through every stage: intake
//! validates it, the rasterizer consumes one and produces another, and the
//! selection set hands snapshots of them to the consumer form.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A user-selected file: raw bytes plus name and media type.
///
/// Bytes are shared, so cloning a file for a snapshot or a render job does
/// not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// File name as selected, including the extension.
    pub name: String,
    /// Media type, e.g. `image/png`. May be empty when unknown.
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: Arc::from(bytes),
        }
    }

    /// Read a file from disk, guessing the media type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type_for_name(&name).unwrap_or_default();
        Ok(Self::new(name, media_type, bytes))
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased extension after the last `.`, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Guess a media type from a file name's extension.
pub fn media_type_for_name(name: &str) -> Option<String> {
    let ext = extension_of(name)?;
    image::ImageFormat::from_extension(&ext).map(|fmt| fmt.to_mime_type().to_string())
}
