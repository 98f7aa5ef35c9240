//! Preview handles: transient display references to in-memory files.
//!
//! A [`PreviewRegistry`] plays the role of a browser's object-URL table. Each
//! [`PreviewHandle`] registers one file under a `preview:<n>` key and removes
//! it again when dropped, so release happens on every exit path without any
//! explicit cleanup call.

use crate::types::CandidateFile;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    entries: HashMap<String, CandidateFile>,
}

/// Shared table of live preview handles.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` and return the handle that owns the registration.
    pub fn create(&self, file: &CandidateFile) -> PreviewHandle {
        let mut state = self.state.lock();
        state.next_id += 1;
        let url = format!("preview:{}", state.next_id);
        state.entries.insert(url.clone(), file.clone());
        trace!(%url, name = %file.name, "preview created");

        PreviewHandle {
            url,
            registry: self.clone(),
        }
    }

    /// Look up the file behind a live preview URL.
    pub fn resolve(&self, url: &str) -> Option<CandidateFile> {
        self.state.lock().entries.get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.state.lock().entries.contains_key(url)
    }

    /// Number of handles not yet released.
    pub fn live(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn release(&self, url: &str) {
        if self.state.lock().entries.remove(url).is_some() {
            trace!(%url, "preview released");
        }
    }
}

impl fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("live", &self.live())
            .finish()
    }
}

/// Owned registration of one preview. Released on drop.
pub struct PreviewHandle {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewHandle").field(&self.url).finish()
    }
}
