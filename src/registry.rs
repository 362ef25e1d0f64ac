//! Version registry: the append-only set of versions a family serves.

use tracing::{debug, info};

use crate::error::{NodeInfoError, Result};
use crate::version::VersionId;

#[derive(Debug, Clone)]
struct Entry {
    version: VersionId,
    owner: String,
}

/// Known versions in registration order, each tagged with the contributor
/// that claimed it.
///
/// Populated during startup composition and read-only afterwards, so it
/// carries no locking.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    entries: Vec<Entry>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `version` on behalf of `owner`.
    ///
    /// Returns `Ok(true)` when the version was added and `Ok(false)` when the
    /// same owner registered it before.
    ///
    /// # Errors
    /// `DuplicateRegistration` when a different owner already claims the version.
    pub fn register(&mut self, version: VersionId, owner: &str) -> Result<bool> {
        if let Some(existing) = self.entries.iter().find(|e| e.version == version) {
            if existing.owner == owner {
                debug!(%version, owner, "ignoring repeated registration");
                return Ok(false);
            }
            return Err(NodeInfoError::DuplicateRegistration {
                version: version.to_string(),
                existing: existing.owner.clone(),
                contender: owner.to_string(),
            });
        }

        info!(%version, owner, "registered version");
        self.entries.push(Entry {
            version,
            owner: owner.to_string(),
        });
        Ok(true)
    }

    pub fn list(&self) -> Vec<VersionId> {
        self.entries.iter().map(|e| e.version.clone()).collect()
    }

    pub fn is_known(&self, version: &str) -> bool {
        self.entries.iter().any(|e| e.version == version)
    }

    /// Contributor id that owns `version`.
    pub fn owner_of(&self, version: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.version == version)
            .map(|e| e.owner.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
