//! In-memory fact provider backed by a mutable snapshot.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{AuthorId, FactProvider, SiteIdentity};
use crate::error::{FactError, NodeInfoError};

/// A published post as far as activity counting is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub author: AuthorId,
    pub published_at: DateTime<Utc>,
}

/// Every fact a [`MemoryFacts`] answers from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactSnapshot {
    pub users_can_register: bool,
    pub author_count: u64,
    pub approved_comments: u64,
    pub posts: Vec<PostRecord>,
    pub identity: SiteIdentity,
    /// Fixed reference instant. `None` means the wall clock.
    pub now: Option<DateTime<Utc>>,
}

/// Fact provider answering from a [`FactSnapshot`].
///
/// Interior mutability via `parking_lot::Mutex` so a host can refresh facts
/// while documents are being served. A build answers from a clone of the
/// snapshot taken when it starts, so a refresh never splits one document.
#[derive(Debug, Default)]
pub struct MemoryFacts {
    snapshot: Mutex<FactSnapshot>,
}

impl MemoryFacts {
    pub fn new(snapshot: FactSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Load a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, NodeInfoError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Apply `change` to the current snapshot.
    pub fn update(&self, change: impl FnOnce(&mut FactSnapshot)) {
        change(&mut *self.snapshot.lock());
    }

    pub fn snapshot(&self) -> FactSnapshot {
        self.snapshot.lock().clone()
    }
}

impl FactProvider for MemoryFacts {
    fn users_can_register(&self) -> Result<bool, FactError> {
        Ok(self.snapshot.lock().users_can_register)
    }

    fn author_count(&self) -> Result<u64, FactError> {
        Ok(self.snapshot.lock().author_count)
    }

    fn published_post_count(&self) -> Result<u64, FactError> {
        Ok(self.snapshot.lock().posts.len() as u64)
    }

    fn approved_comment_count(&self) -> Result<u64, FactError> {
        Ok(self.snapshot.lock().approved_comments)
    }

    fn published_post_authors(&self, since: DateTime<Utc>) -> Result<Vec<AuthorId>, FactError> {
        Ok(self
            .snapshot
            .lock()
            .posts
            .iter()
            .filter(|p| p.published_at >= since)
            .map(|p| p.author)
            .collect())
    }

    fn site_identity(&self) -> Result<SiteIdentity, FactError> {
        Ok(self.snapshot.lock().identity.clone())
    }

    fn now(&self) -> DateTime<Utc> {
        self.snapshot.lock().now.unwrap_or_else(Utc::now)
    }

    fn pinned(&self) -> Option<Box<dyn FactProvider + '_>> {
        let mut snapshot = self.snapshot();
        snapshot.now = Some(snapshot.now.unwrap_or_else(Utc::now));
        Some(Box::new(MemoryFacts::new(snapshot)))
    }
}
