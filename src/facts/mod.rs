//! Host collaborators: the raw facts a document is built from.
//!
//! The engine never stores site content. It asks a [`FactProvider`] for counts
//! and identity strings on every build and derives the few computed values
//! (masked version, active users) here.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FactError;

pub use memory::{FactSnapshot, MemoryFacts, PostRecord};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteFacts;

/// Number of authors sampled when counting active users.
///
/// Active users are approximated by the most prolific authors of the window,
/// capped at this many. Sites with more active authors report the cap.
pub const ACTIVE_USER_SAMPLE: usize = 4;

pub type AuthorId = u64;

// ============================================================================
// Collaborator traits
// ============================================================================

/// Site identity strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteIdentity {
    pub name: String,
    pub description: String,
    /// Empty when the site has no icon.
    pub icon_url: String,
    /// Public root URL of the site, e.g. `https://example.com/`.
    pub home_url: String,
    /// Unmasked software version, e.g. `6.5.2-beta1`.
    pub software_version: String,
}

/// Source of raw facts about the site.
///
/// Implementations perform plain reads. They do no caching or aggregation;
/// each call must be independent of concurrent builds.
pub trait FactProvider: Send + Sync {
    /// Whether visitors may register accounts.
    fn users_can_register(&self) -> Result<bool, FactError>;

    /// Users able to publish posts.
    fn author_count(&self) -> Result<u64, FactError>;

    fn published_post_count(&self) -> Result<u64, FactError>;

    fn approved_comment_count(&self) -> Result<u64, FactError>;

    /// Author of every post published at or after `since`, one entry per post.
    fn published_post_authors(&self, since: DateTime<Utc>) -> Result<Vec<AuthorId>, FactError>;

    fn site_identity(&self) -> Result<SiteIdentity, FactError>;

    /// Reference instant for activity windows.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// A provider answering every read from one consistent state.
    ///
    /// A build reads all of its facts through the pinned view when there is
    /// one. `None` means reads go to `self`, each call on its own.
    fn pinned(&self) -> Option<Box<dyn FactProvider + '_>> {
        None
    }
}

/// Resolves host-relative paths to absolute URLs.
pub trait UrlResolver: Send + Sync {
    fn absolute_url(&self, path: &str) -> String;
}

/// Resolver that joins paths onto a fixed base URL.
#[derive(Debug, Clone)]
pub struct StaticUrls {
    base: String,
}

impl StaticUrls {
    /// `base` may carry a prefix such as `https://example.com/wp-json`.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl UrlResolver for StaticUrls {
    fn absolute_url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

// ============================================================================
// Derived facts
// ============================================================================

/// Reduce a version string to `major.minor`, dropping any pre-release suffix.
///
/// `"6.5.2-beta1"` becomes `"6.5"`; `"6.5"` is unchanged.
pub fn mask_version(raw: &str) -> String {
    let release = raw.split('-').next().unwrap_or_default();
    release.split('.').take(2).collect::<Vec<_>>().join(".")
}

/// Lookback windows used by the usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityWindow {
    Week,
    Month,
    HalfYear,
}

impl ActivityWindow {
    /// Start of the window ending at `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ActivityWindow::Week => now
                .checked_sub_signed(Duration::weeks(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ActivityWindow::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ActivityWindow::HalfYear => now
                .checked_sub_months(Months::new(6))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

/// Most prolific authors among `authors` (one entry per post), at most `limit`.
///
/// Ties are broken by author id so the result is deterministic.
pub fn most_active_authors(authors: &[AuthorId], limit: usize) -> Vec<AuthorId> {
    let mut counts: HashMap<AuthorId, usize> = HashMap::new();
    for author in authors {
        *counts.entry(*author).or_default() += 1;
    }

    let mut ranked: Vec<(AuthorId, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Active users in `window`, sampled to [`ACTIVE_USER_SAMPLE`] authors.
pub fn active_users(facts: &dyn FactProvider, window: ActivityWindow) -> Result<u64, FactError> {
    let since = window.since(facts.now());
    let authors = facts.published_post_authors(since)?;
    Ok(most_active_authors(&authors, ACTIVE_USER_SAMPLE).len() as u64)
}
