//! Ordered contribution chains.
//!
//! Every extension point of a document owns one [`Chain`]: an ordered list of
//! filters folded over a starting value. Each filter receives the previous
//! filter's output plus the request context and returns the next value.
//! Filters are responsible for their own version check; the chain never
//! skips an entry.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::SoftwareConfig;
use crate::error::Result;
use crate::facts::{FactProvider, UrlResolver};
use crate::version::VersionId;

// ============================================================================
// ExtensionPoint
// ============================================================================

/// A named slot of a document that contributors may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionPoint {
    Software,
    Server,
    Protocols,
    Services,
    Usage,
    Metadata,
    /// Whole-document transform applied after assembly.
    Document,
}

impl ExtensionPoint {
    /// Key of the field in the serialized document.
    pub fn key(self) -> &'static str {
        match self {
            ExtensionPoint::Software => "software",
            ExtensionPoint::Server => "server",
            ExtensionPoint::Protocols => "protocols",
            ExtensionPoint::Services => "services",
            ExtensionPoint::Usage => "usage",
            ExtensionPoint::Metadata => "metadata",
            ExtensionPoint::Document => "document",
        }
    }

    /// Value the fold starts from.
    pub fn zero(self) -> Value {
        match self {
            ExtensionPoint::Protocols => json!([]),
            ExtensionPoint::Services => json!({ "inbound": [], "outbound": [] }),
            _ => json!({}),
        }
    }
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// BuildContext
// ============================================================================

/// Per-request context handed to every filter.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub version: &'a VersionId,
    pub facts: &'a dyn FactProvider,
    pub urls: &'a dyn UrlResolver,
    pub software: &'a SoftwareConfig,
}

impl<'a> BuildContext<'a> {
    /// Exact match against the requested version.
    pub fn is(&self, version: &str) -> bool {
        *self.version == version
    }
}

// ============================================================================
// Chain
// ============================================================================

/// A filter: `(current value, context) -> next value`.
pub type Filter = Arc<dyn Fn(Value, &BuildContext<'_>) -> Result<Value> + Send + Sync>;

struct ChainEntry {
    id: String,
    filter: Filter,
}

/// Filters for one extension point, in registration order.
#[derive(Default)]
pub struct Chain {
    entries: Vec<ChainEntry>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `filter` under `id`.
    ///
    /// Returns `false` without changing the chain when `id` is already present,
    /// so repeated startup registration never duplicates an entry.
    pub fn add<F>(&mut self, id: impl Into<String>, filter: F) -> bool
    where
        F: Fn(Value, &BuildContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.add_shared(id, Arc::new(filter))
    }

    /// Same as [`Chain::add`] for an already shared filter.
    pub fn add_shared(&mut self, id: impl Into<String>, filter: Filter) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.entries.push(ChainEntry { id, filter });
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Fold every filter over `initial`. The first failing filter aborts the fold.
    pub fn apply(&self, initial: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        self.entries
            .iter()
            .try_fold(initial, |value, entry| (entry.filter)(value, ctx))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
