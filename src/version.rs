//! Schema version identifiers and document families.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque schema version token such as `"2.1"`.
///
/// Equality is exact string match. [`VersionId::compare`] offers a numeric
/// ordering for contributors that need "at least 2.0" style checks; the
/// engine itself never orders versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare dot-separated numeric components (`"2.10" > "2.9"`).
    ///
    /// Missing components count as zero. Non-numeric components fall back
    /// to plain string comparison for that position.
    pub fn compare(&self, other: &str) -> Ordering {
        let mut left = self.0.split('.');
        let mut right = other.split('.');
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (l, r) => {
                    let l = l.unwrap_or("0");
                    let r = r.unwrap_or("0");
                    let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                        (Ok(a), Ok(b)) => a.cmp(&b),
                        _ => l.cmp(r),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }

    pub fn is_at_least(&self, other: &str) -> bool {
        self.compare(other) != Ordering::Less
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VersionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for VersionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VersionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Document family. Each family has its own registry, chains and routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// `http://nodeinfo.diaspora.software` schemas 1.0 through 2.2.
    NodeInfo,
    /// The `x-nodeinfo2` sibling schema.
    NodeInfo2,
}

impl Family {
    /// Route namespace of the family's versioned documents.
    pub fn namespace(self) -> &'static str {
        match self {
            Family::NodeInfo => "nodeinfo",
            Family::NodeInfo2 => "nodeinfo2",
        }
    }

    /// Path of the document endpoint for `version`, relative to the host root.
    pub fn document_path(self, version: &str) -> String {
        format!("/{}/{}", self.namespace(), version)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}
