//! Version contributors: one self-filtering unit per schema version.
//!
//! A contributor fills the extension points of exactly one version. The engine
//! hands every request to every contributor of the family; each method checks
//! the requested version and returns the current value untouched on mismatch.

mod nodeinfo2;
mod v1_0;
mod v1_1;
mod v2_0;
mod v2_1;
mod v2_2;

pub use nodeinfo2::NodeInfo2;
pub use v1_0::NodeInfo10;
pub use v1_1::NodeInfo11;
pub use v2_0::NodeInfo20;
pub use v2_1::NodeInfo21;
pub use v2_2::NodeInfo22;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::chain::{BuildContext, ExtensionPoint};
use crate::error::Result;
use crate::facts::{active_users, mask_version, ActivityWindow};
use crate::version::Family;

// ============================================================================
// VersionContributor
// ============================================================================

/// Fills the fields of one schema version.
///
/// Every hook defaults to returning `current` unchanged, so a contributor only
/// implements the fields its version defines.
pub trait VersionContributor: Send + Sync {
    /// Stable identifier. Registering the same id twice is a no-op.
    fn id(&self) -> &'static str;

    /// The version this contributor claims.
    fn version(&self) -> &'static str;

    fn family(&self) -> Family {
        Family::NodeInfo
    }

    fn software(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    fn server(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    fn protocols(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    fn services(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    fn usage(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    fn metadata(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    /// Whole-document transform, applied after every field is assembled.
    fn document(&self, current: Value, _ctx: &BuildContext<'_>) -> Result<Value> {
        Ok(current)
    }

    /// Fold this version's property definitions into `schema`.
    fn schema(&self, schema: Value) -> Value {
        schema
    }

    /// Dispatch to the hook for `point`.
    fn contribute(
        &self,
        point: ExtensionPoint,
        current: Value,
        ctx: &BuildContext<'_>,
    ) -> Result<Value> {
        match point {
            ExtensionPoint::Software => self.software(current, ctx),
            ExtensionPoint::Server => self.server(current, ctx),
            ExtensionPoint::Protocols => self.protocols(current, ctx),
            ExtensionPoint::Services => self.services(current, ctx),
            ExtensionPoint::Usage => self.usage(current, ctx),
            ExtensionPoint::Metadata => self.metadata(current, ctx),
            ExtensionPoint::Document => self.document(current, ctx),
        }
    }
}

/// The shipped contributor for a NodeInfo version, if any.
pub fn contributor_for(version: &str) -> Option<Box<dyn VersionContributor>> {
    let contributor: Box<dyn VersionContributor> = match version {
        "1.0" => Box::new(NodeInfo10),
        "1.1" => Box::new(NodeInfo11),
        "2.0" => Box::new(NodeInfo20),
        "2.1" => Box::new(NodeInfo21),
        "2.2" => Box::new(NodeInfo22),
        _ => return None,
    };
    Some(contributor)
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Software {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// `{inbound, outbound}` pair used by services and by 1.x protocols.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InOut {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
}

impl InOut {
    pub fn new(inbound: &[&str], outbound: &[&str]) -> Self {
        Self {
            inbound: inbound.iter().map(|s| s.to_string()).collect(),
            outbound: outbound.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub total: u64,
    pub active_month: u64,
    pub active_halfyear: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_week: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub users: UserCounts,
    pub local_posts: u64,
    pub local_comments: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub node_name: String,
    pub node_description: String,
    pub node_icon: String,
}

// ============================================================================
// Shared builders
// ============================================================================

/// Services advertised by every 2.x document and by NodeInfo2.
pub(crate) const SERVICES_INBOUND: [&str; 3] = ["atom1.0", "rss2.0", "pop3"];
pub(crate) const SERVICES_OUTBOUND: [&str; 4] = ["atom1.0", "rss2.0", "wordpress", "smtp"];

pub(crate) fn software(ctx: &BuildContext<'_>, with_links: bool) -> Result<Software> {
    let identity = ctx.facts.site_identity()?;
    Ok(Software {
        name: ctx.software.name.clone(),
        version: mask_version(&identity.software_version),
        repository: with_links.then(|| ctx.software.repository.clone()),
        homepage: if with_links {
            ctx.software.homepage.clone()
        } else {
            None
        },
    })
}

pub(crate) fn usage(ctx: &BuildContext<'_>, with_week: bool) -> Result<Usage> {
    let facts = ctx.facts;
    let active_week = if with_week {
        Some(active_users(facts, ActivityWindow::Week)?)
    } else {
        None
    };
    Ok(Usage {
        users: UserCounts {
            total: facts.author_count()?,
            active_month: active_users(facts, ActivityWindow::Month)?,
            active_halfyear: active_users(facts, ActivityWindow::HalfYear)?,
            active_week,
        },
        local_posts: facts.published_post_count()?,
        local_comments: facts.approved_comment_count()?,
    })
}

pub(crate) fn metadata(ctx: &BuildContext<'_>) -> Result<NodeMetadata> {
    let identity = ctx.facts.site_identity()?;
    Ok(NodeMetadata {
        node_name: identity.name,
        node_description: identity.description,
        node_icon: identity.icon_url,
    })
}

/// Replace the top-level keys of `current` with those of `fragment`.
///
/// Sub-objects are replaced whole, never deep-merged. A non-object `current`
/// is discarded.
pub(crate) fn overlay(current: Value, fragment: impl Serialize) -> Result<Value> {
    let fragment = serde_json::to_value(fragment)?;
    match (current, fragment) {
        (Value::Object(mut base), Value::Object(update)) => {
            for (key, value) in update {
                base.insert(key, value);
            }
            Ok(Value::Object(base))
        }
        (_, fragment) => Ok(fragment),
    }
}

/// Keep a flat protocol list, resetting anything else to an empty list.
pub(crate) fn flat_protocols(current: Value) -> Value {
    match current {
        Value::Array(_) => current,
        _ => Value::Array(Vec::new()),
    }
}

/// Merge `properties` into `schema.properties`, later definitions replacing
/// earlier ones entirely.
pub(crate) fn merge_properties(mut schema: Value, properties: Value) -> Value {
    let Value::Object(properties) = properties else {
        return schema;
    };
    if !schema.is_object() {
        schema = Value::Object(Map::new());
    }
    let slot = &mut schema["properties"];
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(existing) = slot {
        for (key, definition) in properties {
            existing.insert(key, definition);
        }
    }
    schema
}
