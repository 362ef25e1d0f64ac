//! Discovery assembler: the well-known links document and link injection
//! into foreign JRD documents (WebFinger, Host-Meta).

use std::sync::Arc;

use parking_lot::Once;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::facts::UrlResolver;
use crate::registry::VersionRegistry;
use crate::version::Family;

/// Prefix of every NodeInfo schema rel; the version is appended.
pub const SCHEMA_REL_PREFIX: &str = "http://nodeinfo.diaspora.software/ns/schema/";

/// Content type of the discovery and document responses.
pub const DISCOVERY_CONTENT_TYPE: &str =
    "application/json; profile=http://nodeinfo.diaspora.software";

/// A `{rel, href}` link, as used by discovery documents and JRDs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryLink {
    pub rel: String,
    pub href: String,
}

/// Deprecated discovery extension point: receives the assembled discovery
/// document and returns its own rendition of it.
pub type LegacyDiscoveryHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

static LEGACY_HOOK_WARNING: Once = Once::new();

/// Links of every registered version, in registration order.
pub fn links(registry: &VersionRegistry, urls: &dyn UrlResolver) -> Vec<DiscoveryLink> {
    registry
        .list()
        .iter()
        .map(|version| DiscoveryLink {
            rel: format!("{SCHEMA_REL_PREFIX}{version}"),
            href: urls.absolute_url(&Family::NodeInfo.document_path(version.as_str())),
        })
        .collect()
}

/// Append `extra` to `existing`. Existing entries are never replaced or
/// deduplicated.
pub fn augment(mut existing: Vec<DiscoveryLink>, extra: &[DiscoveryLink]) -> Vec<DiscoveryLink> {
    existing.extend_from_slice(extra);
    existing
}

/// Append `extra` to the `links` array of a JRD document, creating the array
/// when absent. Other keys and entries that are not links are left alone.
///
/// A non-object `jrd` is replaced by `{"links": extra}`.
pub fn augment_jrd(jrd: &mut Value, extra: &[DiscoveryLink]) -> Result<()> {
    if !jrd.is_object() {
        *jrd = Value::Object(Map::new());
    }
    let slot = &mut jrd["links"];
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    if let Value::Array(list) = slot {
        for link in extra {
            list.push(serde_json::to_value(link)?);
        }
    }
    Ok(())
}

/// Discovery document with the legacy hook, if any, merged in.
pub fn discovery_document(
    links: Vec<DiscoveryLink>,
    legacy: Option<&LegacyDiscoveryHook>,
) -> Result<Value> {
    debug!(links = links.len(), "assembling discovery document");
    let mut document = Map::new();
    document.insert("links".to_string(), serde_json::to_value(links)?);
    let primary = Value::Object(document);

    let Some(hook) = legacy else {
        return Ok(primary);
    };
    LEGACY_HOOK_WARNING.call_once(|| {
        warn!("the legacy discovery hook is deprecated; register a version contributor or filter instead");
    });
    let legacy_document = hook(primary.clone());
    Ok(merge_legacy(primary, legacy_document))
}

/// Merge a legacy discovery document into the primary one.
///
/// Keys missing from `primary` are added. `links` arrays are unioned, legacy
/// entries not already present appended after the primary ones. Any other
/// conflicting key keeps the primary value.
pub fn merge_legacy(primary: Value, legacy: Value) -> Value {
    let mut merged = match primary {
        Value::Object(map) => map,
        other => return other,
    };
    let Value::Object(legacy) = legacy else {
        return Value::Object(merged);
    };
    for (key, value) in legacy {
        match merged.get_mut(&key) {
            None => {
                merged.insert(key, value);
            }
            Some(Value::Array(ours)) if key == "links" => {
                if let Value::Array(theirs) = value {
                    for link in theirs {
                        if !ours.contains(&link) {
                            ours.push(link);
                        }
                    }
                }
            }
            Some(_) => {}
        }
    }
    Value::Object(merged)
}
