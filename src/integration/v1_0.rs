//! NodeInfo 1.0 (<https://nodeinfo.diaspora.software/protocol/1.0>).

use serde_json::{json, Value};

use super::{merge_properties, metadata, overlay, software, usage, InOut, VersionContributor};
use crate::chain::BuildContext;
use crate::error::Result;

const VERSION: &str = "1.0";

pub struct NodeInfo10;

impl VersionContributor for NodeInfo10 {
    fn id(&self) -> &'static str {
        "nodeinfo-1.0"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn software(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        overlay(current, software(ctx, false)?)
    }

    fn protocols(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        Ok(serde_json::to_value(InOut::default())?)
    }

    fn services(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        Ok(serde_json::to_value(InOut::new(&[], &["smtp"]))?)
    }

    fn usage(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        overlay(current, usage(ctx, false)?)
    }

    fn metadata(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        overlay(current, metadata(ctx)?)
    }

    // https://github.com/jhass/nodeinfo/blob/main/schemas/1.0/schema.json
    fn schema(&self, schema: Value) -> Value {
        merge_properties(schema, properties_1x(&["diaspora", "friendica", "redmatrix"]))
    }
}

const PROTOCOLS_1X: [&str; 10] = [
    "buddycloud",
    "diaspora",
    "friendica",
    "gnusocial",
    "libertree",
    "mediagoblin",
    "pumpio",
    "redmatrix",
    "smtp",
    "tent",
];

const OUTBOUND_SERVICES_1X: [&str; 26] = [
    "appnet",
    "blogger",
    "buddycloud",
    "diaspora",
    "dreamwidth",
    "drupal",
    "facebook",
    "friendica",
    "gnusocial",
    "google",
    "insanejournal",
    "libertree",
    "linkedin",
    "livejournal",
    "mediagoblin",
    "myspace",
    "pinterest",
    "posterous",
    "pumpio",
    "redmatrix",
    "smtp",
    "tent",
    "tumblr",
    "twitter",
    "wordpress",
    "xmpp",
];

/// Property definitions shared by the 1.x schemas, which differ only in the
/// software names they enumerate.
pub(super) fn properties_1x(software_names: &[&str]) -> Value {
    let count = json!({ "type": "integer", "minimum": 0 });
    json!({
        "version": {
            "description": "The NodeInfo schema version.",
            "type": "string"
        },
        "software": {
            "description": "Metadata about server software in use.",
            "type": "object",
            "properties": {
                "name": { "type": "string", "enum": software_names },
                "version": { "type": "string" }
            }
        },
        "protocols": {
            "description": "The protocols supported on this server.",
            "type": "object",
            "properties": {
                "inbound": { "type": "array", "items": { "type": "string", "enum": PROTOCOLS_1X } },
                "outbound": { "type": "array", "items": { "type": "string", "enum": PROTOCOLS_1X } }
            }
        },
        "services": {
            "description": "Third party sites this server can connect to.",
            "type": "object",
            "properties": {
                "inbound": {
                    "type": "array",
                    "items": { "type": "string", "enum": ["appnet", "gnusocial", "pumpio"] }
                },
                "outbound": {
                    "type": "array",
                    "items": { "type": "string", "enum": OUTBOUND_SERVICES_1X }
                }
            }
        },
        "openRegistrations": {
            "description": "Whether this server allows open self-registration.",
            "type": "boolean"
        },
        "usage": {
            "description": "Usage statistics for this server.",
            "type": "object",
            "properties": {
                "users": {
                    "type": "object",
                    "properties": {
                        "total": count,
                        "activeMonth": count,
                        "activeHalfyear": count
                    }
                },
                "localPosts": count,
                "localComments": count
            }
        },
        "metadata": {
            "description": "Free form key value pairs for software specific values.",
            "type": "object"
        }
    })
}
