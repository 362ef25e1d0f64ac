//! NodeInfo 2.1 (<https://nodeinfo.diaspora.software/protocol/2.1>).

use serde_json::{json, Value};

use super::{
    flat_protocols, merge_properties, metadata, overlay, software, usage, InOut,
    VersionContributor, SERVICES_INBOUND, SERVICES_OUTBOUND,
};
use crate::chain::BuildContext;
use crate::error::Result;

const VERSION: &str = "2.1";

pub struct NodeInfo21;

impl VersionContributor for NodeInfo21 {
    fn id(&self) -> &'static str {
        "nodeinfo-2.1"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn software(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        overlay(current, software(ctx, true)?)
    }

    fn protocols(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        Ok(flat_protocols(current))
    }

    fn services(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        Ok(serde_json::to_value(InOut::new(
            &SERVICES_INBOUND,
            &SERVICES_OUTBOUND,
        ))?)
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

    fn schema(&self, schema: Value) -> Value {
        merge_properties(schema, properties_2x(false))
    }
}

/// Property definitions of the 2.1 schema. `latest` adds the 2.2 additions:
/// the `instance` object and the `activeWeek` counter.
pub(super) fn properties_2x(latest: bool) -> Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    let mut users = json!({
        "total": { "type": "integer" },
        "activeMonth": { "type": "integer" },
        "activeHalfyear": { "type": "integer" }
    });
    if latest {
        users["activeWeek"] = json!({ "type": "integer" });
    }

    let mut properties = json!({
        "version": {
            "description": "The NodeInfo schema version.",
            "type": "string"
        },
        "software": {
            "description": "Metadata about server software in use.",
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "version": { "type": "string" },
                "repository": { "type": "string", "format": "uri" },
                "homepage": { "type": "string", "format": "uri" }
            }
        },
        "protocols": {
            "description": "The protocols supported on this server.",
            "type": "array",
            "items": { "type": "string" }
        },
        "services": {
            "description": "Third party sites this server can connect to.",
            "type": "object",
            "properties": { "inbound": strings, "outbound": strings }
        },
        "openRegistrations": {
            "description": "Whether this server allows open self-registration.",
            "type": "boolean"
        },
        "usage": {
            "description": "Usage statistics for this server.",
            "type": "object",
            "properties": {
                "users": { "type": "object", "properties": users },
                "localPosts": { "type": "integer" },
                "localComments": { "type": "integer" }
            }
        },
        "metadata": {
            "description": "Free form key value pairs for software specific values.",
            "type": "object"
        }
    });
    if latest {
        properties["instance"] = json!({
            "description": "Metadata about this specific instance.",
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "description": { "type": "string" }
            }
        });
    }
    properties
}
