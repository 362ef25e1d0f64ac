//! NodeInfo2 1.0 (<https://github.com/jaywink/nodeinfo2>).
//!
//! A sibling family with its own namespace. `software` is replaced by a
//! `server` object; everything else follows the NodeInfo 2.x shapes.

use serde::Serialize;
use serde_json::{json, Value};

use super::{
    flat_protocols, metadata, overlay, usage, InOut, VersionContributor, SERVICES_INBOUND,
    SERVICES_OUTBOUND,
};
use crate::chain::BuildContext;
use crate::error::Result;
use crate::facts::mask_version;
use crate::version::Family;

const VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub base_url: String,
    pub name: String,
    pub software: String,
    pub version: String,
}

pub struct NodeInfo2;

impl VersionContributor for NodeInfo2 {
    fn id(&self) -> &'static str {
        "nodeinfo2-1.0"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn family(&self) -> Family {
        Family::NodeInfo2
    }

    fn server(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        let identity = ctx.facts.site_identity()?;
        overlay(
            current,
            Server {
                base_url: identity.home_url,
                name: identity.name,
                software: ctx.software.name.clone(),
                version: mask_version(&identity.software_version),
            },
        )
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

    /// The NodeInfo2 schema is fixed; it replaces whatever it is given.
    fn schema(&self, _schema: Value) -> Value {
        let strings = json!({ "type": "array", "items": { "type": "string" } });
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "title": "nodeinfo2",
            "type": "object",
            "properties": {
                "version": {
                    "description": "The NodeInfo2 schema version.",
                    "type": "string",
                    "enum": [VERSION]
                },
                "server": {
                    "description": "Metadata about the server.",
                    "type": "object",
                    "properties": {
                        "baseUrl": { "type": "string", "format": "uri" },
                        "name": { "type": "string" },
                        "software": { "type": "string" },
                        "version": { "type": "string" }
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
                        "users": {
                            "type": "object",
                            "properties": {
                                "total": { "type": "integer" },
                                "activeMonth": { "type": "integer" },
                                "activeHalfyear": { "type": "integer" }
                            }
                        },
                        "localPosts": { "type": "integer" },
                        "localComments": { "type": "integer" }
                    }
                },
                "metadata": {
                    "description": "Free form key value pairs for software specific values.",
                    "type": "object"
                }
            }
        })
    }
}
