//! NodeInfo 2.0 (<https://nodeinfo.diaspora.software/protocol/2.0>).

use serde_json::{json, Value};

use super::{
    flat_protocols, merge_properties, metadata, overlay, software, usage, InOut,
    VersionContributor, SERVICES_INBOUND, SERVICES_OUTBOUND,
};
use crate::chain::BuildContext;
use crate::error::Result;

const VERSION: &str = "2.0";

pub struct NodeInfo20;

impl VersionContributor for NodeInfo20 {
    fn id(&self) -> &'static str {
        "nodeinfo-2.0"
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

    // https://github.com/jhass/nodeinfo/blob/main/schemas/2.0/schema.json
    fn schema(&self, schema: Value) -> Value {
        let count = json!({ "type": "integer", "minimum": 0 });
        merge_properties(
            schema,
            json!({
                "version": {
                    "description": "The NodeInfo schema version.",
                    "type": "string"
                },
                "software": {
                    "description": "Metadata about server software in use.",
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "pattern": "^[a-z0-9-]+$" },
                        "version": { "type": "string" }
                    }
                },
                "protocols": {
                    "description": "The protocols supported on this server.",
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": [
                            "activitypub", "buddycloud", "dfrn", "diaspora", "libertree",
                            "ostatus", "pumpio", "tent", "xmpp", "zot"
                        ]
                    }
                },
                "services": {
                    "description": "Third party sites this server can connect to.",
                    "type": "object",
                    "properties": {
                        "inbound": {
                            "type": "array",
                            "items": {
                                "type": "string",
                                "enum": [
                                    "atom1.0", "gnusocial", "imap", "pnut", "pop3",
                                    "pumpio", "rss2.0", "twitter"
                                ]
                            }
                        },
                        "outbound": {
                            "type": "array",
                            "items": {
                                "type": "string",
                                "enum": [
                                    "atom1.0", "blogger", "buddycloud", "diaspora",
                                    "dreamwidth", "drupal", "facebook", "friendica",
                                    "gnusocial", "google", "insanejournal", "libertree",
                                    "linkedin", "livejournal", "mediagoblin", "myspace",
                                    "pinterest", "pnut", "posterous", "pumpio", "redmatrix",
                                    "rss2.0", "smtp", "tent", "tumblr", "twitter",
                                    "wordpress", "xmpp"
                                ]
                            }
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
                                "activeHalfyear": count,
                                "activeMonth": count
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
            }),
        )
    }
}
