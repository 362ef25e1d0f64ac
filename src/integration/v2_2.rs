//! NodeInfo 2.2 (<https://nodeinfo.diaspora.software/protocol/2.2>).
//!
//! Adds the `instance` object and the weekly active-user counter to 2.1.

use serde::Serialize;
use serde_json::Value;

use super::v2_1::properties_2x;
use super::{
    flat_protocols, merge_properties, metadata, overlay, software, usage, InOut,
    VersionContributor, SERVICES_INBOUND, SERVICES_OUTBOUND,
};
use crate::chain::BuildContext;
use crate::error::{NodeInfoError, Result};

const VERSION: &str = "2.2";

#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    pub name: String,
    pub description: String,
}

pub struct NodeInfo22;

impl VersionContributor for NodeInfo22 {
    fn id(&self) -> &'static str {
        "nodeinfo-2.2"
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
        overlay(current, usage(ctx, true)?)
    }

    fn metadata(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        overlay(current, metadata(ctx)?)
    }

    fn document(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        let Value::Object(mut document) = current else {
            return Err(NodeInfoError::InvalidContribution {
                point: "document",
                expected: "an object",
            });
        };
        let identity = ctx.facts.site_identity()?;
        let instance = Instance {
            name: identity.name,
            description: identity.description,
        };
        document.insert("instance".to_string(), serde_json::to_value(instance)?);
        Ok(Value::Object(document))
    }

    fn schema(&self, schema: Value) -> Value {
        merge_properties(schema, properties_2x(true))
    }
}
