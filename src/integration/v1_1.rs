//! NodeInfo 1.1 (<https://nodeinfo.diaspora.software/protocol/1.1>).

use serde_json::Value;

use super::v1_0::properties_1x;
use super::{merge_properties, metadata, overlay, software, usage, InOut, VersionContributor};
use crate::chain::BuildContext;
use crate::error::Result;

const VERSION: &str = "1.1";

pub struct NodeInfo11;

impl VersionContributor for NodeInfo11 {
    fn id(&self) -> &'static str {
        "nodeinfo-1.1"
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

    // 1.1 advertises outbound mail as a protocol, unlike 1.0.
    fn protocols(&self, current: Value, ctx: &BuildContext<'_>) -> Result<Value> {
        if !ctx.is(VERSION) {
            return Ok(current);
        }
        Ok(serde_json::to_value(InOut::new(&[], &["smtp"]))?)
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

    fn schema(&self, schema: Value) -> Value {
        merge_properties(
            schema,
            properties_1x(&["diaspora", "friendica", "hubzilla", "redmatrix"]),
        )
    }
}
