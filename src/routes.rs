//! Transport binding.
//!
//! The host owns HTTP. It hands the engine a [`RouteRegistrar`]; the engine
//! registers one handler per method and path and the host calls them with the
//! matched path parameters. Handlers never panic and never return partial
//! documents: every outcome is an [`ApiResponse`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

use crate::discovery::{DISCOVERY_CONTENT_TYPE, SCHEMA_REL_PREFIX};
use crate::error::NodeInfoError;
use crate::service::NodeInfo;
use crate::version::Family;

pub const JSON_CONTENT_TYPE: &str = "application/json";

pub const DISCOVERY_PATH: &str = "/nodeinfo/discovery";
pub const WELL_KNOWN_NODEINFO: &str = "/.well-known/nodeinfo";
pub const WELL_KNOWN_NODEINFO2: &str = "/.well-known/x-nodeinfo2";

/// Version served by the NodeInfo2 well-known alias.
const NODEINFO2_ALIAS_VERSION: &str = "1.0";

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("version segment pattern is valid"));

fn is_version_segment(segment: &str) -> bool {
    VERSION_SEGMENT.is_match(segment)
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Options,
}

/// Path parameters of a matched route.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    params: HashMap<String, String>,
}

impl RouteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Value,
}

impl ApiResponse {
    fn ok(content_type: impl Into<String>, body: Value) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body,
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: json!({ "error": message.into() }),
        }
    }

    fn from_error(err: NodeInfoError) -> Self {
        if err.is_client_error() {
            return Self::error(400, err.to_string());
        }
        warn!(error = %err, "nodeinfo request failed");
        Self::error(500, err.to_string())
    }
}

pub type Handler = Arc<dyn Fn(&RouteRequest) -> ApiResponse + Send + Sync>;

/// Host-side route table.
pub trait RouteRegistrar {
    /// `path` uses `{name}` placeholders; the host passes matched segments
    /// back through [`RouteRequest::param`].
    fn register_route(&mut self, method: Method, path: &str, handler: Handler);
}

// ============================================================================
// Registration
// ============================================================================

/// Register every NodeInfo route with the host.
pub fn register_routes(nodeinfo: Arc<NodeInfo>, registrar: &mut dyn RouteRegistrar) {
    let discovery: Handler = {
        let nodeinfo = Arc::clone(&nodeinfo);
        Arc::new(move |_: &RouteRequest| discovery_response(&nodeinfo))
    };
    registrar.register_route(Method::Get, DISCOVERY_PATH, Arc::clone(&discovery));
    registrar.register_route(Method::Get, WELL_KNOWN_NODEINFO, discovery);

    for family in [Family::NodeInfo, Family::NodeInfo2] {
        let path = format!("/{}/{{version}}", family.namespace());
        let get = Arc::clone(&nodeinfo);
        registrar.register_route(
            Method::Get,
            &path,
            Arc::new(move |request: &RouteRequest| {
                document_response(&get, family, request.param("version"))
            }),
        );
        let options = Arc::clone(&nodeinfo);
        registrar.register_route(
            Method::Options,
            &path,
            Arc::new(move |request: &RouteRequest| {
                schema_response(&options, family, request.param("version"))
            }),
        );
    }

    registrar.register_route(
        Method::Get,
        WELL_KNOWN_NODEINFO2,
        Arc::new(move |_: &RouteRequest| {
            document_response(&nodeinfo, Family::NodeInfo2, Some(NODEINFO2_ALIAS_VERSION))
        }),
    );
}

// ============================================================================
// Handlers
// ============================================================================

pub fn discovery_response(nodeinfo: &NodeInfo) -> ApiResponse {
    match nodeinfo.discovery() {
        Ok(body) => ApiResponse::ok(DISCOVERY_CONTENT_TYPE, body),
        Err(err) => ApiResponse::from_error(err),
    }
}

pub fn document_response(nodeinfo: &NodeInfo, family: Family, version: Option<&str>) -> ApiResponse {
    let version = match version {
        Some(version) if is_version_segment(version) => version,
        _ => return ApiResponse::error(404, "No route was found matching the URL"),
    };
    match nodeinfo.build(family, version) {
        Ok(document) => ApiResponse::ok(document_content_type(family, version), document.into_value()),
        Err(err) => ApiResponse::from_error(err),
    }
}

pub fn schema_response(nodeinfo: &NodeInfo, family: Family, version: Option<&str>) -> ApiResponse {
    let version = match version {
        Some(version) if is_version_segment(version) => version,
        _ => return ApiResponse::error(404, "No route was found matching the URL"),
    };
    if !nodeinfo.is_known(family, version) {
        return ApiResponse::from_error(NodeInfoError::UnknownVersion(version.to_string()));
    }
    ApiResponse::ok(JSON_CONTENT_TYPE, nodeinfo.schema_for(family))
}

fn document_content_type(family: Family, version: &str) -> String {
    match family {
        Family::NodeInfo => format!("{JSON_CONTENT_TYPE}; profile=\"{SCHEMA_REL_PREFIX}{version}#\""),
        Family::NodeInfo2 => JSON_CONTENT_TYPE.to_string(),
    }
}
