//! Route binding against a recording registrar.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use nodeinfo::routes::{register_routes, ApiResponse, Handler, Method, RouteRegistrar, RouteRequest};
use nodeinfo::{
    BuildContext, Config, ExtensionPoint, FactError, FactSnapshot, Family, MemoryFacts, NodeInfo,
    NodeInfoBuilder, SiteIdentity, StaticUrls, DISCOVERY_CONTENT_TYPE,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct Router {
    routes: HashMap<(Method, String), Handler>,
}

impl RouteRegistrar for Router {
    fn register_route(&mut self, method: Method, path: &str, handler: Handler) {
        self.routes.insert((method, path.to_string()), handler);
    }
}

impl Router {
    fn call(&self, method: Method, path: &str, version: Option<&str>) -> ApiResponse {
        let handler = self
            .routes
            .get(&(method, path.to_string()))
            .unwrap_or_else(|| panic!("no route {method:?} {path}"));
        let mut request = RouteRequest::new();
        if let Some(version) = version {
            request = request.with_param("version", version);
        }
        handler(&request)
    }
}

fn facts() -> MemoryFacts {
    MemoryFacts::new(FactSnapshot {
        users_can_register: false,
        author_count: 2,
        approved_comments: 4,
        identity: SiteIdentity {
            name: "Routes".into(),
            home_url: "https://example.com/".into(),
            software_version: "6.4.3".into(),
            ..SiteIdentity::default()
        },
        now: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        ..FactSnapshot::default()
    })
}

fn router_for(nodeinfo: NodeInfo) -> Router {
    let mut router = Router::default();
    register_routes(Arc::new(nodeinfo), &mut router);
    router
}

fn router() -> Router {
    let config = Config::from_json(r#"{ "versions": ["1.0", "2.0", "2.2"] }"#).unwrap();
    let nodeinfo = NodeInfo::from_config(
        &config,
        Arc::new(facts()),
        Arc::new(StaticUrls::new("https://example.com/wp-json")),
    )
    .unwrap();
    router_for(nodeinfo)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn registers_every_route() {
    let router = router();
    let mut paths: Vec<(Method, String)> = router.routes.keys().cloned().collect();
    paths.sort_by(|a, b| a.1.cmp(&b.1).then((a.0 as u8).cmp(&(b.0 as u8))));
    assert_eq!(
        paths,
        vec![
            (Method::Get, "/.well-known/nodeinfo".to_string()),
            (Method::Get, "/.well-known/x-nodeinfo2".to_string()),
            (Method::Get, "/nodeinfo/discovery".to_string()),
            (Method::Get, "/nodeinfo/{version}".to_string()),
            (Method::Options, "/nodeinfo/{version}".to_string()),
            (Method::Get, "/nodeinfo2/{version}".to_string()),
            (Method::Options, "/nodeinfo2/{version}".to_string()),
        ]
    );
}

#[test]
fn discovery_endpoint() {
    let router = router();
    let response = router.call(Method::Get, "/nodeinfo/discovery", None);
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, DISCOVERY_CONTENT_TYPE);
    assert_eq!(
        response.body,
        json!({
            "links": [
                {
                    "rel": "http://nodeinfo.diaspora.software/ns/schema/1.0",
                    "href": "https://example.com/wp-json/nodeinfo/1.0"
                },
                {
                    "rel": "http://nodeinfo.diaspora.software/ns/schema/2.0",
                    "href": "https://example.com/wp-json/nodeinfo/2.0"
                },
                {
                    "rel": "http://nodeinfo.diaspora.software/ns/schema/2.2",
                    "href": "https://example.com/wp-json/nodeinfo/2.2"
                }
            ]
        })
    );

    let alias = router.call(Method::Get, "/.well-known/nodeinfo", None);
    assert_eq!(alias, response);
}

#[test]
fn document_endpoint() {
    let router = router();
    let response = router.call(Method::Get, "/nodeinfo/{version}", Some("2.0"));
    assert_eq!(response.status, 200);
    assert_eq!(
        response.content_type,
        "application/json; profile=\"http://nodeinfo.diaspora.software/ns/schema/2.0#\""
    );
    assert_eq!(response.body["version"], "2.0");
    assert_eq!(response.body["software"]["version"], "6.4");
    assert_eq!(response.body["openRegistrations"], false);
    assert_eq!(response.body["usage"]["localComments"], 4);
}

#[test]
fn unknown_version_is_bad_request() {
    let router = router();
    let response = router.call(Method::Get, "/nodeinfo/{version}", Some("2.1"));
    assert_eq!(response.status, 400);
    assert_eq!(response.body, json!({ "error": "Unknown NodeInfo version: 2.1" }));
}

#[test]
fn malformed_version_is_not_found() {
    let router = router();
    for version in [Some("latest"), Some("2"), Some("2.0.1"), None] {
        let response = router.call(Method::Get, "/nodeinfo/{version}", version);
        assert_eq!(response.status, 404, "{version:?}");
        assert!(response.body["error"].is_string());
    }
}

#[test]
fn options_serves_schema() {
    let router = router();
    let response = router.call(Method::Options, "/nodeinfo/{version}", Some("2.0"));
    assert_eq!(response.status, 200);
    assert_eq!(response.body["title"], "nodeinfo");
    assert!(response.body["properties"]["instance"].is_object());

    let response = router.call(Method::Options, "/nodeinfo2/{version}", Some("1.0"));
    assert_eq!(response.body["title"], "nodeinfo2");

    let response = router.call(Method::Options, "/nodeinfo/{version}", Some("9.9"));
    assert_eq!(response.status, 400);
}

#[test]
fn nodeinfo2_endpoint_and_alias() {
    let router = router();
    let response = router.call(Method::Get, "/nodeinfo2/{version}", Some("1.0"));
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(response.body["server"]["name"], "Routes");
    assert_eq!(response.body["server"]["version"], "6.4");

    let alias = router.call(Method::Get, "/.well-known/x-nodeinfo2", None);
    assert_eq!(alias, response);

    let response = router.call(Method::Get, "/nodeinfo2/{version}", Some("2.0"));
    assert_eq!(response.status, 400);
}

#[test]
fn fact_failure_is_server_error() {
    let mut builder = NodeInfoBuilder::new(
        Arc::new(facts()),
        Arc::new(StaticUrls::new("https://example.com")),
    );
    builder.register(nodeinfo::integration::NodeInfo20).unwrap();
    builder
        .add_filter(
            Family::NodeInfo,
            ExtensionPoint::Usage,
            "broken-counter",
            |_: Value, _: &BuildContext<'_>| {
                Err(FactError::Unavailable {
                    fact: "published_post_count",
                    reason: "database offline".into(),
                }
                .into())
            },
        )
        .unwrap();
    let router = router_for(builder.build());

    let response = router.call(Method::Get, "/nodeinfo/{version}", Some("2.0"));
    assert_eq!(response.status, 500);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("database offline"));
    assert!(response.body.get("version").is_none());
}
