//! End-to-end document scenarios over `MemoryFacts`.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use nodeinfo::integration::{NodeInfo10, NodeInfo11, NodeInfo2, NodeInfo20, NodeInfo21, NodeInfo22};
use nodeinfo::{
    Config, DiscoveryLink, Family, FactSnapshot, MemoryFacts, NodeInfo, NodeInfoBuilder,
    NodeInfoError, PostRecord, SiteIdentity, StaticUrls, VersionId,
};
use serde_json::{json, Value};

// ============================================================================
// Helpers
// ============================================================================

fn snapshot() -> FactSnapshot {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    FactSnapshot {
        users_can_register: true,
        author_count: 10,
        approved_comments: 1,
        posts: vec![
            PostRecord {
                author: 1,
                published_at: now - Duration::days(3),
            },
            PostRecord {
                author: 2,
                published_at: now - Duration::days(15),
            },
            PostRecord {
                author: 1,
                published_at: now - Duration::days(90),
            },
        ],
        identity: SiteIdentity {
            name: "Example Blog".into(),
            description: "Just another blog".into(),
            icon_url: "https://example.com/icon.png".into(),
            home_url: "https://example.com/".into(),
            software_version: "6.5.2-beta1".into(),
        },
        now: Some(now),
    }
}

fn urls() -> Arc<StaticUrls> {
    Arc::new(StaticUrls::new("https://example.com/wp-json"))
}

/// Registry `{1.0, 2.0, 2.2}` over the fixture facts.
fn partial_engine() -> NodeInfo {
    let mut builder = NodeInfoBuilder::new(Arc::new(MemoryFacts::new(snapshot())), urls());
    builder.register(NodeInfo10).unwrap();
    builder.register(NodeInfo20).unwrap();
    builder.register(NodeInfo22).unwrap();
    builder.build()
}

fn full_engine() -> NodeInfo {
    NodeInfo::from_config(
        &Config::default(),
        Arc::new(MemoryFacts::new(snapshot())),
        urls(),
    )
    .unwrap()
}

// ============================================================================
// Registry and build contract
// ============================================================================

#[test]
fn unregistered_version_is_unknown() {
    let nodeinfo = partial_engine();
    let err = nodeinfo.document("1.1").unwrap_err();
    assert!(matches!(err, NodeInfoError::UnknownVersion(ref v) if v == "1.1"));
    assert!(err.is_client_error());
}

#[test]
fn every_registered_version_echoes_itself() {
    let nodeinfo = full_engine();
    for version in nodeinfo.versions(Family::NodeInfo) {
        let doc = nodeinfo.document(version.as_str()).unwrap();
        assert_eq!(doc.version(), Some(version.as_str()));
    }
}

#[test]
fn nodeinfo_2_2_scenario() {
    let nodeinfo = partial_engine();
    let doc = nodeinfo.document("2.2").unwrap();

    assert_eq!(doc.get("openRegistrations"), Some(&json!(true)));
    let usage = doc.get("usage").unwrap();
    assert_eq!(usage["localPosts"], 3);
    assert_eq!(usage["localComments"], 1);
    assert_eq!(usage["users"]["total"], 10);
    assert_eq!(
        doc.get("instance"),
        Some(&json!({ "name": "Example Blog", "description": "Just another blog" }))
    );

    let doc = nodeinfo.document("2.0").unwrap();
    assert!(!doc.contains_key("instance"));
}

#[test]
fn builds_are_deterministic() {
    let nodeinfo = full_engine();
    for version in ["1.0", "1.1", "2.0", "2.1", "2.2"] {
        let first = serde_json::to_string(&nodeinfo.document(version).unwrap()).unwrap();
        let second = serde_json::to_string(&nodeinfo.document(version).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn shapes_follow_the_version_family() {
    let nodeinfo = full_engine();
    for version in ["1.0", "1.1"] {
        let doc = nodeinfo.document(version).unwrap();
        for field in ["protocols", "services"] {
            let value = doc.get(field).unwrap();
            assert!(value["inbound"].is_array(), "{version} {field}");
            assert!(value["outbound"].is_array(), "{version} {field}");
        }
    }
    for version in ["2.0", "2.1", "2.2"] {
        let doc = nodeinfo.document(version).unwrap();
        assert_eq!(doc.get("protocols"), Some(&json!([])), "{version}");
        assert_eq!(
            doc.get("services"),
            Some(&json!({
                "inbound": ["atom1.0", "rss2.0", "pop3"],
                "outbound": ["atom1.0", "rss2.0", "wordpress", "smtp"]
            }))
        );
    }
}

#[test]
fn full_2_1_document() {
    let doc = full_engine().document("2.1").unwrap();
    let expected = json!({
        "version": "2.1",
        "software": {
            "name": "wordpress",
            "version": "6.5",
            "repository": "https://github.com/wordpress/wordpress"
        },
        "protocols": [],
        "services": {
            "inbound": ["atom1.0", "rss2.0", "pop3"],
            "outbound": ["atom1.0", "rss2.0", "wordpress", "smtp"]
        },
        "openRegistrations": true,
        "usage": {
            "users": { "total": 10, "activeMonth": 2, "activeHalfyear": 2 },
            "localPosts": 3,
            "localComments": 1
        },
        "metadata": {
            "nodeName": "Example Blog",
            "nodeDescription": "Just another blog",
            "nodeIcon": "https://example.com/icon.png"
        }
    });
    assert_eq!(doc.into_value(), expected);
}

#[test]
fn serialized_key_order_is_stable() {
    let doc = full_engine().document("2.2").unwrap();
    let text = serde_json::to_string(&doc).unwrap();
    let positions: Vec<usize> = [
        "\"version\"",
        "\"software\"",
        "\"protocols\"",
        "\"services\"",
        "\"openRegistrations\"",
        "\"usage\"",
        "\"metadata\"",
        "\"instance\"",
    ]
    .iter()
    .map(|key| text.find(key).unwrap())
    .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn facts_are_read_per_request() {
    let facts = Arc::new(MemoryFacts::new(snapshot()));
    let mut builder = NodeInfoBuilder::new(facts.clone(), urls());
    builder.register(NodeInfo21).unwrap();
    let nodeinfo = builder.build();

    assert_eq!(nodeinfo.document("2.1").unwrap().get("openRegistrations"), Some(&json!(true)));
    facts.update(|snapshot| snapshot.users_can_register = false);
    assert_eq!(nodeinfo.document("2.1").unwrap().get("openRegistrations"), Some(&json!(false)));
}

#[test]
fn refresh_during_a_build_lands_in_the_next_one() {
    let facts = Arc::new(MemoryFacts::new(snapshot()));
    let mut builder = NodeInfoBuilder::new(facts.clone(), urls());
    builder.register(NodeInfo21).unwrap();
    let refresher = facts.clone();
    builder
        .add_filter(
            Family::NodeInfo,
            nodeinfo::ExtensionPoint::Software,
            "refresh",
            move |current: Value, _| {
                refresher.update(|snapshot| {
                    snapshot.users_can_register = false;
                    snapshot.approved_comments = 99;
                });
                Ok(current)
            },
        )
        .unwrap();
    let nodeinfo = builder.build();

    let doc = nodeinfo.document("2.1").unwrap();
    assert_eq!(doc.get("openRegistrations"), Some(&json!(true)));
    assert_eq!(doc.get("usage").unwrap()["localComments"], 1);

    let doc = nodeinfo.document("2.1").unwrap();
    assert_eq!(doc.get("openRegistrations"), Some(&json!(false)));
    assert_eq!(doc.get("usage").unwrap()["localComments"], 99);
}

#[test]
fn registering_over_a_filter_id_is_refused() {
    let mut builder = NodeInfoBuilder::new(Arc::new(MemoryFacts::new(snapshot())), urls());
    builder
        .add_filter(
            Family::NodeInfo,
            nodeinfo::ExtensionPoint::Services,
            "nodeinfo-2.0",
            |current: Value, _| Ok(current),
        )
        .unwrap();
    let err = builder.register(NodeInfo20).unwrap_err();
    assert!(matches!(err, NodeInfoError::InvalidContribution { .. }));
    let nodeinfo = builder.build();
    assert!(nodeinfo.versions(Family::NodeInfo).is_empty());
    assert!(nodeinfo.document("2.0").is_err());
}

#[test]
fn masked_version_everywhere() {
    let nodeinfo = full_engine();
    for version in ["1.0", "1.1", "2.0", "2.1", "2.2"] {
        let doc = nodeinfo.document(version).unwrap();
        assert_eq!(doc.get("software").unwrap()["version"], "6.5");
    }
    let doc = nodeinfo.nodeinfo2("1.0").unwrap();
    assert_eq!(doc.get("server").unwrap()["version"], "6.5");
}

// ============================================================================
// NodeInfo2
// ============================================================================

#[test]
fn nodeinfo2_document() {
    let doc = full_engine().nodeinfo2("1.0").unwrap();
    assert_eq!(
        doc.get("server"),
        Some(&json!({
            "baseUrl": "https://example.com/",
            "name": "Example Blog",
            "software": "wordpress",
            "version": "6.5"
        }))
    );
    assert!(!doc.contains_key("software"));
    assert!(doc.get("usage").unwrap()["users"].get("activeWeek").is_none());
}

#[test]
fn nodeinfo2_registry_is_separate() {
    let mut builder = NodeInfoBuilder::new(Arc::new(MemoryFacts::new(snapshot())), urls());
    builder.register(NodeInfo10).unwrap();
    builder.register(NodeInfo2).unwrap();
    let nodeinfo = builder.build();

    assert_eq!(nodeinfo.versions(Family::NodeInfo), vec![VersionId::from("1.0")]);
    assert_eq!(nodeinfo.versions(Family::NodeInfo2), vec![VersionId::from("1.0")]);
    // Only NodeInfo versions are advertised.
    assert_eq!(nodeinfo.links().len(), 1);
    assert!(nodeinfo.nodeinfo2("1.0").unwrap().contains_key("server"));
    assert!(nodeinfo.document("1.0").unwrap().contains_key("software"));
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn discovery_lists_registered_versions() {
    let nodeinfo = partial_engine();
    let doc = nodeinfo.discovery().unwrap();
    let links: Vec<DiscoveryLink> = serde_json::from_value(doc["links"].clone()).unwrap();
    let versions = nodeinfo.versions(Family::NodeInfo);

    assert_eq!(links.len(), versions.len());
    for (link, version) in links.iter().zip(&versions) {
        assert!(link.rel.ends_with(version.as_str()));
        assert_eq!(
            link.href,
            format!("https://example.com/wp-json/nodeinfo/{version}")
        );
    }
}

#[test]
fn augmenting_a_jrd_keeps_existing_links_first() {
    let nodeinfo = partial_engine();
    let mut jrd = json!({ "links": [{ "rel": "x", "href": "y" }] });
    nodeinfo.augment_jrd(&mut jrd).unwrap();

    let links = jrd["links"].as_array().unwrap();
    assert_eq!(links.len(), 1 + nodeinfo.versions(Family::NodeInfo).len());
    assert_eq!(links[0], json!({ "rel": "x", "href": "y" }));
}

#[test]
fn augmenting_a_link_list_appends() {
    let nodeinfo = partial_engine();
    let existing = vec![DiscoveryLink {
        rel: "x".into(),
        href: "y".into(),
    }];
    let links = nodeinfo.augment(existing);
    assert_eq!(links.len(), 4);
    assert_eq!(links[0].rel, "x");
    assert_eq!(links[3].rel, "http://nodeinfo.diaspora.software/ns/schema/2.2");
}

#[test]
fn registration_order_drives_discovery_order() {
    let mut builder = NodeInfoBuilder::new(Arc::new(MemoryFacts::new(snapshot())), urls());
    builder.register(NodeInfo22).unwrap();
    builder.register(NodeInfo11).unwrap();
    let nodeinfo = builder.build();
    let rels: Vec<String> = nodeinfo.links().into_iter().map(|l| l.rel).collect();
    assert_eq!(
        rels,
        vec![
            "http://nodeinfo.diaspora.software/ns/schema/2.2",
            "http://nodeinfo.diaspora.software/ns/schema/1.1"
        ]
    );
}

// ============================================================================
// Extension
// ============================================================================

#[test]
fn third_party_filter_and_document_transform() {
    let mut builder = NodeInfoBuilder::new(Arc::new(MemoryFacts::new(snapshot())), urls());
    builder.register(NodeInfo20).unwrap();
    builder.register(NodeInfo22).unwrap();
    builder
        .add_filter(
            Family::NodeInfo,
            nodeinfo::ExtensionPoint::Metadata,
            "federation",
            |mut current: Value, ctx| {
                if ctx.is("2.2") {
                    current["federation"] = json!({ "enabled": true });
                }
                Ok(current)
            },
        )
        .unwrap();
    let nodeinfo = builder.build();

    let doc = nodeinfo.document("2.2").unwrap();
    assert_eq!(doc.get("metadata").unwrap()["federation"]["enabled"], true);
    assert_eq!(doc.get("metadata").unwrap()["nodeName"], "Example Blog");
    let doc = nodeinfo.document("2.0").unwrap();
    assert!(doc.get("metadata").unwrap().get("federation").is_none());
}

#[test]
fn schema_of_the_full_registry() {
    let schema = full_engine().schema();
    assert_eq!(schema["$schema"], "http://json-schema.org/draft-04/schema#");
    // Last registered version (2.2) wins every shared property.
    assert!(schema["properties"]["instance"].is_object());
    assert_eq!(schema["properties"]["protocols"]["type"], "array");
}
