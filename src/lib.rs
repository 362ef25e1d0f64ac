//! Versioned NodeInfo document composition.
//!
//! This crate assembles NodeInfo (1.0 through 2.2) and NodeInfo2 documents
//! from independent per-version contributors, advertises them through the
//! well-known discovery document and injects the same links into WebFinger
//! and Host-Meta JRDs.
//!
//! HTTP, storage and URL generation belong to the host. The host supplies a
//! [`FactProvider`], a [`UrlResolver`] and a [`routes::RouteRegistrar`]; the
//! crate only composes JSON.
//!
//! Composition happens once at startup:
//!
//! ```no_run
//! use std::sync::Arc;
//! use nodeinfo::{Config, MemoryFacts, NodeInfo, StaticUrls};
//!
//! let nodeinfo = NodeInfo::from_config(
//!     &Config::default(),
//!     Arc::new(MemoryFacts::default()),
//!     Arc::new(StaticUrls::new("https://example.com/wp-json")),
//! )?;
//! let document = nodeinfo.document("2.1")?;
//! # Ok::<(), nodeinfo::NodeInfoError>(())
//! ```

pub mod builder;
pub mod chain;
pub mod config;
pub mod discovery;
pub mod error;
pub mod facts;
pub mod integration;
pub mod registry;
pub mod routes;
pub mod schema;
pub mod service;
pub mod version;

pub use builder::{Document, DocumentBuilder};
pub use chain::{BuildContext, Chain, ExtensionPoint, Filter};
pub use config::{Config, SoftwareConfig, SUPPORTED_VERSIONS};
pub use discovery::{DiscoveryLink, DISCOVERY_CONTENT_TYPE, SCHEMA_REL_PREFIX};
pub use error::{FactError, NodeInfoError, Result};
pub use facts::{
    mask_version, ActivityWindow, FactProvider, FactSnapshot, MemoryFacts, PostRecord,
    SiteIdentity, StaticUrls, UrlResolver, ACTIVE_USER_SAMPLE,
};
#[cfg(feature = "sqlite")]
pub use facts::SqliteFacts;
pub use integration::VersionContributor;
pub use registry::VersionRegistry;
pub use service::{NodeInfo, NodeInfoBuilder};
pub use version::{Family, VersionId};
