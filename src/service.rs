//! Startup composition root.
//!
//! [`NodeInfoBuilder`] collects contributors and filters during process
//! start. [`NodeInfoBuilder::build`] freezes everything into a [`NodeInfo`],
//! which only reads afterwards and can be shared across threads behind an
//! `Arc`.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::builder::{Document, DocumentBuilder};
use crate::chain::{BuildContext, ExtensionPoint, Filter};
use crate::config::{Config, SoftwareConfig};
use crate::discovery::{self, DiscoveryLink, LegacyDiscoveryHook};
use crate::error::{NodeInfoError, Result};
use crate::facts::{FactProvider, UrlResolver};
use crate::integration::{contributor_for, NodeInfo2, VersionContributor};
use crate::schema::SchemaAssembler;
use crate::version::{Family, VersionId};

// ============================================================================
// FamilyEngine
// ============================================================================

#[derive(Debug)]
struct FamilyEngine {
    documents: DocumentBuilder,
    schema: SchemaAssembler,
}

impl FamilyEngine {
    fn new(family: Family) -> Self {
        Self {
            documents: DocumentBuilder::new(family),
            schema: SchemaAssembler::new(family),
        }
    }

    fn register(&mut self, contributor: Arc<dyn VersionContributor>) -> Result<bool> {
        if !self.documents.register(Arc::clone(&contributor))? {
            return Ok(false);
        }
        let id = contributor.id();
        self.schema
            .add(id, Arc::new(move |schema: Value| contributor.schema(schema)));
        Ok(true)
    }
}

// ============================================================================
// NodeInfoBuilder
// ============================================================================

/// Mutable startup phase of the engine.
pub struct NodeInfoBuilder {
    facts: Arc<dyn FactProvider>,
    urls: Arc<dyn UrlResolver>,
    software: SoftwareConfig,
    nodeinfo: FamilyEngine,
    nodeinfo2: FamilyEngine,
    legacy_discovery: Option<LegacyDiscoveryHook>,
}

impl NodeInfoBuilder {
    pub fn new(facts: Arc<dyn FactProvider>, urls: Arc<dyn UrlResolver>) -> Self {
        Self {
            facts,
            urls,
            software: SoftwareConfig::default(),
            nodeinfo: FamilyEngine::new(Family::NodeInfo),
            nodeinfo2: FamilyEngine::new(Family::NodeInfo2),
            legacy_discovery: None,
        }
    }

    pub fn software(mut self, software: SoftwareConfig) -> Self {
        self.software = software;
        self
    }

    /// Register a contributor with its family.
    ///
    /// Registering the same contributor id again is a no-op.
    ///
    /// # Errors
    /// `DuplicateRegistration` when another contributor already claims the
    /// version.
    pub fn register(&mut self, contributor: impl VersionContributor + 'static) -> Result<()> {
        self.register_shared(Arc::new(contributor))
    }

    pub fn register_shared(&mut self, contributor: Arc<dyn VersionContributor>) -> Result<()> {
        let engine = match contributor.family() {
            Family::NodeInfo => &mut self.nodeinfo,
            Family::NodeInfo2 => &mut self.nodeinfo2,
        };
        engine.register(contributor)?;
        Ok(())
    }

    /// Attach an extra filter to one extension point of `family`.
    ///
    /// The filter runs after the contributors registered before it and must
    /// do its own version check. A repeated `id` is ignored.
    pub fn add_filter<F>(
        &mut self,
        family: Family,
        point: ExtensionPoint,
        id: &str,
        filter: F,
    ) -> Result<()>
    where
        F: Fn(Value, &BuildContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let filter: Filter = Arc::new(filter);
        let engine = match family {
            Family::NodeInfo => &mut self.nodeinfo,
            Family::NodeInfo2 => &mut self.nodeinfo2,
        };
        engine.documents.add_filter(point, id, filter)?;
        Ok(())
    }

    /// Install the deprecated discovery hook. Its output is merged into the
    /// discovery document, the primary document winning on conflicts.
    pub fn legacy_discovery_hook<F>(&mut self, hook: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.legacy_discovery = Some(Arc::new(hook));
    }

    pub fn build(self) -> NodeInfo {
        info!(
            nodeinfo = self.nodeinfo.documents.registry().len(),
            nodeinfo2 = self.nodeinfo2.documents.registry().len(),
            "nodeinfo engine ready"
        );
        NodeInfo {
            facts: self.facts,
            urls: self.urls,
            software: self.software,
            nodeinfo: self.nodeinfo,
            nodeinfo2: self.nodeinfo2,
            legacy_discovery: self.legacy_discovery,
        }
    }
}

// ============================================================================
// NodeInfo
// ============================================================================

/// The frozen engine. Every method takes `&self`; builds share no mutable
/// state.
pub struct NodeInfo {
    facts: Arc<dyn FactProvider>,
    urls: Arc<dyn UrlResolver>,
    software: SoftwareConfig,
    nodeinfo: FamilyEngine,
    nodeinfo2: FamilyEngine,
    legacy_discovery: Option<LegacyDiscoveryHook>,
}

impl NodeInfo {
    /// Compose the shipped contributors selected by `config`.
    pub fn from_config(
        config: &Config,
        facts: Arc<dyn FactProvider>,
        urls: Arc<dyn UrlResolver>,
    ) -> Result<Self> {
        config.validate()?;
        let mut builder = NodeInfoBuilder::new(facts, urls).software(config.software.clone());
        for version in &config.versions {
            let contributor = contributor_for(version)
                .ok_or_else(|| NodeInfoError::Config(format!("unsupported NodeInfo version {version}")))?;
            builder.register_shared(Arc::from(contributor))?;
        }
        if config.nodeinfo2 {
            builder.register(NodeInfo2)?;
        }
        Ok(builder.build())
    }

    fn engine(&self, family: Family) -> &FamilyEngine {
        match family {
            Family::NodeInfo => &self.nodeinfo,
            Family::NodeInfo2 => &self.nodeinfo2,
        }
    }

    /// Build the document of `version` in `family`.
    pub fn build(&self, family: Family, version: &str) -> Result<Document> {
        self.engine(family).documents.build(
            version,
            self.facts.as_ref(),
            self.urls.as_ref(),
            &self.software,
        )
    }

    /// NodeInfo document for `version`.
    pub fn document(&self, version: &str) -> Result<Document> {
        self.build(Family::NodeInfo, version)
    }

    /// NodeInfo2 document for `version`.
    pub fn nodeinfo2(&self, version: &str) -> Result<Document> {
        self.build(Family::NodeInfo2, version)
    }

    /// Registered versions of `family`, in registration order.
    pub fn versions(&self, family: Family) -> Vec<VersionId> {
        self.engine(family).documents.registry().list()
    }

    pub fn is_known(&self, family: Family, version: &str) -> bool {
        self.engine(family).documents.registry().is_known(version)
    }

    /// One link per registered NodeInfo version.
    pub fn links(&self) -> Vec<DiscoveryLink> {
        discovery::links(self.nodeinfo.documents.registry(), self.urls.as_ref())
    }

    /// The well-known discovery document, `{"links": [...]}`.
    pub fn discovery(&self) -> Result<Value> {
        discovery::discovery_document(self.links(), self.legacy_discovery.as_ref())
    }

    /// Append the NodeInfo links to an external link collection.
    pub fn augment(&self, existing: Vec<DiscoveryLink>) -> Vec<DiscoveryLink> {
        discovery::augment(existing, &self.links())
    }

    /// Append the NodeInfo links to the `links` array of a JRD document
    /// (WebFinger user or resource lookups, Host-Meta).
    pub fn augment_jrd(&self, jrd: &mut Value) -> Result<()> {
        discovery::augment_jrd(jrd, &self.links())
    }

    /// Merged JSON-Schema of every registered NodeInfo version.
    pub fn schema(&self) -> Value {
        self.nodeinfo.schema.schema()
    }

    pub fn nodeinfo2_schema(&self) -> Value {
        self.nodeinfo2.schema.schema()
    }

    pub fn schema_for(&self, family: Family) -> Value {
        self.engine(family).schema.schema()
    }

    pub fn software(&self) -> &SoftwareConfig {
        &self.software
    }
}

impl std::fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInfo")
            .field("software", &self.software)
            .field("nodeinfo", &self.nodeinfo)
            .field("nodeinfo2", &self.nodeinfo2)
            .field("legacy_discovery", &self.legacy_discovery.is_some())
            .finish_non_exhaustive()
    }
}
