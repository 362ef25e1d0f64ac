//! Document builder: folds each extension point's chain for one version and
//! assembles the result in schema order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::chain::{BuildContext, Chain, ExtensionPoint, Filter};
use crate::config::SoftwareConfig;
use crate::error::{NodeInfoError, Result};
use crate::facts::{FactProvider, UrlResolver};
use crate::integration::VersionContributor;
use crate::registry::VersionRegistry;
use crate::version::{Family, VersionId};

// ============================================================================
// Document
// ============================================================================

/// An assembled document, keys in output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn version(&self) -> Option<&str> {
        self.0.get("version").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

// ============================================================================
// DocumentBuilder
// ============================================================================

/// Field extension points of a family, in output order.
fn field_points(family: Family) -> [ExtensionPoint; 5] {
    let identity = match family {
        Family::NodeInfo => ExtensionPoint::Software,
        Family::NodeInfo2 => ExtensionPoint::Server,
    };
    [
        identity,
        ExtensionPoint::Protocols,
        ExtensionPoint::Services,
        ExtensionPoint::Usage,
        ExtensionPoint::Metadata,
    ]
}

/// Registry and chains of one document family.
///
/// Mutated only during startup composition; `build` takes `&self` and holds no
/// state between calls.
#[derive(Debug)]
pub struct DocumentBuilder {
    family: Family,
    registry: VersionRegistry,
    chains: BTreeMap<ExtensionPoint, Chain>,
}

impl DocumentBuilder {
    pub fn new(family: Family) -> Self {
        let mut chains = BTreeMap::new();
        for point in field_points(family) {
            chains.insert(point, Chain::new());
        }
        chains.insert(ExtensionPoint::Document, Chain::new());
        Self {
            family,
            registry: VersionRegistry::new(),
            chains,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn chain(&self, point: ExtensionPoint) -> Option<&Chain> {
        self.chains.get(&point)
    }

    /// Claim the contributor's version and attach it to every chain of the
    /// family.
    ///
    /// Returns `Ok(false)` when the contributor was already registered, in
    /// which case no chain changes.
    ///
    /// # Errors
    /// `InvalidContribution` when a free-standing filter already holds the
    /// contributor's id on some chain. Nothing is registered in that case.
    pub fn register(&mut self, contributor: Arc<dyn VersionContributor>) -> Result<bool> {
        if contributor.family() != self.family {
            return Err(NodeInfoError::Config(format!(
                "contributor {} belongs to {}, not {}",
                contributor.id(),
                contributor.family(),
                self.family
            )));
        }
        if !self.registry.is_known(contributor.version()) {
            if let Some((point, _)) = self
                .chains
                .iter()
                .find(|(_, chain)| chain.contains(contributor.id()))
            {
                return Err(NodeInfoError::InvalidContribution {
                    point: point.key(),
                    expected: "free of filters named after the contributor id",
                });
            }
        }
        let added = self
            .registry
            .register(VersionId::from(contributor.version()), contributor.id())?;
        if !added {
            return Ok(false);
        }

        let id = contributor.id();
        for (point, chain) in self.chains.iter_mut() {
            let point = *point;
            let contributor = Arc::clone(&contributor);
            chain.add(id, move |current, ctx: &BuildContext<'_>| {
                contributor.contribute(point, current, ctx)
            });
        }
        Ok(true)
    }

    /// Append a free-standing filter to `point`.
    ///
    /// # Errors
    /// `InvalidContribution` when the family has no such extension point.
    pub fn add_filter(&mut self, point: ExtensionPoint, id: &str, filter: Filter) -> Result<bool> {
        let chain = self
            .chains
            .get_mut(&point)
            .ok_or(NodeInfoError::InvalidContribution {
                point: point.key(),
                expected: "an extension point of the document family",
            })?;
        Ok(chain.add_shared(id, filter))
    }

    /// Assemble the document for `version`.
    ///
    /// # Errors
    /// `UnknownVersion` before any fact is read when `version` is not
    /// registered; any fact failure aborts the whole build.
    pub fn build(
        &self,
        version: &str,
        facts: &dyn FactProvider,
        urls: &dyn UrlResolver,
        software: &SoftwareConfig,
    ) -> Result<Document> {
        if !self.registry.is_known(version) {
            return Err(NodeInfoError::UnknownVersion(version.to_string()));
        }
        debug!(family = %self.family, version, "building document");

        let pinned = facts.pinned();
        let facts = pinned.as_deref().unwrap_or(facts);
        let version_id = VersionId::from(version);
        let ctx = BuildContext {
            version: &version_id,
            facts,
            urls,
            software,
        };

        let mut fields = Vec::with_capacity(5);
        for point in field_points(self.family) {
            let value = self.fold(point, &ctx)?;
            fields.push((point, value));
        }
        let open_registrations = facts.users_can_register()?;

        let mut document = Map::new();
        document.insert("version".to_string(), Value::String(version.to_string()));
        for (point, value) in fields {
            if point == ExtensionPoint::Usage {
                document.insert(
                    "openRegistrations".to_string(),
                    Value::Bool(open_registrations),
                );
            }
            document.insert(point.key().to_string(), value);
        }

        match self.fold_from(ExtensionPoint::Document, Value::Object(document), &ctx)? {
            Value::Object(document) => Ok(Document(document)),
            _ => Err(NodeInfoError::InvalidContribution {
                point: ExtensionPoint::Document.key(),
                expected: "an object",
            }),
        }
    }

    fn fold(&self, point: ExtensionPoint, ctx: &BuildContext<'_>) -> Result<Value> {
        self.fold_from(point, point.zero(), ctx)
    }

    fn fold_from(
        &self,
        point: ExtensionPoint,
        initial: Value,
        ctx: &BuildContext<'_>,
    ) -> Result<Value> {
        match self.chains.get(&point) {
            Some(chain) => chain.apply(initial, ctx),
            None => Ok(initial),
        }
    }
}
