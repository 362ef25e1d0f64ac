//! Schema assembler: folds per-version JSON-Schema fragments into one
//! document. Informational only; served documents are never validated
//! against it.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::version::Family;

pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-04/schema#";

/// `schema -> schema` fold step.
pub type SchemaFragment = Arc<dyn Fn(Value) -> Value + Send + Sync>;

pub struct SchemaAssembler {
    family: Family,
    fragments: Vec<(String, SchemaFragment)>,
}

impl SchemaAssembler {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            fragments: Vec::new(),
        }
    }

    /// Append a fragment. Returns `false` when `id` already contributed one.
    pub fn add(&mut self, id: impl Into<String>, fragment: SchemaFragment) -> bool {
        let id = id.into();
        if self.fragments.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        self.fragments.push((id, fragment));
        true
    }

    /// Starting document of the fold.
    pub fn base(&self) -> Value {
        json!({
            "$schema": JSON_SCHEMA_DRAFT,
            "title": self.family.namespace(),
            "type": "object",
            "properties": {}
        })
    }

    /// Fold every fragment over [`SchemaAssembler::base`] in registration order.
    pub fn schema(&self) -> Value {
        self.fragments
            .iter()
            .fold(self.base(), |schema, (_, fragment)| fragment(schema))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl fmt::Debug for SchemaAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaAssembler")
            .field("family", &self.family)
            .field(
                "fragments",
                &self.fragments.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
