use crate::error::Result;
use context_model::{Item, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full serialized state of a store: every item keyed by id plus the flat
/// relationship list. Embeddings and positions travel as JSON number arrays,
/// so floats round-trip without a text re-encoding step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub items: BTreeMap<String, Item>,
    pub relationships: Vec<Relationship>,
}

impl ContextSnapshot {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}
