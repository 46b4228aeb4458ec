use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{schema_json, Capability};
use crate::error::RegistryError;

/// Discovery listing entry: name, description, and parameter schema.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub description: String,
    pub parameter_schema: Value,
}

/// Immutable-after-startup map of name to capability. Listing order is the
/// name order, so discovery output is deterministic.
pub struct CapabilityRegistry {
    entries: BTreeMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let name = capability.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.entries.insert(name, capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Capability>, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Sorted discovery listing. Never used for execution ordering.
    pub fn list(&self) -> impl Iterator<Item = CapabilityInfo> + '_ {
        self.entries.values().map(|c| CapabilityInfo {
            name: c.name().to_string(),
            description: c.description().to_string(),
            parameter_schema: schema_json(&c.parameters()),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
