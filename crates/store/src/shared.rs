use crate::config::EngineConfig;
use crate::error::Result;
use crate::snapshot::ContextSnapshot;
use crate::store::{ContextStore, StoreStatistics};
use context_model::{Item, Relationship};
use context_vector_index::ClusterSpec;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle sharing one store across threads.
///
/// Mutations take the exclusive lock; queries take the shared lock, so
/// readers run concurrently but never observe a half-applied mutation. Every
/// operation restores the store invariants before releasing its lock, so a
/// panicked peer cannot leave partial state behind and lock poisoning is
/// absorbed rather than propagated.
#[derive(Clone)]
pub struct SharedContextStore {
    inner: Arc<RwLock<ContextStore>>,
}

impl SharedContextStore {
    pub fn new() -> Self {
        Self::from_store(ContextStore::new())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::from_store(ContextStore::with_config(config))
    }

    pub fn from_store(store: ContextStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run a closure under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&ContextStore) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run a closure under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut ContextStore) -> R) -> R {
        f(&mut self.write_guard())
    }

    pub fn add_item(&self, content: Value) -> Result<Item> {
        self.write_guard().add_item(content)
    }

    pub fn add_item_full(
        &self,
        content: Value,
        item_type: &str,
        metadata: HashMap<String, Value>,
        embedding: Option<Vec<f32>>,
    ) -> Result<Item> {
        self.write_guard()
            .add_item_full(content, item_type, metadata, embedding)
    }

    pub fn remove_item(&self, id: &str) -> bool {
        self.write_guard().remove_item(id)
    }

    pub fn add_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        relationship_type: &str,
        weight: f32,
        directed: bool,
        metadata: HashMap<String, Value>,
    ) -> Result<Arc<Relationship>> {
        self.write_guard().add_relationship(
            source_id,
            target_id,
            relationship_type,
            weight,
            directed,
            metadata,
        )
    }

    pub fn get_item(&self, id: &str) -> Option<Item> {
        self.read_guard().get_item(id).cloned()
    }

    pub fn similar_items(&self, query: &[f32], k: usize, threshold: f32) -> Result<Vec<(Item, f32)>> {
        self.read_guard().similar_items(query, k, threshold)
    }

    pub fn neighbors(&self, id: &str, relationship_type: Option<&str>, max_depth: usize) -> Vec<Item> {
        self.read_guard().neighbors(id, relationship_type, max_depth)
    }

    pub fn cluster(&self, spec: &ClusterSpec) -> Result<HashMap<i64, Vec<Item>>> {
        self.read_guard().cluster(spec)
    }

    pub fn paths(&self, source_id: &str, target_id: &str, max_hops: Option<usize>) -> Vec<Vec<Item>> {
        self.read_guard().paths(source_id, target_id, max_hops)
    }

    pub fn spatial_window(&self, center_id: &str, radius: f32, max_items: Option<usize>) -> Vec<(Item, f32)> {
        self.read_guard().spatial_window(center_id, radius, max_items)
    }

    pub fn statistics(&self) -> StoreStatistics {
        self.read_guard().statistics()
    }

    pub fn export(&self) -> ContextSnapshot {
        self.read_guard().export()
    }

    pub fn import(&self, snapshot: ContextSnapshot) -> Result<()> {
        self.write_guard().import(snapshot)
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ContextStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ContextStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedContextStore {
    fn default() -> Self {
        Self::new()
    }
}
