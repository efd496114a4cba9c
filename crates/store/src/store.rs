use crate::config::EngineConfig;
use crate::error::{Result, StoreError};
use crate::snapshot::ContextSnapshot;
use context_graph::ContextGraph;
use context_model::{content_hash, DistanceMetric, Item, ModelError, Relationship};
use context_vector_index::{
    ClusterSpec, IndexError, IndexStatistics, ReductionMethod, SimilarityMetric, VectorIndex,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const CLUSTER_SEED: u64 = 42;

/// Aggregate counts and distributions over a store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatistics {
    pub item_count: usize,
    pub relationship_count: usize,
    pub items_by_type: BTreeMap<String, usize>,
    pub relationships_by_type: BTreeMap<String, usize>,
    pub graph_density: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_index: Option<IndexStatistics>,
}

/// In-memory graph-and-vector store over deduplicated items.
///
/// Owns the item set, the relationship graph, the content-hash dedup index,
/// and a vector index rebuilt eagerly whenever the set of embedded items
/// changes. Every mutating operation validates its arguments before touching
/// state and leaves all indices consistent on return.
pub struct ContextStore {
    config: EngineConfig,
    items: HashMap<String, Item>,
    /// Canonical content hash → item id; same cardinality as `items`.
    content_index: HashMap<String, String>,
    /// One entry per logical relationship; undirected ones still count once.
    relationships: Vec<Arc<Relationship>>,
    graph: ContextGraph,
    /// Row-ordered ids of embedded items; bijective with the index rows.
    embedded_ids: Vec<String>,
    vector_index: VectorIndex,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            items: HashMap::new(),
            content_index: HashMap::new(),
            relationships: Vec::new(),
            graph: ContextGraph::new(),
            embedded_ids: Vec::new(),
            vector_index: VectorIndex::empty(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn items_by_type(&self, item_type: &str) -> Vec<Item> {
        self.items
            .values()
            .filter(|item| item.item_type == item_type)
            .cloned()
            .collect()
    }

    /// Relationships touching the given item, in insertion order.
    pub fn relationships_of(&self, id: &str) -> Vec<Arc<Relationship>> {
        self.relationships
            .iter()
            .filter(|rel| rel.involves(id))
            .cloned()
            .collect()
    }

    /// Add an item with default type and no embedding.
    pub fn add_item(&mut self, content: Value) -> Result<Item> {
        self.add_item_full(content, "generic", HashMap::new(), None)
    }

    /// Add an item, deduplicating by canonical content hash.
    ///
    /// On a hash collision the stored item is returned unchanged and the new
    /// `item_type`/`metadata`/`embedding` arguments are discarded, keeping
    /// the call idempotent under retries. Callers that want to enrich an
    /// existing item use `update_embedding`/`update_position` explicitly.
    pub fn add_item_full(
        &mut self,
        content: Value,
        item_type: &str,
        metadata: HashMap<String, Value>,
        embedding: Option<Vec<f32>>,
    ) -> Result<Item> {
        let hash = content_hash(&content);
        if let Some(existing_id) = self.content_index.get(&hash) {
            if let Some(existing) = self.items.get(existing_id) {
                log::debug!("add_item: content {hash} already stored as {existing_id}");
                return Ok(existing.clone());
            }
        }

        // Validate everything that can fail before touching any state.
        if let Some(vector) = &embedding {
            self.check_dimension(vector.len())?;
        }
        let mut item = Item::new(content).with_type(item_type).with_metadata(metadata);
        if let Some(vector) = embedding {
            item.set_embedding(vector)?;
        }

        let has_embedding = item.embedding.is_some();
        self.content_index.insert(hash, item.id.clone());
        self.graph.add_node(item.id.clone());
        self.items.insert(item.id.clone(), item.clone());
        if has_embedding {
            self.rebuild_vector_index();
        }
        log::debug!("add_item: stored {} ({} total)", item.id, self.items.len());
        Ok(item)
    }

    /// Remove an item, its dedup entry, and every incident relationship.
    /// Returns false for unknown ids.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let Some(item) = self.items.remove(id) else {
            return false;
        };
        self.content_index.remove(&content_hash(&item.content));
        self.relationships.retain(|rel| !rel.involves(id));
        self.graph.remove_node(id);
        self.rebuild_vector_index();
        log::debug!("remove_item: dropped {id} ({} left)", self.items.len());
        true
    }

    /// Replace an item's embedding (re-normalized) and rebuild the index.
    pub fn update_embedding(&mut self, id: &str, vector: Vec<f32>) -> Result<()> {
        if !self.items.contains_key(id) {
            return Err(StoreError::UnknownItem(id.to_string()));
        }
        // A changed dimensionality is only acceptable when no other item is
        // embedded (the index then rebuilds around the new width).
        if self.embedded_ids.iter().any(|eid| eid != id) {
            self.check_dimension(vector.len())?;
        }
        let normalized = context_model::l2_normalize(vector)?;
        if let Some(item) = self.items.get_mut(id) {
            item.embedding = Some(normalized);
        }
        self.rebuild_vector_index();
        Ok(())
    }

    /// Move an item to a new spatial position.
    pub fn update_position(&mut self, id: &str, position: [f32; 3]) -> Result<()> {
        match self.items.get_mut(id) {
            Some(item) => {
                item.set_position(position);
                Ok(())
            }
            None => Err(StoreError::UnknownItem(id.to_string())),
        }
    }

    /// Link two existing items. Both endpoints are checked before any state
    /// changes, so a failed call mutates nothing. An undirected relationship
    /// becomes two reciprocal arcs sharing one payload.
    pub fn add_relationship(
        &mut self,
        source_id: &str,
        target_id: &str,
        relationship_type: &str,
        weight: f32,
        directed: bool,
        metadata: HashMap<String, Value>,
    ) -> Result<Arc<Relationship>> {
        if !self.items.contains_key(source_id) {
            return Err(StoreError::UnknownItem(source_id.to_string()));
        }
        if !self.items.contains_key(target_id) {
            return Err(StoreError::UnknownItem(target_id.to_string()));
        }

        let relationship = Arc::new(
            Relationship::between(source_id, target_id)
                .relationship_type(relationship_type)
                .weight(weight)
                .directed(directed)
                .metadata(metadata)
                .build()?,
        );

        self.graph
            .add_arc(source_id, target_id, Arc::clone(&relationship))?;
        if !directed {
            self.graph
                .add_arc(target_id, source_id, Arc::clone(&relationship))?;
        }
        self.relationships.push(Arc::clone(&relationship));
        log::debug!(
            "add_relationship: {source_id} -> {target_id} ({relationship_type}, directed={directed})"
        );
        Ok(relationship)
    }

    /// Cosine nearest neighbors over embedded items, as `(item, similarity)`
    /// sorted descending and filtered to `similarity >= threshold`. A store
    /// with no embedded items returns an empty list.
    pub fn similar_items(&self, query: &[f32], k: usize, threshold: f32) -> Result<Vec<(Item, f32)>> {
        if self.embedded_ids.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.vector_index.nearest(query, k, SimilarityMetric::Cosine)?;
        let mut out = Vec::with_capacity(hits.len());
        for (row, distance) in hits {
            let similarity = 1.0 - distance;
            if similarity < threshold {
                continue;
            }
            if let Some(item) = self.items.get(&self.embedded_ids[row]) {
                out.push((item.clone(), similarity));
            }
        }
        Ok(out)
    }

    /// Items reachable within `max_depth` hops, optionally restricted to one
    /// relationship type. Depth 1 is the direct successor set.
    pub fn neighbors(&self, id: &str, relationship_type: Option<&str>, max_depth: usize) -> Vec<Item> {
        let ids = match max_depth {
            0 => Vec::new(),
            1 => self.graph.neighbors(id, relationship_type),
            _ => self.graph.neighborhood(id, relationship_type, max_depth),
        };
        ids.into_iter()
            .filter_map(|nid| self.items.get(&nid).cloned())
            .collect()
    }

    /// Group embedded items by cluster label. DBSCAN noise comes back under
    /// the `-1` key; requesting more clusters than embedded items clamps
    /// rather than failing.
    pub fn cluster(&self, spec: &ClusterSpec) -> Result<HashMap<i64, Vec<Item>>> {
        if self.embedded_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let labels = match spec {
            ClusterSpec::KMeans { n_clusters } => self.vector_index.cluster_kmeans_seeded(
                *n_clusters,
                self.config.kmeans_max_iter,
                CLUSTER_SEED,
            ),
            ClusterSpec::Dbscan { eps, min_samples } => {
                self.vector_index.cluster_dbscan(*eps, *min_samples)
            }
            ClusterSpec::Hierarchical { n_clusters, linkage } => {
                self.vector_index.cluster_hierarchical(*n_clusters, *linkage)
            }
        };

        let mut groups: HashMap<i64, Vec<Item>> = HashMap::new();
        for (row, label) in labels.into_iter().enumerate() {
            if let Some(item) = self.items.get(&self.embedded_ids[row]) {
                groups.entry(label).or_default().push(item.clone());
            }
        }
        Ok(groups)
    }

    /// All simple paths between two items, optionally capped in hop count.
    /// Unknown endpoints or no route yield an empty list.
    pub fn paths(&self, source_id: &str, target_id: &str, max_hops: Option<usize>) -> Vec<Vec<Item>> {
        self.graph
            .simple_paths(source_id, target_id, max_hops)
            .into_iter()
            .map(|path| {
                path.into_iter()
                    .filter_map(|id| self.items.get(&id).cloned())
                    .collect()
            })
            .collect()
    }

    /// Items within `radius` (Euclidean, by position) of the center item,
    /// ascending by distance, capped at `max_items` (config default when
    /// omitted). The center itself is excluded; an unknown center yields an
    /// empty list.
    pub fn spatial_window(
        &self,
        center_id: &str,
        radius: f32,
        max_items: Option<usize>,
    ) -> Vec<(Item, f32)> {
        let Some(center) = self.items.get(center_id) else {
            return Vec::new();
        };
        let cap = max_items.unwrap_or(self.config.spatial_max_items);

        let mut hits: Vec<(Item, f32)> = self
            .items
            .values()
            .filter(|item| item.id != center.id)
            .map(|item| (item.clone(), center.distance_to(item, DistanceMetric::Euclidean)))
            .filter(|(_, distance)| *distance <= radius)
            .collect();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(cap);
        hits
    }

    /// Reduced coordinates for every embedded item, keyed by id.
    pub fn reduce_dimensions(
        &self,
        method: ReductionMethod,
        n_components: usize,
    ) -> Vec<(String, Vec<f32>)> {
        let coords = match method {
            ReductionMethod::Pca => self.vector_index.reduce_pca(n_components),
            ReductionMethod::Tsne => self.vector_index.reduce_tsne(
                n_components,
                self.config.tsne_perplexity,
                self.config.tsne_iterations,
            ),
        };
        self.embedded_ids
            .iter()
            .cloned()
            .zip(coords.rows().into_iter().map(|row| row.to_vec()))
            .collect()
    }

    pub fn statistics(&self) -> StoreStatistics {
        let mut items_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for item in self.items.values() {
            *items_by_type.entry(item.item_type.clone()).or_insert(0) += 1;
        }
        let mut relationships_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for rel in &self.relationships {
            *relationships_by_type
                .entry(rel.relationship_type.clone())
                .or_insert(0) += 1;
        }
        let vector_index = if self.embedded_ids.is_empty() {
            None
        } else {
            Some(self.vector_index.statistics())
        };
        StoreStatistics {
            item_count: self.items.len(),
            relationship_count: self.relationships.len(),
            items_by_type,
            relationships_by_type,
            graph_density: self.graph.density(),
            vector_index,
        }
    }

    /// Serialize the full state.
    pub fn export(&self) -> ContextSnapshot {
        ContextSnapshot {
            items: self
                .items
                .iter()
                .map(|(id, item)| (id.clone(), item.clone()))
                .collect(),
            relationships: self
                .relationships
                .iter()
                .map(|rel| (**rel).clone())
                .collect(),
        }
    }

    /// Replace the whole store with the snapshot's state.
    ///
    /// The incoming state is staged and validated first (relationship
    /// invariants, endpoint existence, embedding norms and dimensions); on
    /// any error the current store is left untouched.
    pub fn import(&mut self, snapshot: ContextSnapshot) -> Result<()> {
        let mut staged = ContextStore::with_config(self.config.clone());
        let mut expected_dim: Option<usize> = None;

        for item in snapshot.items.into_values() {
            if let Some(embedding) = &item.embedding {
                let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                if embedding.is_empty() || norm <= f32::EPSILON {
                    return Err(ModelError::InvalidVector(format!("item {}", item.id)).into());
                }
                match expected_dim {
                    None => expected_dim = Some(embedding.len()),
                    Some(dim) if dim != embedding.len() => {
                        return Err(IndexError::InvalidDimension {
                            expected: dim,
                            actual: embedding.len(),
                        }
                        .into());
                    }
                    Some(_) => {}
                }
            }
            staged
                .content_index
                .insert(content_hash(&item.content), item.id.clone());
            staged.graph.add_node(item.id.clone());
            staged.items.insert(item.id.clone(), item);
        }

        for relationship in snapshot.relationships {
            relationship.validate()?;
            if !staged.items.contains_key(&relationship.source_id) {
                return Err(StoreError::UnknownItem(relationship.source_id.clone()));
            }
            if !staged.items.contains_key(&relationship.target_id) {
                return Err(StoreError::UnknownItem(relationship.target_id.clone()));
            }
            let arc = Arc::new(relationship);
            staged
                .graph
                .add_arc(&arc.source_id, &arc.target_id, Arc::clone(&arc))?;
            if !arc.directed {
                staged
                    .graph
                    .add_arc(&arc.target_id, &arc.source_id, Arc::clone(&arc))?;
            }
            staged.relationships.push(arc);
        }

        staged.rebuild_vector_index();
        log::info!(
            "import: {} items, {} relationships",
            staged.items.len(),
            staged.relationships.len()
        );
        *self = staged;
        Ok(())
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        if !self.embedded_ids.is_empty() && actual != self.vector_index.dimension() {
            return Err(IndexError::InvalidDimension {
                expected: self.vector_index.dimension(),
                actual,
            }
            .into());
        }
        Ok(())
    }

    /// Recompute the id↔row bijection and the dense matrix from the current
    /// item set. Row order is the lexical id order, so rebuilds are
    /// deterministic.
    fn rebuild_vector_index(&mut self) {
        let mut embedded: Vec<(String, Vec<f32>)> = self
            .items
            .values()
            .filter_map(|item| item.embedding.as_ref().map(|e| (item.id.clone(), e.clone())))
            .collect();
        embedded.sort_by(|a, b| a.0.cmp(&b.0));
        let (ids, rows): (Vec<String>, Vec<Vec<f32>>) = embedded.into_iter().unzip();

        match VectorIndex::from_rows(rows) {
            Ok(index) => {
                self.embedded_ids = ids;
                self.vector_index = index;
            }
            Err(err) => {
                // Unreachable when the pre-mutation dimension checks hold.
                log::error!("vector index rebuild failed: {err}");
                self.embedded_ids = Vec::new();
                self.vector_index = VectorIndex::empty();
            }
        }
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_vector_index::Linkage;
    use serde_json::json;

    fn embedded_store() -> (ContextStore, Vec<String>) {
        let mut store = ContextStore::new();
        let ids = [
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.9, 0.1]),
            ("c", vec![0.0, 1.0]),
        ]
        .into_iter()
        .map(|(name, embedding)| {
            store
                .add_item_full(json!(name), "generic", HashMap::new(), Some(embedding))
                .unwrap()
                .id
        })
        .collect();
        (store, ids)
    }

    #[test]
    fn add_item_is_idempotent_for_same_content() {
        let mut store = ContextStore::new();
        let first = store.add_item(json!("x")).unwrap();
        let second = store.add_item(json!("x")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_item_distinct_content_distinct_ids() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("x")).unwrap();
        let b = store.add_item(json!("y")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_add_discards_new_attributes() {
        let mut store = ContextStore::new();
        store
            .add_item_full(json!("x"), "note", HashMap::new(), None)
            .unwrap();
        let again = store
            .add_item_full(
                json!("x"),
                "document",
                HashMap::from([("k".to_string(), json!(1))]),
                Some(vec![1.0, 0.0]),
            )
            .unwrap();
        assert_eq!(again.item_type, "note");
        assert!(again.embedding.is_none());
        assert!(again.metadata.is_empty());
    }

    #[test]
    fn invalid_embedding_leaves_store_unchanged() {
        let mut store = ContextStore::new();
        let err = store
            .add_item_full(json!("x"), "generic", HashMap::new(), Some(vec![0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Model(ModelError::InvalidVector(_))));
        assert_eq!(store.len(), 0);
        assert!(store.add_item(json!("x")).is_ok());
    }

    #[test]
    fn mismatched_embedding_dimension_is_rejected_before_mutation() {
        let (mut store, _) = embedded_store();
        let before = store.len();
        let err = store
            .add_item_full(json!("d"), "generic", HashMap::new(), Some(vec![1.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Index(IndexError::InvalidDimension { .. })));
        assert_eq!(store.len(), before);
    }

    #[test]
    fn remove_item_clears_dedup_entry() {
        let mut store = ContextStore::new();
        let first = store.add_item(json!("x")).unwrap();
        assert!(store.remove_item(&first.id));
        assert!(!store.remove_item(&first.id));
        assert_eq!(store.len(), 0);
        // Same content is insertable again after removal.
        let second = store.add_item(json!("x")).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_item_drops_incident_relationships_and_rows() {
        let (mut store, ids) = embedded_store();
        store
            .add_relationship(&ids[0], &ids[1], "semantic", 1.0, true, HashMap::new())
            .unwrap();
        store
            .add_relationship(&ids[1], &ids[2], "semantic", 1.0, true, HashMap::new())
            .unwrap();

        assert!(store.remove_item(&ids[1]));
        assert_eq!(store.relationship_count(), 0);
        assert_eq!(store.statistics().item_count, 2);

        // The removed row is gone from similarity results.
        let results = store.similar_items(&[1.0, 0.0], 10, 0.0).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(item, _)| item.id != ids[1]));
    }

    #[test]
    fn add_relationship_requires_known_endpoints() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let err = store
            .add_relationship(&a.id, "ghost", "semantic", 1.0, true, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownItem(id) if id == "ghost"));
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn add_relationship_validates_weight_and_self_loop() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let b = store.add_item(json!("b")).unwrap();

        let err = store
            .add_relationship(&a.id, &b.id, "semantic", 1.5, true, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Model(ModelError::InvalidWeight(_))));

        let err = store
            .add_relationship(&a.id, &a.id, "semantic", 1.0, true, HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Model(ModelError::SelfLoop(_))));
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn undirected_relationship_connects_both_ways_but_counts_once() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let b = store.add_item(json!("b")).unwrap();
        store
            .add_relationship(&a.id, &b.id, "linked", 0.8, false, HashMap::new())
            .unwrap();

        assert_eq!(store.neighbors(&a.id, None, 1), vec![store.get_item(&b.id).unwrap().clone()]);
        assert_eq!(store.neighbors(&b.id, None, 1), vec![store.get_item(&a.id).unwrap().clone()]);
        assert_eq!(store.statistics().relationship_count, 1);
    }

    #[test]
    fn neighbors_filters_by_relationship_type() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let b = store.add_item(json!("b")).unwrap();
        let c = store.add_item(json!("c")).unwrap();
        store
            .add_relationship(&a.id, &b.id, "semantic", 1.0, true, HashMap::new())
            .unwrap();
        store
            .add_relationship(&a.id, &c.id, "temporal", 1.0, true, HashMap::new())
            .unwrap();

        let semantic = store.neighbors(&a.id, Some("semantic"), 1);
        assert_eq!(semantic.len(), 1);
        assert_eq!(semantic[0].id, b.id);
    }

    #[test]
    fn similar_items_orders_and_thresholds() {
        let (store, ids) = embedded_store();
        let results = store.similar_items(&[1.0, 0.0], 10, 0.0).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, ids[0]);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));

        let filtered = store.similar_items(&[1.0, 0.0], 10, 0.5).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn similar_items_on_store_without_embeddings_is_empty() {
        let mut store = ContextStore::new();
        store.add_item(json!("no embedding")).unwrap();
        assert!(store.similar_items(&[1.0, 0.0], 5, 0.0).unwrap().is_empty());
    }

    #[test]
    fn update_embedding_requires_known_item() {
        let mut store = ContextStore::new();
        let err = store.update_embedding("ghost", vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownItem(_)));
    }

    #[test]
    fn update_embedding_renormalizes_and_reindexes() {
        let mut store = ContextStore::new();
        let item = store.add_item(json!("a")).unwrap();
        store.update_embedding(&item.id, vec![3.0, 4.0]).unwrap();

        let stored = store.get_item(&item.id).unwrap();
        let embedding = stored.embedding.as_ref().unwrap();
        assert!((embedding[0] - 0.6).abs() < 1e-6);

        let results = store.similar_items(&[0.6, 0.8], 1, 0.0).unwrap();
        assert_eq!(results[0].0.id, item.id);
    }

    #[test]
    fn cluster_groups_embedded_items() {
        let mut store = ContextStore::new();
        for (name, embedding) in [
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.99, 0.01]),
            ("c", vec![0.0, 1.0]),
            ("d", vec![0.01, 0.99]),
        ] {
            store
                .add_item_full(json!(name), "generic", HashMap::new(), Some(embedding))
                .unwrap();
        }

        let groups = store
            .cluster(&ClusterSpec::KMeans { n_clusters: 2 })
            .unwrap();
        assert_eq!(groups.len(), 2);
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn cluster_clamps_excess_cluster_count() {
        let (store, _) = embedded_store();
        let groups = store
            .cluster(&ClusterSpec::Hierarchical { n_clusters: 10, linkage: Linkage::Average })
            .unwrap();
        assert!(groups.len() <= 3);
        assert!(!groups.is_empty());
    }

    #[test]
    fn cluster_without_embeddings_is_empty() {
        let mut store = ContextStore::new();
        store.add_item(json!("plain")).unwrap();
        let groups = store.cluster(&ClusterSpec::KMeans { n_clusters: 2 }).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn paths_absent_route_is_empty_not_error() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let z = store.add_item(json!("z")).unwrap();
        assert!(store.paths(&a.id, &z.id, None).is_empty());
        assert!(store.paths(&a.id, "missing", None).is_empty());
    }

    #[test]
    fn paths_maps_ids_to_items() {
        let mut store = ContextStore::new();
        let a = store.add_item(json!("a")).unwrap();
        let b = store.add_item(json!("b")).unwrap();
        let c = store.add_item(json!("c")).unwrap();
        store
            .add_relationship(&a.id, &b.id, "next", 1.0, true, HashMap::new())
            .unwrap();
        store
            .add_relationship(&b.id, &c.id, "next", 1.0, true, HashMap::new())
            .unwrap();

        let paths = store.paths(&a.id, &c.id, None);
        assert_eq!(paths.len(), 1);
        let ids: Vec<&str> = paths[0].iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);

        assert!(store.paths(&a.id, &c.id, Some(1)).is_empty());
    }

    #[test]
    fn spatial_window_selects_by_radius() {
        let mut store = ContextStore::new();
        let center = store.add_item(json!("center")).unwrap();
        store.update_position(&center.id, [0.0, 0.0, 0.0]).unwrap();
        let near = store.add_item(json!("near")).unwrap();
        store.update_position(&near.id, [0.1, 0.1, 0.1]).unwrap();
        let far = store.add_item(json!("far")).unwrap();
        store.update_position(&far.id, [5.0, 5.0, 5.0]).unwrap();

        let window = store.spatial_window(&center.id, 1.0, None);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].0.id, near.id);
        assert!((window[0].1 - 0.173).abs() < 0.01);

        assert!(store.spatial_window("missing", 1.0, None).is_empty());
    }

    #[test]
    fn spatial_window_sorts_and_truncates() {
        let mut store = ContextStore::new();
        let center = store.add_item(json!("center")).unwrap();
        store.update_position(&center.id, [0.0, 0.0, 0.0]).unwrap();
        for i in 1..=5 {
            let item = store.add_item(json!(format!("p{i}"))).unwrap();
            store
                .update_position(&item.id, [i as f32 * 0.1, 0.0, 0.0])
                .unwrap();
        }

        let window = store.spatial_window(&center.id, 1.0, Some(3));
        assert_eq!(window.len(), 3);
        assert!(window.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!((window[0].1 - 0.1).abs() < 1e-6);
    }

    #[test]
    fn statistics_reports_distributions() {
        let mut store = ContextStore::new();
        let a = store
            .add_item_full(json!("a"), "note", HashMap::new(), Some(vec![1.0, 0.0]))
            .unwrap();
        let b = store
            .add_item_full(json!("b"), "note", HashMap::new(), None)
            .unwrap();
        store
            .add_item_full(json!("c"), "document", HashMap::new(), None)
            .unwrap();
        store
            .add_relationship(&a.id, &b.id, "cites", 1.0, true, HashMap::new())
            .unwrap();

        let stats = store.statistics();
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.relationship_count, 1);
        assert_eq!(stats.items_by_type["note"], 2);
        assert_eq!(stats.items_by_type["document"], 1);
        assert_eq!(stats.relationships_by_type["cites"], 1);
        assert!(stats.graph_density > 0.0);
        assert_eq!(stats.vector_index.as_ref().map(|v| v.rows), Some(1));
    }

    #[test]
    fn statistics_without_embeddings_omits_index_stats() {
        let mut store = ContextStore::new();
        store.add_item(json!("a")).unwrap();
        assert!(store.statistics().vector_index.is_none());
    }

    #[test]
    fn reduce_dimensions_keys_coordinates_by_id() {
        let (store, mut ids) = embedded_store();
        let reduced = store.reduce_dimensions(ReductionMethod::Pca, 2);
        assert_eq!(reduced.len(), 3);
        let mut reduced_ids: Vec<String> = reduced.iter().map(|(id, _)| id.clone()).collect();
        reduced_ids.sort();
        ids.sort();
        assert_eq!(reduced_ids, ids);
    }
}
