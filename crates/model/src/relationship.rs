use crate::error::{ModelError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A typed, weighted link between two items.
///
/// Directed by default. An undirected relationship compares and hashes
/// symmetrically: `(a, b, t)` and `(b, a, t)` are the same link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    pub weight: f32,
    pub directed: bool,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Start building a relationship between two item ids.
    pub fn between(source_id: impl Into<String>, target_id: impl Into<String>) -> RelationshipBuilder {
        RelationshipBuilder {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: "generic".to_string(),
            weight: 1.0,
            directed: true,
            metadata: HashMap::new(),
        }
    }

    /// Check the construction invariants. Used by the builder and again when
    /// relationships arrive from a deserialized snapshot.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(ModelError::InvalidWeight(self.weight));
        }
        if self.source_id == self.target_id {
            return Err(ModelError::SelfLoop(self.source_id.clone()));
        }
        Ok(())
    }

    /// The same link with source and target swapped.
    pub fn reverse(&self) -> Self {
        Self {
            source_id: self.target_id.clone(),
            target_id: self.source_id.clone(),
            ..self.clone()
        }
    }

    /// Whether this relationship touches the given item id.
    pub fn involves(&self, id: &str) -> bool {
        self.source_id == id || self.target_id == id
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        if self.directed != other.directed || self.relationship_type != other.relationship_type {
            return false;
        }
        if self.directed {
            self.source_id == other.source_id && self.target_id == other.target_id
        } else {
            (self.source_id == other.source_id && self.target_id == other.target_id)
                || (self.source_id == other.target_id && self.target_id == other.source_id)
        }
    }
}

impl Eq for Relationship {}

impl Hash for Relationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.directed.hash(state);
        self.relationship_type.hash(state);
        if self.directed {
            self.source_id.hash(state);
            self.target_id.hash(state);
        } else {
            // Endpoints in lexical order so (a, b) and (b, a) hash identically.
            let (lo, hi) = if self.source_id <= self.target_id {
                (&self.source_id, &self.target_id)
            } else {
                (&self.target_id, &self.source_id)
            };
            lo.hash(state);
            hi.hash(state);
        }
    }
}

/// Builder enforcing the weight range and self-loop invariants at `build`.
#[derive(Debug, Clone)]
pub struct RelationshipBuilder {
    source_id: String,
    target_id: String,
    relationship_type: String,
    weight: f32,
    directed: bool,
    metadata: HashMap<String, Value>,
}

impl RelationshipBuilder {
    pub fn relationship_type(mut self, relationship_type: impl Into<String>) -> Self {
        self.relationship_type = relationship_type.into();
        self
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> Result<Relationship> {
        let relationship = Relationship {
            source_id: self.source_id,
            target_id: self.target_id,
            relationship_type: self.relationship_type,
            weight: self.weight,
            directed: self.directed,
            metadata: self.metadata,
            created_at: Utc::now(),
        };
        relationship.validate()?;
        Ok(relationship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(rel: &Relationship) -> u64 {
        let mut hasher = DefaultHasher::new();
        rel.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn defaults_are_generic_directed_full_weight() {
        let rel = Relationship::between("a", "b").build().unwrap();
        assert_eq!(rel.relationship_type, "generic");
        assert!(rel.directed);
        assert!((rel.weight - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn weight_out_of_range_fails() {
        let err = Relationship::between("a", "b").weight(1.5).build().unwrap_err();
        assert!(matches!(err, ModelError::InvalidWeight(w) if (w - 1.5).abs() < f32::EPSILON));

        let err = Relationship::between("a", "b").weight(-0.1).build().unwrap_err();
        assert!(matches!(err, ModelError::InvalidWeight(_)));
    }

    #[test]
    fn boundary_weights_are_valid() {
        assert!(Relationship::between("a", "b").weight(0.0).build().is_ok());
        assert!(Relationship::between("a", "b").weight(1.0).build().is_ok());
    }

    #[test]
    fn self_loop_fails() {
        let err = Relationship::between("a", "a").build().unwrap_err();
        assert!(matches!(err, ModelError::SelfLoop(id) if id == "a"));
    }

    #[test]
    fn undirected_equality_is_symmetric() {
        let ab = Relationship::between("a", "b")
            .relationship_type("t")
            .directed(false)
            .build()
            .unwrap();
        let ba = Relationship::between("b", "a")
            .relationship_type("t")
            .directed(false)
            .build()
            .unwrap();
        assert_eq!(ab, ba);
        assert_eq!(hash_of(&ab), hash_of(&ba));
    }

    #[test]
    fn directed_equality_is_ordered() {
        let ab = Relationship::between("a", "b").relationship_type("t").build().unwrap();
        let ba = Relationship::between("b", "a").relationship_type("t").build().unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn type_distinguishes_relationships() {
        let semantic = Relationship::between("a", "b").relationship_type("semantic").build().unwrap();
        let temporal = Relationship::between("a", "b").relationship_type("temporal").build().unwrap();
        assert_ne!(semantic, temporal);
    }

    #[test]
    fn reverse_swaps_endpoints_only() {
        let rel = Relationship::between("a", "b")
            .relationship_type("cites")
            .weight(0.4)
            .build()
            .unwrap();
        let rev = rel.reverse();
        assert_eq!(rev.source_id, "b");
        assert_eq!(rev.target_id, "a");
        assert_eq!(rev.relationship_type, "cites");
        assert!((rev.weight - 0.4).abs() < f32::EPSILON);
        assert_eq!(rev.created_at, rel.created_at);
    }

    #[test]
    fn validate_catches_deserialized_invalid_weight() {
        let mut rel = Relationship::between("a", "b").build().unwrap();
        rel.weight = 2.0;
        assert!(rel.validate().is_err());
    }

    #[test]
    fn involves_checks_both_endpoints() {
        let rel = Relationship::between("a", "b").build().unwrap();
        assert!(rel.involves("a"));
        assert!(rel.involves("b"));
        assert!(!rel.involves("c"));
    }
}
