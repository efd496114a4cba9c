use crate::error::{ModelError, Result};
use crate::metric::DistanceMetric;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Number of hex characters kept from the content digest when deriving ids.
pub const ID_HASH_LEN: usize = 16;

/// One deduplicated unit of content with an optional embedding and a 3D position.
///
/// Equality and hashing are by `id` only; two items with the same id are the
/// same item regardless of attribute drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    /// Opaque structured content; the dedup key is derived from it.
    pub content: Value,

    /// Unit-L2 vector when present; `set_embedding` enforces normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Spatial coordinate in the unit cube unless explicitly placed.
    pub position: [f32; 3],

    pub item_type: String,

    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create an item whose id is derived from the canonical content hash.
    pub fn new(content: Value) -> Self {
        let id = content_hash(&content);
        let mut rng = rand::rng();
        Self {
            id,
            content,
            embedding: None,
            position: [rng.random(), rng.random(), rng.random()],
            item_type: "generic".to_string(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Override the derived id with a caller-supplied one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Attach a normalized embedding during construction.
    pub fn with_embedding(mut self, vector: Vec<f32>) -> Result<Self> {
        self.set_embedding(vector)?;
        Ok(self)
    }

    /// Store `vector` L2-normalized. Empty and zero-norm vectors are rejected.
    pub fn set_embedding(&mut self, vector: Vec<f32>) -> Result<()> {
        self.embedding = Some(l2_normalize(vector)?);
        Ok(())
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    /// Positional distance to another item.
    pub fn distance_to(&self, other: &Item, metric: DistanceMetric) -> f32 {
        metric.distance(&self.position, &other.position)
    }

    /// Cosine similarity via the dot product of the normalized embeddings.
    ///
    /// Result lies in [-1, 1]; callers wanting a [0, 1] score use
    /// `1 - cosine_distance` on the vector index side.
    pub fn similarity_to(&self, other: &Item) -> Result<f32> {
        let a = self
            .embedding
            .as_deref()
            .ok_or_else(|| ModelError::MissingEmbedding(self.id.clone()))?;
        let b = other
            .embedding
            .as_deref()
            .ok_or_else(|| ModelError::MissingEmbedding(other.id.clone()))?;
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Deterministic id for a content value: canonical JSON (object keys sorted
/// recursively) hashed with SHA-256, truncated to `ID_HASH_LEN` hex chars.
///
/// Canonicalization is done here rather than relying on `serde_json` map
/// ordering so the digest is stable no matter which map backing the
/// dependency tree enables.
pub fn content_hash(content: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(content, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(ID_HASH_LEN);
    for byte in digest.iter().take(ID_HASH_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(values) => {
            out.push('[');
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Normalize to unit L2 norm, rejecting vectors with nothing to normalize.
pub fn l2_normalize(mut vector: Vec<f32>) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(ModelError::InvalidVector("empty vector".to_string()));
    }
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return Err(ModelError::InvalidVector("zero-norm vector".to_string()));
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    Ok(vector)
}
