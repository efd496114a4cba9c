use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Relationship weight {0} outside [0.0, 1.0]")]
    InvalidWeight(f32),

    #[error("Self-loop relationship not allowed: {0}")]
    SelfLoop(String),

    #[error("Item has no embedding: {0}")]
    MissingEmbedding(String),

    #[error("Invalid embedding vector: {0}")]
    InvalidVector(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}
