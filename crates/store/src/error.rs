use context_graph::GraphError;
use context_model::ModelError;
use context_vector_index::IndexError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
