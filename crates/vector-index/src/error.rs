use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Unknown similarity metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown cluster method: {0}")]
    UnknownClusterMethod(String),

    #[error("Unknown linkage: {0}")]
    UnknownLinkage(String),

    #[error("Unknown reduction method: {0}")]
    UnknownReduction(String),
}
