use thiserror::Error;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("count mismatch: expected {expected} elements, got {got}")]
    CountMismatch { expected: usize, got: usize },
    #[error("unknown blob handle {0}")]
    UnknownBlob(usize),
    #[error("blob {0} cannot be both source and destination")]
    Aliased(usize),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
