use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReorderError {
    #[error("{0} missing")]
    MissingParam(&'static str),
    #[error("position list ({positions} entries) cannot be combined with row/col lists ({rows}/{cols} entries)")]
    ConflictingEncoding {
        positions: usize,
        rows: usize,
        cols: usize,
    },
    #[error("{what}: expected {expected} entries, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("position {value} at slot {slot} out of range [0, {size})")]
    PositionOutOfRange { slot: usize, value: i64, size: usize },
    #[error("row {value} at slot {slot} out of range [0, {height})")]
    RowOutOfRange { slot: usize, value: i64, height: usize },
    #[error("col {value} at slot {slot} out of range [0, {width})")]
    ColOutOfRange { slot: usize, value: i64, width: usize },
    #[error("element count mismatch: configured {expected}, input has {got}")]
    CountMismatch { expected: usize, got: usize },
    #[error("dimensions {dims:?} overflow the element count")]
    DimensionOverflow { dims: Vec<usize> },
    #[error("undefined reorder type: {0}")]
    UnknownOrder(String),
    #[error("Reorder layer does not allow in-place computation")]
    InPlace,
    #[error("layer used before setup")]
    NotSetUp,
    #[error("expected {expected} propagate_down flags, got {got}")]
    PropagateFlags { expected: usize, got: usize },
    #[error("tensor error: {0}")]
    Tensor(#[from] tr_tensor::TensorError),
    #[error("invalid reorder parameter: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReorderError>;
