use thiserror::Error;

/// Errors raised by window extraction, batching and adjacency construction.
///
/// Conditions the pipeline treats as exclusions (border windows, images
/// failing the seed/particle count check) are filtered and never show up here.
#[derive(Debug, Error)]
pub enum CaloError {
    #[error("crop size must be odd and non-zero, got {0}")]
    InvalidCropSize(usize),
    #[error("invalid parameter: {0}")]
    InvalidParams(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("{count} rows do not fit a padding capacity of {capacity}")]
    CapacityOverflow { count: usize, capacity: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, CaloError>;
