use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(
        "label-map slice {slice} has shape {actual_rows}x{actual_columns}, expected {rows}x{columns}"
    )]
    SliceShapeMismatch {
        slice: usize,
        rows: usize,
        columns: usize,
        actual_rows: usize,
        actual_columns: usize,
    },

    #[error("label map has {slices} slices but display set has {images} images")]
    SliceCountMismatch { slices: usize, images: usize },

    #[error("segment index 0 is reserved for background")]
    BackgroundSegment,

    #[error("invalid threshold range: low {low} is greater than high {high}")]
    InvalidThresholdRange { low: f32, high: f32 },

    #[error("invalid model data: {0}")]
    Invalid(String),
}
