use crate::formats::FormatError;
use crate::model::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("segmentation `{0}` not found")]
    SegmentationNotFound(String),

    #[error("viewport `{0}` not found")]
    ViewportNotFound(String),

    #[error("display set `{0}` not found")]
    DisplaySetNotFound(String),

    #[error("tool group `{0}` not found")]
    ToolGroupNotFound(String),

    #[error("viewport `{0}` has no on-screen element")]
    ElementNotFound(String),

    #[error("data source `{0}` is not configured")]
    DataSourceNotFound(String),

    #[error("store request failed: {0}")]
    Store(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("service I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("service format failure: {0}")]
    Format(#[from] FormatError),

    #[error("service model failure: {0}")]
    Core(#[from] CoreError),
}
