use crate::formats::FormatError;
use crate::model::CoreError;
use crate::runtime::ServiceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid command parameters: {0}")]
    InvalidParams(String),

    #[error("no segmentation found for id `{0}`")]
    SegmentationNotFound(String),

    #[error("viewport `{0}` not found")]
    ViewportNotFound(String),

    #[error("no viewport id given and no viewport is active")]
    NoActiveViewport,

    #[error("viewport `{0}` does not show a display set")]
    EmptyViewport(String),

    #[error("display set `{0}` not found")]
    DisplaySetNotFound(String),

    #[error("segmentation `{segmentation_id}` references unknown image `{image_id}`")]
    ReferencedImageNotFound {
        segmentation_id: String,
        image_id: String,
    },

    #[error("encoding failure: {0}")]
    Format(#[from] FormatError),

    #[error("service failure: {0}")]
    Service(#[from] ServiceError),

    #[error("model failure: {0}")]
    Core(#[from] CoreError),

    #[error("payload serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
