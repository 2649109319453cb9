use crate::model::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unsupported stack format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported stack layout: {0}")]
    UnsupportedLayout(String),

    #[error("segmentation has no segments on its label map")]
    EmptySegmentation,

    #[error("no metadata for segment {0}")]
    MissingSegmentMetadata(u16),

    #[error("label-map slice references unknown image `{0}`")]
    MissingReferencedImage(String),

    #[error("DICOM encoding failure: {0}")]
    Dicom(String),

    #[error("PDF rendering failure: {0}")]
    Pdf(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode/encode failure: {0}")]
    Image(#[from] image::ImageError),

    #[error("TIFF decode/encode failure: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("model failure: {0}")]
    Core(#[from] CoreError),
}
