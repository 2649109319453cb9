mod download;
mod error;
mod generate;
mod load;
mod params;
mod pdf;
mod registry;
mod schema;
mod store;
mod tools;
mod viewport;

#[cfg(test)]
mod tests;

pub use download::{
    DownloadRtssCommand, DownloadSegmentationCommand, download_rtss, download_segmentation,
};
pub use error::{CommandError, Result};
pub use generate::{
    GenerateSegmentationCommand, GeneratedSegmentation, GenerationOptions, generate_segmentation,
};
pub use load::{LoadSegmentationsCommand, load_segmentations_for_viewport};
pub use pdf::{DownloadPdfCommand, PdfExport, download_pdf};
pub use registry::{
    default_registry, execute_command, execute_command_with_registry, list_commands,
};
pub use schema::{Command, CommandOutput, CommandSchema, ParamSpec};
pub use store::{StoreSegmentationCommand, StoredSegmentation, store_segmentation};
pub use tools::{
    DEFAULT_THRESHOLD_TOOLS, SetBrushSizeCommand, SetThresholdRangeCommand, set_brush_size,
    set_threshold_range,
};
pub use viewport::resolve_viewport;
