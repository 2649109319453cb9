mod color;
mod display_set;
mod error;
mod labelmap;
mod segmentation;
mod tools;
mod viewport;

#[cfg(test)]
mod tests;

pub use color::{
    Rgba, cielab_to_dicom_lab, default_segment_color, rgb_to_cielab, rgb_to_dicom_lab,
};
pub use display_set::{DisplaySet, ReferencedImage};
pub use error::{CoreError, Result};
pub use labelmap::{Labelmap2D, Labelmap3D, LabelmapSlice, LabelmapVolume, summarize_labelmap};
pub use segmentation::{
    CodedConcept, Segment, SegmentMetadata, Segmentation, SegmentationDescriptor,
    SegmentationRepresentation, TISSUE_CODE,
};
pub use tools::{ToolConfiguration, ToolGroup, validate_threshold_range};
pub use viewport::{Viewport, ViewportElement};
