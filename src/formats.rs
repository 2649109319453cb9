mod capture;
mod contour;
mod dataset;
mod elements;
mod error;
mod pdf;
mod rtss;
mod seg;
mod stack;
mod uid;

#[cfg(test)]
mod tests;

pub use capture::{OverlayLayer, render_viewport};
pub use contour::{Contour, extract_contours};
pub use dataset::GeneratedDataset;
pub use error::{FormatError, Result};
pub use pdf::{NO_SEGMENT_METADATA, PdfReport, render_pdf, report_lines};
pub use rtss::{RT_STRUCTURE_SET_STORAGE, RtssOptions, RtssSource, encode_rt_structure_set};
pub use seg::{SEGMENTATION_STORAGE, SegEncodingOptions, encode_segmentation};
pub use stack::{read_image_stack, read_labelmap_stack, supported_formats, write_labelmap_stack};
pub use uid::generate_uid;
