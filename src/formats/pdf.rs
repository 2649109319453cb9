use image::{DynamicImage, RgbaImage};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};

use crate::model::SegmentMetadata;

use super::{FormatError, Result};

pub const NO_SEGMENT_METADATA: &str = "No segment metadata available";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const MAX_IMAGE_HEIGHT_MM: f32 = 150.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const MM_PER_INCH: f32 = 25.4;

/// Everything placed on the single report page.
#[derive(Debug, Clone)]
pub struct PdfReport {
    pub title: String,
    pub capture: RgbaImage,
    pub lines: Vec<String>,
}

/// Text block listing segment metadata, or the placeholder line when there
/// is none.
pub fn report_lines(metadata: &[SegmentMetadata]) -> Vec<String> {
    if metadata.is_empty() {
        return vec![NO_SEGMENT_METADATA.to_string()];
    }
    let mut lines = vec!["Segment metadata".to_string()];
    for segment in metadata {
        let [l, a, b] = segment.recommended_display_cielab_value;
        lines.push(format!(
            "Segment {}: {}",
            segment.segment_number, segment.segment_label
        ));
        lines.push(format!(
            "  Algorithm: {} ({})",
            segment.segment_algorithm_type, segment.segment_algorithm_name
        ));
        lines.push(format!("  CIELab: {l} {a} {b}"));
        lines.push(format!(
            "  Category: {} / Type: {}",
            segment.segmented_property_category.code_meaning,
            segment.segmented_property_type.code_meaning
        ));
    }
    lines
}

/// Lays out an A4 page: title, the capture scaled to the printable width,
/// then the text block. Lines that do not fit above the bottom margin are
/// dropped.
pub fn render_pdf(report: &PdfReport) -> Result<Vec<u8>> {
    let (document, page, layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = document.get_page(page).get_layer(layer);
    let regular = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|error| FormatError::Pdf(error.to_string()))?;
    let bold = document
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|error| FormatError::Pdf(error.to_string()))?;

    let title_baseline = PAGE_HEIGHT_MM - MARGIN_MM;
    layer.use_text(
        report.title.as_str(),
        18.0,
        Mm(MARGIN_MM),
        Mm(title_baseline),
        &bold,
    );

    let rgb = DynamicImage::ImageRgba8(report.capture.clone()).to_rgb8();
    let (width, height) = rgb.dimensions();
    let buffer = printpdf::image_crate::RgbImage::from_raw(width, height, rgb.into_raw())
        .ok_or_else(|| FormatError::Pdf("capture buffer does not match its dimensions".into()))?;
    let embedded = Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageRgb8(
        buffer,
    ));

    let printable_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let dpi = (width as f32 * MM_PER_INCH / printable_width)
        .max(height as f32 * MM_PER_INCH / MAX_IMAGE_HEIGHT_MM);
    let image_height = height as f32 * MM_PER_INCH / dpi;
    let image_bottom = title_baseline - 8.0 - image_height;
    embedded.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN_MM)),
            translate_y: Some(Mm(image_bottom)),
            dpi: Some(dpi),
            ..ImageTransform::default()
        },
    );

    let mut baseline = image_bottom - 10.0;
    for line in &report.lines {
        if baseline < MARGIN_MM {
            log::warn!("report text truncated before `{line}`");
            break;
        }
        layer.use_text(line.as_str(), 10.0, Mm(MARGIN_MM), Mm(baseline), &regular);
        baseline -= LINE_HEIGHT_MM;
    }

    document
        .save_to_bytes()
        .map_err(|error| FormatError::Pdf(error.to_string()))
}
