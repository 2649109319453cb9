use std::collections::BTreeMap;

use image::{Rgba as Pixel, RgbaImage};
use ndarray::ArrayView2;

use crate::model::{LabelmapSlice, Rgba, default_segment_color};

const OVERLAY_OPACITY: f32 = 0.5;

/// A label-map slice drawn over the base image, with per-segment colours.
#[derive(Debug, Clone)]
pub struct OverlayLayer<'a> {
    pub slice: &'a LabelmapSlice,
    pub colors: BTreeMap<u16, Rgba>,
}

/// Rasterises one viewport: the grayscale slice windowed to its own range,
/// label maps blended on top, scaled nearest-neighbour to `width` x `height`.
pub fn render_viewport(
    pixels: Option<ArrayView2<'_, f32>>,
    overlays: &[OverlayLayer<'_>],
    width: u32,
    height: u32,
) -> RgbaImage {
    let pixels = pixels.filter(|view| !view.is_empty());
    let (source_rows, source_columns) = pixels
        .as_ref()
        .map(|view| view.dim())
        .or_else(|| {
            overlays
                .first()
                .map(|layer| (layer.slice.rows(), layer.slice.columns()))
        })
        .unwrap_or((1, 1));
    let (source_rows, source_columns) = (source_rows.max(1), source_columns.max(1));
    let (low, high) = pixels
        .as_ref()
        .map(|view| {
            view.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), value| {
                (low.min(*value), high.max(*value))
            })
        })
        .unwrap_or((0.0, 0.0));
    let span = (high - low).max(f32::EPSILON);

    let mut canvas = RgbaImage::new(width.max(1), height.max(1));
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let row = (y as usize * source_rows / height.max(1) as usize).min(source_rows - 1);
        let column = (x as usize * source_columns / width.max(1) as usize).min(source_columns - 1);

        let gray = pixels
            .as_ref()
            .map(|view| (((view[[row, column]] - low) / span).clamp(0.0, 1.0) * 255.0).round())
            .unwrap_or(0.0);
        let mut rgb = [gray, gray, gray];

        for layer in overlays {
            if row >= layer.slice.rows() || column >= layer.slice.columns() {
                continue;
            }
            let segment = layer.slice.pixel_data[[row, column]];
            if segment == 0 {
                continue;
            }
            let color = layer
                .colors
                .get(&segment)
                .copied()
                .unwrap_or_else(|| default_segment_color(segment));
            let alpha = OVERLAY_OPACITY * f32::from(color[3]) / 255.0;
            for (channel, value) in rgb.iter_mut().enumerate() {
                *value = *value * (1.0 - alpha) + f32::from(color[channel]) * alpha;
            }
        }

        *pixel = Pixel([rgb[0] as u8, rgb[1] as u8, rgb[2] as u8, 255]);
    }
    canvas
}
