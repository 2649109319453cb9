use std::fs::File;
use std::path::Path;

use image::DynamicImage;
use ndarray::{Array3, Axis};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};

use super::{FormatError, Result};

pub fn supported_formats() -> &'static [&'static str] {
    &["png", "tif", "tiff"]
}

fn extension(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .ok_or_else(|| FormatError::UnsupportedFormat(path.to_string_lossy().to_string()))
}

/// Reads a label map laid out as (slice, row, column). Multi-page TIFF pages
/// are slices; a PNG is a single slice.
pub fn read_labelmap_stack(path: impl AsRef<Path>) -> Result<Array3<u16>> {
    let (pages, height, width) = read_pages(path.as_ref())?;
    let mut values = Vec::with_capacity(pages.len() * height * width);
    for page in &pages {
        for value in page {
            if *value < 0.0 || value.fract() != 0.0 || *value > f32::from(u16::MAX) {
                return Err(FormatError::UnsupportedLayout(format!(
                    "label maps must hold unsigned integer segment indices, found {value}"
                )));
            }
            values.push(*value as u16);
        }
    }
    Array3::from_shape_vec((pages.len(), height, width), values)
        .map_err(|error| FormatError::UnsupportedLayout(error.to_string()))
}

/// Reads grayscale source pixels laid out as (slice, row, column).
pub fn read_image_stack(path: impl AsRef<Path>) -> Result<Array3<f32>> {
    let (pages, height, width) = read_pages(path.as_ref())?;
    let depth = pages.len();
    Array3::from_shape_vec((depth, height, width), pages.concat())
        .map_err(|error| FormatError::UnsupportedLayout(error.to_string()))
}

/// Writes a label map as a multi-page 16-bit TIFF, one page per slice.
pub fn write_labelmap_stack(path: impl AsRef<Path>, data: &Array3<u16>) -> Result<()> {
    let path = path.as_ref();
    if !matches!(extension(path)?.as_str(), "tif" | "tiff") {
        return Err(FormatError::UnsupportedFormat(path.to_string_lossy().to_string()));
    }
    let (_, height, width) = data.dim();
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    for slice in data.axis_iter(Axis(0)) {
        let samples = slice.iter().copied().collect::<Vec<_>>();
        let image = encoder.new_image::<colortype::Gray16>(width as u32, height as u32)?;
        image.write_data(&samples)?;
    }
    Ok(())
}

type Pages = (Vec<Vec<f32>>, usize, usize);

fn read_pages(path: &Path) -> Result<Pages> {
    match extension(path)?.as_str() {
        "png" => {
            let (values, width, height) = match image::open(path)? {
                DynamicImage::ImageLuma8(buffer) => {
                    let (width, height) = buffer.dimensions();
                    let values = buffer.into_raw().into_iter().map(f32::from).collect();
                    (values, width, height)
                }
                DynamicImage::ImageLuma16(buffer) => {
                    let (width, height) = buffer.dimensions();
                    let values = buffer.into_raw().into_iter().map(f32::from).collect();
                    (values, width, height)
                }
                other => {
                    return Err(FormatError::UnsupportedLayout(format!(
                        "only single-channel PNG images are supported, found {:?}",
                        other.color()
                    )));
                }
            };
            Ok((vec![values], height as usize, width as usize))
        }
        "tif" | "tiff" => read_tiff_pages(path),
        other => Err(FormatError::UnsupportedFormat(format!(
            "{other} (expected one of: {})",
            supported_formats().join(", ")
        ))),
    }
}

fn read_tiff_pages(path: &Path) -> Result<Pages> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file)?;
    let (width, height) = decoder.dimensions()?;
    let expected = width as usize * height as usize;
    let mut pages = Vec::new();

    loop {
        let page = match decoder.read_image()? {
            DecodingResult::U8(buffer) => buffer.into_iter().map(f32::from).collect::<Vec<_>>(),
            DecodingResult::U16(buffer) => buffer.into_iter().map(f32::from).collect(),
            DecodingResult::U32(buffer) => buffer.into_iter().map(|value| value as f32).collect(),
            DecodingResult::F32(buffer) => buffer,
            other => {
                return Err(FormatError::UnsupportedLayout(format!(
                    "unsupported TIFF sample type: {other:?}"
                )));
            }
        };
        if page.len() != expected {
            return Err(FormatError::UnsupportedLayout(
                "only single-channel TIFF pages are supported".into(),
            ));
        }
        pages.push(page);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
        let (other_width, other_height) = decoder.dimensions()?;
        if other_width != width || other_height != height {
            return Err(FormatError::UnsupportedLayout(
                "TIFF pages must have identical dimensions".into(),
            ));
        }
    }

    Ok((pages, height as usize, width as usize))
}
