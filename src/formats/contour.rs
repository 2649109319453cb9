//! Planar contours of binary masks, traced with `imageproc`.
//!
//! The mask is padded by one background pixel before tracing so regions
//! touching the image edge still get closed borders. Points are pixel
//! centres of the border pixels.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use ndarray::ArrayView2;

/// A closed planar contour in pixel coordinates, `[column, row]` per point.
/// The closing point is not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<[f64; 2]>,
    /// Border of a background hole inside a region rather than its outline.
    pub hole: bool,
}

/// Extracts outer and hole borders of foreground regions of `mask`, in
/// raster order of their first pixel.
pub fn extract_contours(mask: ArrayView2<'_, bool>) -> Vec<Contour> {
    let (rows, columns) = mask.dim();
    let padded = GrayImage::from_fn(columns as u32 + 2, rows as u32 + 2, |x, y| {
        let inside = x >= 1
            && y >= 1
            && (x as usize) <= columns
            && (y as usize) <= rows
            && mask[[y as usize - 1, x as usize - 1]];
        Luma([if inside { 255 } else { 0 }])
    });

    find_contours::<i64>(&padded)
        .into_iter()
        .filter(|contour| !contour.points.is_empty())
        .map(|contour| {
            let mut points = contour
                .points
                .iter()
                .map(|point| (point.x - 1, point.y - 1))
                .collect::<Vec<_>>();
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            Contour {
                points: simplify(&points)
                    .into_iter()
                    .map(|(x, y)| [x as f64, y as f64])
                    .collect(),
                hole: matches!(contour.border_type, BorderType::Hole),
            }
        })
        .collect()
}

/// Drops points lying on the straight line between their neighbours.
fn simplify(points: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let count = points.len();
    if count < 4 {
        return points.to_vec();
    }
    (0..count)
        .filter(|index| {
            let (ax, ay) = points[(index + count - 1) % count];
            let (bx, by) = points[*index];
            let (cx, cy) = points[(index + 1) % count];
            (bx - ax) * (cy - by) - (by - ay) * (cx - bx) != 0
        })
        .map(|index| points[index])
        .collect()
}
