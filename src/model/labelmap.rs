use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;

use super::{CoreError, DisplaySet, Result, SegmentMetadata};

/// One 2D slice of a label map. Pixel values are segment indices, 0 being
/// background.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelmapSlice {
    pub referenced_image_id: String,
    pub pixel_data: Array2<u16>,
}

impl LabelmapSlice {
    pub fn rows(&self) -> usize {
        self.pixel_data.nrows()
    }

    pub fn columns(&self) -> usize {
        self.pixel_data.ncols()
    }

    /// Distinct non-zero segment indices present in this slice.
    pub fn segments_on_labelmap(&self) -> BTreeSet<u16> {
        let mut segments = BTreeSet::new();
        for value in self.pixel_data.iter().copied() {
            if value != 0 {
                segments.insert(value);
            }
        }
        segments
    }

    pub fn segment_mask(&self, segment_index: u16) -> Array2<bool> {
        self.pixel_data.mapv(|value| value == segment_index)
    }
}

/// Ordered label-map slices, one per referenced source image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelmapVolume {
    slices: Vec<LabelmapSlice>,
}

impl LabelmapVolume {
    pub fn new(slices: Vec<LabelmapSlice>) -> Result<Self> {
        if let Some(first) = slices.first() {
            let (rows, columns) = (first.rows(), first.columns());
            for (slice, labelmap) in slices.iter().enumerate() {
                if labelmap.rows() != rows || labelmap.columns() != columns {
                    return Err(CoreError::SliceShapeMismatch {
                        slice,
                        rows,
                        columns,
                        actual_rows: labelmap.rows(),
                        actual_columns: labelmap.columns(),
                    });
                }
            }
        }
        Ok(Self { slices })
    }

    /// An all-background label map matching the display set's images.
    pub fn empty_for(display_set: &DisplaySet) -> Self {
        let slices = display_set
            .images
            .iter()
            .map(|image| LabelmapSlice {
                referenced_image_id: image.sop_instance_uid.clone(),
                pixel_data: Array2::zeros((image.rows, image.columns)),
            })
            .collect();
        Self { slices }
    }

    /// Builds a label map from a (slice, row, column) array aligned with the
    /// display set's images.
    pub fn from_array(display_set: &DisplaySet, data: &Array3<u16>) -> Result<Self> {
        let depth = data.len_of(Axis(0));
        if depth != display_set.images.len() {
            return Err(CoreError::SliceCountMismatch {
                slices: depth,
                images: display_set.images.len(),
            });
        }
        let slices = display_set
            .images
            .iter()
            .zip(data.axis_iter(Axis(0)))
            .map(|(image, pixels)| LabelmapSlice {
                referenced_image_id: image.sop_instance_uid.clone(),
                pixel_data: pixels.to_owned(),
            })
            .collect();
        Self::new(slices)
    }

    pub fn slices(&self) -> &[LabelmapSlice] {
        &self.slices
    }

    pub fn slice(&self, index: usize) -> Option<&LabelmapSlice> {
        self.slices.get(index)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.slices.first().map_or(0, LabelmapSlice::rows)
    }

    pub fn columns(&self) -> usize {
        self.slices.first().map_or(0, LabelmapSlice::columns)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Labelmap2D<'a> {
    pub referenced_image_id: &'a str,
    pub segments_on_labelmap: BTreeSet<u16>,
    pub pixel_data: ArrayView2<'a, u16>,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Labelmap3D<'a> {
    pub segments_on_labelmap: BTreeSet<u16>,
    pub metadata: BTreeMap<u16, SegmentMetadata>,
    pub labelmaps_2d: Vec<Labelmap2D<'a>>,
}

impl Labelmap3D<'_> {
    /// Slice positions on which `segment_index` appears, in slice order.
    pub fn slices_with_segment(&self, segment_index: u16) -> Vec<usize> {
        self.labelmaps_2d
            .iter()
            .enumerate()
            .filter(|(_, labelmap)| labelmap.segments_on_labelmap.contains(&segment_index))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Scans every slice once and collects the segments present per slice and
/// across the volume. Metadata is left empty for the caller to attach.
pub fn summarize_labelmap(volume: &LabelmapVolume) -> Labelmap3D<'_> {
    let labelmaps_2d = volume
        .slices()
        .par_iter()
        .map(|slice| Labelmap2D {
            referenced_image_id: &slice.referenced_image_id,
            segments_on_labelmap: slice.segments_on_labelmap(),
            pixel_data: slice.pixel_data.view(),
            rows: slice.rows(),
            columns: slice.columns(),
        })
        .collect::<Vec<_>>();
    let segments_on_labelmap = labelmaps_2d
        .iter()
        .flat_map(|labelmap| labelmap.segments_on_labelmap.iter().copied())
        .collect();
    Labelmap3D {
        segments_on_labelmap,
        metadata: BTreeMap::new(),
        labelmaps_2d,
    }
}
