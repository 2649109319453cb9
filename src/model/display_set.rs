use ndarray::{Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Geometry and identity of one source image referenced by a label-map slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedImage {
    pub sop_instance_uid: String,
    pub rows: usize,
    pub columns: usize,
    /// Patient-space position of the centre of the first transmitted pixel.
    pub image_position_patient: [f64; 3],
    /// Row direction cosines followed by column direction cosines.
    pub image_orientation_patient: [f64; 6],
    /// Spacing between rows, then between columns, in millimetres.
    pub pixel_spacing: [f64; 2],
    pub slice_thickness: Option<f64>,
}

impl ReferencedImage {
    pub fn row_direction(&self) -> [f64; 3] {
        [
            self.image_orientation_patient[0],
            self.image_orientation_patient[1],
            self.image_orientation_patient[2],
        ]
    }

    pub fn column_direction(&self) -> [f64; 3] {
        [
            self.image_orientation_patient[3],
            self.image_orientation_patient[4],
            self.image_orientation_patient[5],
        ]
    }

    /// Maps a (column, row) pixel coordinate to patient space.
    pub fn pixel_to_patient(&self, column: f64, row: f64) -> [f64; 3] {
        let row_direction = self.row_direction();
        let column_direction = self.column_direction();
        let column_step = column * self.pixel_spacing[1];
        let row_step = row * self.pixel_spacing[0];
        [0, 1, 2].map(|axis| {
            self.image_position_patient[axis]
                + column_step * row_direction[axis]
                + row_step * column_direction[axis]
        })
    }
}

/// A series as the viewer presents it: identity attributes plus its images in
/// display order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplaySet {
    pub display_set_instance_uid: String,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub series_description: Option<String>,
    pub modality: String,
    pub sop_class_uid: String,
    pub frame_of_reference_uid: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_birth_date: Option<String>,
    pub patient_sex: Option<String>,
    pub study_id: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub accession_number: Option<String>,
    pub images: Vec<ReferencedImage>,
    /// Grayscale pixel volume laid out as (slice, row, column), when loaded.
    pub pixels: Option<Array3<f32>>,
}

impl DisplaySet {
    pub fn image(&self, sop_instance_uid: &str) -> Option<&ReferencedImage> {
        self.images
            .iter()
            .find(|image| image.sop_instance_uid == sop_instance_uid)
    }

    pub fn slice_pixels(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        let pixels = self.pixels.as_ref()?;
        (index < pixels.len_of(Axis(0))).then(|| pixels.index_axis(Axis(0), index))
    }

    /// Distance between consecutive image positions, if there are at least two.
    pub fn spacing_between_slices(&self) -> Option<f64> {
        let first = self.images.first()?;
        let second = self.images.get(1)?;
        let distance = first
            .image_position_patient
            .iter()
            .zip(second.image_position_patient)
            .map(|(a, b)| (b - a).powi(2))
            .sum::<f64>()
            .sqrt();
        (distance > f64::EPSILON).then_some(distance)
    }
}
