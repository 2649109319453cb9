use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CoreError, LabelmapVolume, Result, Rgba, rgb_to_dicom_lab};

pub const DEFAULT_ALGORITHM_TYPE: &str = "MANUAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedConcept {
    pub code_value: &'static str,
    pub coding_scheme_designator: &'static str,
    pub code_meaning: &'static str,
}

/// Property category and type attached to every exported segment.
pub const TISSUE_CODE: CodedConcept = CodedConcept {
    code_value: "T-D0050",
    coding_scheme_designator: "SRT",
    code_meaning: "Tissue",
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub segment_index: u16,
    pub label: String,
    #[serde(default)]
    pub algorithm_type: Option<String>,
    #[serde(default)]
    pub algorithm_name: Option<String>,
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl Segment {
    pub fn new(segment_index: u16, label: impl Into<String>) -> Self {
        Self {
            segment_index,
            label: label.into(),
            algorithm_type: None,
            algorithm_name: None,
            color: None,
            locked: false,
            visible: true,
        }
    }
}

/// What a host passes when asking for segmentations to be created on a
/// viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationDescriptor {
    #[serde(default)]
    pub segmentation_id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub segmentation_id: String,
    pub label: String,
    pub referenced_display_set_uid: String,
    pub segments: BTreeMap<u16, Segment>,
    pub labelmap: LabelmapVolume,
}

impl Segmentation {
    pub fn new(
        segmentation_id: impl Into<String>,
        label: impl Into<String>,
        referenced_display_set_uid: impl Into<String>,
        segments: impl IntoIterator<Item = Segment>,
        labelmap: LabelmapVolume,
    ) -> Result<Self> {
        let mut by_index = BTreeMap::new();
        for segment in segments {
            if segment.segment_index == 0 {
                return Err(CoreError::BackgroundSegment);
            }
            by_index.insert(segment.segment_index, segment);
        }
        Ok(Self {
            segmentation_id: segmentation_id.into(),
            label: label.into(),
            referenced_display_set_uid: referenced_display_set_uid.into(),
            segments: by_index,
            labelmap,
        })
    }

    pub fn segment(&self, segment_index: u16) -> Option<&Segment> {
        self.segments.get(&segment_index)
    }
}

/// A segmentation attached to a viewport, with any colour overrides the
/// viewport applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationRepresentation {
    pub viewport_id: String,
    pub segmentation_id: String,
    #[serde(default)]
    pub colors: BTreeMap<u16, Rgba>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetadata {
    pub segment_number: u16,
    pub segment_label: String,
    pub segment_algorithm_type: String,
    pub segment_algorithm_name: String,
    #[serde(rename = "recommendedDisplayCIELabValue")]
    pub recommended_display_cielab_value: [u16; 3],
    pub segmented_property_category: CodedConcept,
    pub segmented_property_type: CodedConcept,
}

impl SegmentMetadata {
    pub fn describe(segment: &Segment, color: Rgba, default_algorithm_name: &str) -> Self {
        let rgb = [color[0], color[1], color[2]].map(|channel| f64::from(channel) / 255.0);
        let lab = rgb_to_dicom_lab(rgb).map(|value| value.round().clamp(0.0, 65_535.0) as u16);
        Self {
            segment_number: segment.segment_index,
            segment_label: segment.label.clone(),
            segment_algorithm_type: segment
                .algorithm_type
                .clone()
                .unwrap_or_else(|| DEFAULT_ALGORITHM_TYPE.to_string()),
            segment_algorithm_name: segment
                .algorithm_name
                .clone()
                .unwrap_or_else(|| default_algorithm_name.to_string()),
            recommended_display_cielab_value: lab,
            segmented_property_category: TISSUE_CODE,
            segmented_property_type: TISSUE_CODE,
        }
    }
}
