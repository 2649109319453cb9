use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepReport {
    pub command: String,
    pub duration_ms: u128,
    pub payload: Value,
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

/// Label-map contents of one registered segmentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentationSummary {
    pub segmentation_id: String,
    pub label: String,
    pub referenced_display_set_uid: String,
    pub slices: usize,
    pub segments: Vec<u16>,
    pub segments_on_labelmap: Vec<u16>,
    pub segments_per_slice: Vec<Vec<u16>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReport {
    pub session_name: Option<String>,
    pub steps: Vec<StepReport>,
    pub segmentations: Vec<SegmentationSummary>,
}
