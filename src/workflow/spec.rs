use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{DataSourceKind, ViewerConfig};
use crate::model::{DisplaySet, ReferencedImage, Rgba, Segment, ToolGroup, Viewport};
use crate::runtime::PromptResult;

use super::{Result, SessionError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySetSpec {
    pub display_set_instance_uid: String,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    #[serde(default)]
    pub series_description: Option<String>,
    pub modality: String,
    pub sop_class_uid: String,
    pub frame_of_reference_uid: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub patient_birth_date: Option<String>,
    #[serde(default)]
    pub patient_sex: Option<String>,
    #[serde(default)]
    pub study_id: Option<String>,
    #[serde(default)]
    pub study_date: Option<String>,
    #[serde(default)]
    pub study_time: Option<String>,
    #[serde(default)]
    pub accession_number: Option<String>,
    pub images: Vec<ReferencedImage>,
    /// Grayscale stack (PNG or multi-page TIFF) with one page per image.
    #[serde(default)]
    pub pixels: Option<PathBuf>,
}

impl DisplaySetSpec {
    pub fn to_display_set(&self) -> DisplaySet {
        DisplaySet {
            display_set_instance_uid: self.display_set_instance_uid.clone(),
            study_instance_uid: self.study_instance_uid.clone(),
            series_instance_uid: self.series_instance_uid.clone(),
            series_description: self.series_description.clone(),
            modality: self.modality.clone(),
            sop_class_uid: self.sop_class_uid.clone(),
            frame_of_reference_uid: self.frame_of_reference_uid.clone(),
            patient_id: self.patient_id.clone(),
            patient_name: self.patient_name.clone(),
            patient_birth_date: self.patient_birth_date.clone(),
            patient_sex: self.patient_sex.clone(),
            study_id: self.study_id.clone(),
            study_date: self.study_date.clone(),
            study_time: self.study_time.clone(),
            accession_number: self.accession_number.clone(),
            images: self.images.clone(),
            pixels: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentationSpec {
    #[serde(default)]
    pub segmentation_id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub viewport_id: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Label-map stack (16-bit TIFF or PNG) aligned with the display set.
    #[serde(default)]
    pub labelmap: Option<PathBuf>,
    /// Colour overrides applied on the viewport the segmentation lands on.
    #[serde(default)]
    pub colors: BTreeMap<u16, Rgba>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandInvocation {
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

/// A viewer state to rebuild plus the commands to run against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Option<ViewerConfig>,
    #[serde(default)]
    pub display_sets: Vec<DisplaySetSpec>,
    #[serde(default)]
    pub viewports: Vec<Viewport>,
    #[serde(default)]
    pub active_viewport: Option<String>,
    #[serde(default)]
    pub tool_groups: Vec<ToolGroup>,
    #[serde(default)]
    pub segmentations: Vec<SegmentationSpec>,
    /// Scripted answer for the report prompt.
    #[serde(default)]
    pub prompt: Option<PromptResult>,
    #[serde(default)]
    pub steps: Vec<CommandInvocation>,
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl SessionSpec {
    pub fn validate(&self) -> Result<()> {
        let mut display_sets = BTreeSet::new();
        for display_set in &self.display_sets {
            if display_set.images.is_empty() {
                return Err(SessionError::Parse(format!(
                    "display set `{}` has no images",
                    display_set.display_set_instance_uid
                )));
            }
            if !display_sets.insert(display_set.display_set_instance_uid.as_str()) {
                return Err(SessionError::Parse(format!(
                    "display set `{}` is declared twice",
                    display_set.display_set_instance_uid
                )));
            }
        }
        for viewport in &self.viewports {
            for uid in &viewport.display_set_instance_uids {
                if !display_sets.contains(uid.as_str()) {
                    return Err(SessionError::Parse(format!(
                        "viewport `{}` shows unknown display set `{uid}`",
                        viewport.viewport_id
                    )));
                }
            }
        }
        if let Some(active) = &self.active_viewport {
            if !self.viewports.iter().any(|viewport| &viewport.viewport_id == active) {
                return Err(SessionError::Parse(format!(
                    "active viewport `{active}` is not declared"
                )));
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.command.trim().is_empty() {
                return Err(SessionError::Parse(format!(
                    "step at index {index} has an empty command name"
                )));
            }
            if !step.params.is_object() && !step.params.is_null() {
                return Err(SessionError::Parse(format!(
                    "command `{}` parameters must be a JSON object",
                    step.command
                )));
            }
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    /// Makes file references relative to `base` absolute.
    pub fn resolve_paths(&mut self, base: &Path) {
        for display_set in &mut self.display_sets {
            if let Some(pixels) = display_set.pixels.as_mut() {
                resolve(base, pixels);
            }
        }
        for segmentation in &mut self.segmentations {
            if let Some(labelmap) = segmentation.labelmap.as_mut() {
                resolve(base, labelmap);
            }
        }
        if let Some(config) = self.config.as_mut() {
            resolve(base, &mut config.output_dir);
            for source in &mut config.data_sources {
                if let DataSourceKind::Local { directory } = &mut source.kind {
                    resolve(base, directory);
                }
            }
        }
    }
}
