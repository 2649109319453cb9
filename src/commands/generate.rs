use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::GenerationDefaults;
use crate::formats::{GeneratedDataset, SegEncodingOptions, encode_segmentation};
use crate::model::{
    DisplaySet, ReferencedImage, Rgba, Segment, SegmentMetadata, Segmentation,
    default_segment_color, summarize_labelmap,
};
use crate::runtime::AppContext;

use super::params::{get_optional_typed, get_required_str};
use super::viewport::display_set;
use super::{Command, CommandError, CommandOutput, CommandSchema, ParamSpec, Result};

/// Overrides for the generated series. Unset fields fall back to the viewer
/// configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    pub series_description: Option<String>,
    pub series_number: Option<u32>,
    pub instance_number: Option<u32>,
    pub manufacturer: Option<String>,
    pub content_label: Option<String>,
    pub content_creator_name: Option<String>,
    pub algorithm_name: Option<String>,
}

impl GenerationOptions {
    pub fn with_series_description(mut self, series_description: impl Into<String>) -> Self {
        self.series_description = Some(series_description.into());
        self
    }

    fn encoding(&self, defaults: &GenerationDefaults) -> SegEncodingOptions {
        let fallback = SegEncodingOptions::default();
        SegEncodingOptions {
            series_description: self
                .series_description
                .clone()
                .unwrap_or(fallback.series_description),
            series_number: self.series_number.unwrap_or(defaults.series_number),
            instance_number: self.instance_number.unwrap_or(fallback.instance_number),
            manufacturer: self
                .manufacturer
                .clone()
                .unwrap_or_else(|| defaults.manufacturer.clone()),
            content_label: self.content_label.clone().unwrap_or(fallback.content_label),
            content_creator_name: self.content_creator_name.clone(),
            software_versions: fallback.software_versions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedSegmentation {
    pub segmentation_id: String,
    pub segments_on_labelmap: BTreeSet<u16>,
    pub metadata: Vec<SegmentMetadata>,
    pub dataset: GeneratedDataset,
}

/// Colour a segment is shown with: the override on the first viewport the
/// segmentation is attached to, else the segment's own colour, else the
/// default table.
pub(crate) fn display_color(
    context: &AppContext,
    segmentation: &Segmentation,
    segment_index: u16,
) -> Rgba {
    let service = context.segmentation_service();
    service
        .representations_for_segmentation(&segmentation.segmentation_id)
        .first()
        .and_then(|representation| {
            service.segment_color(
                &representation.viewport_id,
                &segmentation.segmentation_id,
                segment_index,
            )
        })
        .or_else(|| {
            segmentation
                .segment(segment_index)
                .and_then(|segment| segment.color)
        })
        .unwrap_or_else(|| default_segment_color(segment_index))
}

pub(crate) fn display_colors(
    context: &AppContext,
    segmentation: &Segmentation,
    present: &BTreeSet<u16>,
) -> BTreeMap<u16, Rgba> {
    segmentation
        .segments
        .keys()
        .chain(present.iter())
        .map(|index| (*index, display_color(context, segmentation, *index)))
        .collect()
}

/// Metadata for every registered segment and for any value painted on the
/// label map without a registered segment.
pub(crate) fn segment_metadata(
    context: &AppContext,
    segmentation: &Segmentation,
    present: &BTreeSet<u16>,
    algorithm_name: &str,
) -> BTreeMap<u16, SegmentMetadata> {
    let mut metadata = segmentation
        .segments
        .values()
        .map(|segment| {
            let color = display_color(context, segmentation, segment.segment_index);
            (
                segment.segment_index,
                SegmentMetadata::describe(segment, color, algorithm_name),
            )
        })
        .collect::<BTreeMap<_, _>>();
    for index in present {
        if metadata.contains_key(index) {
            continue;
        }
        log::warn!(
            "segmentation `{}` paints unregistered segment {}; using default metadata",
            segmentation.segmentation_id,
            index
        );
        let segment = Segment::new(*index, format!("Segment {index}"));
        let color = display_color(context, segmentation, *index);
        metadata.insert(*index, SegmentMetadata::describe(&segment, color, algorithm_name));
    }
    metadata
}

pub(crate) fn fetch_segmentation(
    context: &AppContext,
    segmentation_id: &str,
) -> Result<Arc<Segmentation>> {
    context
        .segmentation_service()
        .segmentation(segmentation_id)
        .ok_or_else(|| CommandError::SegmentationNotFound(segmentation_id.to_string()))
}

fn referenced_images<'a>(
    segmentation: &Segmentation,
    display_set: &'a DisplaySet,
) -> Result<Vec<&'a ReferencedImage>> {
    segmentation
        .labelmap
        .slices()
        .iter()
        .map(|slice| {
            display_set.image(&slice.referenced_image_id).ok_or_else(|| {
                CommandError::ReferencedImageNotFound {
                    segmentation_id: segmentation.segmentation_id.clone(),
                    image_id: slice.referenced_image_id.clone(),
                }
            })
        })
        .collect()
}

/// Summarises the segmentation's label map, attaches segment metadata and
/// encodes a DICOM Segmentation.
pub fn generate_segmentation(
    context: &AppContext,
    segmentation_id: &str,
    options: &GenerationOptions,
) -> Result<GeneratedSegmentation> {
    let segmentation = fetch_segmentation(context, segmentation_id)?;
    let display_set = display_set(context, &segmentation.referenced_display_set_uid)?;
    let images = referenced_images(&segmentation, &display_set)?;

    let defaults = &context.config().generation;
    let algorithm_name = options
        .algorithm_name
        .as_deref()
        .unwrap_or(&defaults.algorithm_name);
    let mut labelmap = summarize_labelmap(&segmentation.labelmap);
    labelmap.metadata = segment_metadata(
        context,
        &segmentation,
        &labelmap.segments_on_labelmap,
        algorithm_name,
    );
    log::debug!(
        "segmentation `{}`: {} slices, segments {:?}",
        segmentation_id,
        labelmap.labelmaps_2d.len(),
        labelmap.segments_on_labelmap
    );

    let dataset = encode_segmentation(
        &display_set,
        &images,
        &labelmap,
        &options.encoding(defaults),
    )?;
    Ok(GeneratedSegmentation {
        segmentation_id: segmentation_id.to_string(),
        segments_on_labelmap: labelmap.segments_on_labelmap.clone(),
        metadata: labelmap.metadata.values().cloned().collect(),
        dataset,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct GenerateSegmentationCommand;

impl Command for GenerateSegmentationCommand {
    fn name(&self) -> &'static str {
        "segmentation.generate"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Encode a segmentation's label map as a DICOM SEG instance.".to_string(),
            params: vec![
                ParamSpec::new("segmentationId", "string", true, "Segmentation to encode."),
                ParamSpec::new(
                    "options",
                    "object",
                    false,
                    "Series description, series/instance number, manufacturer, content label.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentation_id = get_required_str(params, "segmentationId")?;
        let options =
            get_optional_typed::<GenerationOptions>(params, "options")?.unwrap_or_default();
        let generated = generate_segmentation(context, segmentation_id, &options)?;
        Ok(CommandOutput::payload_only(json!({
            "segmentationId": generated.segmentation_id,
            "sopInstanceUid": generated.dataset.sop_instance_uid(),
            "seriesInstanceUid": generated.dataset.series_instance_uid(),
            "seriesDescription": generated.dataset.series_description(),
            "segmentsOnLabelmap": generated.segments_on_labelmap,
            "segments": serde_json::to_value(&generated.metadata)?,
        })))
    }
}
