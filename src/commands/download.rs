use std::path::PathBuf;

use serde_json::{Value, json};

use crate::formats::{RtssOptions, RtssSource, encode_rt_structure_set};
use crate::model::summarize_labelmap;
use crate::runtime::{AppContext, ServiceError};

use super::generate::{display_colors, fetch_segmentation, generate_segmentation};
use super::params::{get_optional_strings, get_required_str};
use super::viewport::display_set;
use super::{
    Command, CommandError, CommandOutput, CommandSchema, GenerationOptions, ParamSpec, Result,
};

const DICOM_MIME: &str = "application/dicom";

/// Generates the segmentation's SEG instance and saves it as `<label>.dcm`.
pub fn download_segmentation(context: &AppContext, segmentation_id: &str) -> Result<PathBuf> {
    let segmentation = fetch_segmentation(context, segmentation_id)?;
    let generated = generate_segmentation(context, segmentation_id, &GenerationOptions::default())?;
    let bytes = generated.dataset.to_bytes()?;
    let path = context
        .downloads()
        .save(&format!("{}.dcm", segmentation.label), DICOM_MIME, &bytes)?;
    log::info!(
        "downloaded segmentation `{}` to {}",
        segmentation_id,
        path.display()
    );
    Ok(path)
}

/// Converts the segmentations into one RT Structure Set and opens it as a
/// blob. Returns `None` when the result could not be serialised or handed
/// to the download sink.
pub fn download_rtss(context: &AppContext, segmentation_ids: &[String]) -> Result<Option<String>> {
    if segmentation_ids.is_empty() {
        return Err(CommandError::InvalidParams(
            "at least one segmentation id is required".to_string(),
        ));
    }
    let segmentations = segmentation_ids
        .iter()
        .map(|segmentation_id| fetch_segmentation(context, segmentation_id))
        .collect::<Result<Vec<_>>>()?;
    let display_sets = segmentations
        .iter()
        .map(|segmentation| display_set(context, &segmentation.referenced_display_set_uid))
        .collect::<Result<Vec<_>>>()?;
    let sources = segmentations
        .iter()
        .zip(&display_sets)
        .map(|(segmentation, display_set)| {
            let present = summarize_labelmap(&segmentation.labelmap).segments_on_labelmap;
            RtssSource {
                segmentation,
                display_set,
                colors: display_colors(context, segmentation, &present),
            }
        })
        .collect::<Vec<_>>();

    let defaults = &context.config().generation;
    let options = RtssOptions {
        series_number: defaults.rtss_series_number,
        manufacturer: defaults.manufacturer.clone(),
        ..RtssOptions::default()
    };
    let dataset = encode_rt_structure_set(&sources, &options)?;

    let published = dataset
        .to_bytes()
        .map_err(ServiceError::from)
        .and_then(|bytes| context.downloads().open_blob(DICOM_MIME, &bytes));
    match published {
        Ok(url) => {
            log::info!("RT structure set available at {url}");
            Ok(Some(url))
        }
        Err(error) => {
            log::warn!("could not publish RT structure set: {error}");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadSegmentationCommand;

impl Command for DownloadSegmentationCommand {
    fn name(&self) -> &'static str {
        "segmentation.download_dicom"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Save a segmentation as a DICOM SEG file named after its label."
                .to_string(),
            params: vec![ParamSpec::new(
                "segmentationId",
                "string",
                true,
                "Segmentation to export.",
            )],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentation_id = get_required_str(params, "segmentationId")?;
        let path = download_segmentation(context, segmentation_id)?;
        Ok(CommandOutput::payload_only(json!({ "path": path })).with_artifact(path))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadRtssCommand;

impl Command for DownloadRtssCommand {
    fn name(&self) -> &'static str {
        "segmentation.download_rtss"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Convert segmentations to a DICOM RT Structure Set and open it."
                .to_string(),
            params: vec![
                ParamSpec::new(
                    "segmentationIds",
                    "list",
                    false,
                    "Segmentations to convert into one structure set.",
                ),
                ParamSpec::new(
                    "segmentationId",
                    "string",
                    false,
                    "Single segmentation, when `segmentationIds` is absent.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentation_ids = match get_optional_strings(params, "segmentationIds")? {
            Some(ids) => ids,
            None => vec![get_required_str(params, "segmentationId")?.to_string()],
        };
        let url = download_rtss(context, &segmentation_ids)?;
        let mut output = CommandOutput::payload_only(json!({ "url": url }));
        if let Some(path) = url.as_deref().and_then(|url| url.strip_prefix("file://")) {
            output = output.with_artifact(PathBuf::from(path));
        }
        Ok(output)
    }
}
