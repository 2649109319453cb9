use serde_json::{Value, json};

use crate::formats::GeneratedDataset;
use crate::runtime::{AppContext, InstanceRecord, PromptRequest};

use super::generate::{fetch_segmentation, generate_segmentation};
use super::params::{get_optional_str, get_required_str};
use super::{Command, CommandOutput, CommandSchema, GenerationOptions, ParamSpec, Result};

const DEFAULT_SERIES_DESCRIPTION: &str = "Research Derived Series";

/// A stored SEG instance together with the root it can be retrieved from.
#[derive(Debug, Clone)]
pub struct StoredSegmentation {
    pub dataset: GeneratedDataset,
    pub wado_root: Option<String>,
    pub data_source: String,
}

/// Prompts for a report name and destination, then stores the generated SEG
/// through that data source and records it in the metadata store. Returns
/// `None` when the prompt is dismissed.
pub fn store_segmentation(
    context: &AppContext,
    segmentation_id: &str,
    data_source_name: Option<&str>,
) -> Result<Option<StoredSegmentation>> {
    let label = context
        .segmentation_service()
        .segmentation(segmentation_id)
        .map(|segmentation| segmentation.label.clone())
        .filter(|label| !label.is_empty());
    let answer = context.report_prompt().prompt(&PromptRequest {
        title: "Enter report name".to_string(),
        default_value: label
            .clone()
            .unwrap_or_else(|| DEFAULT_SERIES_DESCRIPTION.to_string()),
        data_sources: context.data_source_names(),
    })?;
    if !answer.should_proceed() {
        log::info!("store of `{segmentation_id}` cancelled");
        return Ok(None);
    }

    let segmentation = fetch_segmentation(context, segmentation_id)?;
    let series_description = answer
        .value
        .clone()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| Some(segmentation.label.clone()).filter(|label| !label.is_empty()))
        .unwrap_or_else(|| DEFAULT_SERIES_DESCRIPTION.to_string());
    let generated = generate_segmentation(
        context,
        segmentation_id,
        &GenerationOptions::default().with_series_description(series_description),
    )?;

    let data_source =
        context.data_source(answer.data_source_name.as_deref().or(data_source_name))?;
    data_source.store_dicom(&generated.dataset)?;
    let config = data_source.config();

    let mut record = InstanceRecord::from_dataset(&generated.dataset);
    record.wado_root = config.wado_root.clone();
    context.metadata_store().add_instances(vec![record], true);
    log::info!(
        "stored segmentation `{}` through `{}`",
        segmentation_id,
        config.name
    );

    Ok(Some(StoredSegmentation {
        dataset: generated.dataset,
        wado_root: config.wado_root,
        data_source: config.name,
    }))
}

#[derive(Debug, Clone, Copy)]
pub struct StoreSegmentationCommand;

impl Command for StoreSegmentationCommand {
    fn name(&self) -> &'static str {
        "segmentation.store"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Store a segmentation as DICOM SEG through a data source.".to_string(),
            params: vec![
                ParamSpec::new("segmentationId", "string", true, "Segmentation to store."),
                ParamSpec::new(
                    "dataSource",
                    "string",
                    false,
                    "Data source name when the prompt does not choose one.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentation_id = get_required_str(params, "segmentationId")?;
        let stored = store_segmentation(
            context,
            segmentation_id,
            get_optional_str(params, "dataSource"),
        )?;
        let payload = match stored {
            Some(stored) => json!({
                "stored": true,
                "dataSource": stored.data_source,
                "wadoRoot": stored.wado_root,
                "studyInstanceUid": stored.dataset.study_instance_uid(),
                "seriesInstanceUid": stored.dataset.series_instance_uid(),
                "sopInstanceUid": stored.dataset.sop_instance_uid(),
                "seriesDescription": stored.dataset.series_description(),
            }),
            None => json!({ "stored": false }),
        };
        Ok(CommandOutput::payload_only(payload))
    }
}
