use serde_json::{Value, json};

use crate::model::SegmentationDescriptor;
use crate::runtime::AppContext;

use super::params::{get_optional_str, get_optional_typed};
use super::viewport::{display_set, resolve_viewport};
use super::{Command, CommandError, CommandOutput, CommandSchema, ParamSpec, Result};

/// Creates an empty label map on the viewport's display set for each
/// descriptor, registers it and attaches it to the viewport. Returns the
/// registered ids in descriptor order.
pub fn load_segmentations_for_viewport(
    context: &AppContext,
    segmentations: &[SegmentationDescriptor],
    viewport_id: Option<&str>,
) -> Result<Vec<String>> {
    if segmentations.is_empty() {
        return Err(CommandError::InvalidParams(
            "at least one segmentation descriptor is required".to_string(),
        ));
    }
    let viewport = resolve_viewport(context, viewport_id)?;
    let display_set_uid = viewport
        .primary_display_set()
        .ok_or_else(|| CommandError::EmptyViewport(viewport.viewport_id.clone()))?;
    let display_set = display_set(context, display_set_uid)?;

    let service = context.segmentation_service();
    let mut segmentation_ids = Vec::with_capacity(segmentations.len());
    for descriptor in segmentations {
        let segmentation = service.create_labelmap_for_display_set(&display_set, descriptor)?;
        let segmentation_id = segmentation.segmentation_id.clone();
        service.add_or_update_segmentation(segmentation);
        service.add_segmentation_representation(&viewport.viewport_id, &segmentation_id)?;
        segmentation_ids.push(segmentation_id);
    }
    log::info!(
        "loaded {} segmentation(s) into viewport `{}`",
        segmentation_ids.len(),
        viewport.viewport_id
    );
    Ok(segmentation_ids)
}

#[derive(Debug, Clone, Copy)]
pub struct LoadSegmentationsCommand;

impl Command for LoadSegmentationsCommand {
    fn name(&self) -> &'static str {
        "segmentation.load"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Create label maps for a viewport's display set and attach them."
                .to_string(),
            params: vec![
                ParamSpec::new(
                    "segmentations",
                    "list",
                    true,
                    "Descriptors with `label`, `segments` and an optional `segmentationId`.",
                ),
                ParamSpec::new(
                    "viewportId",
                    "string",
                    false,
                    "Target viewport; the active viewport when omitted.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentations = get_optional_typed::<Vec<SegmentationDescriptor>>(
            params,
            "segmentations",
        )?
        .ok_or_else(|| {
            CommandError::InvalidParams("missing list parameter `segmentations`".to_string())
        })?;
        let segmentation_ids = load_segmentations_for_viewport(
            context,
            &segmentations,
            get_optional_str(params, "viewportId"),
        )?;
        Ok(CommandOutput::payload_only(
            json!({ "segmentationIds": segmentation_ids }),
        ))
    }
}
