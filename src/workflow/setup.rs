use std::sync::Arc;

use ndarray::Axis;

use crate::commands::load_segmentations_for_viewport;
use crate::config::ViewerConfig;
use crate::formats::{read_image_stack, read_labelmap_stack};
use crate::model::{LabelmapVolume, SegmentationDescriptor};
use crate::runtime::{AppContext, ScriptedPrompt, ServiceError};

use super::{Result, SessionError, SessionSpec};

/// Builds a context from `config` and replays the session's viewer state
/// into it: display sets, viewports, tool groups, then segmentations.
pub fn build_context(spec: &SessionSpec, config: ViewerConfig) -> Result<AppContext> {
    spec.validate()?;
    let mut context = AppContext::new(config);
    if let Some(answer) = &spec.prompt {
        context = context.with_report_prompt(Arc::new(ScriptedPrompt::new(answer.clone())));
    }

    for display_set_spec in &spec.display_sets {
        let mut display_set = display_set_spec.to_display_set();
        if let Some(path) = &display_set_spec.pixels {
            let pixels = read_image_stack(path)?;
            if pixels.len_of(Axis(0)) != display_set.images.len() {
                return Err(SessionError::Parse(format!(
                    "{} has {} pages but display set `{}` has {} images",
                    path.display(),
                    pixels.len_of(Axis(0)),
                    display_set.display_set_instance_uid,
                    display_set.images.len()
                )));
            }
            display_set.pixels = Some(pixels);
        }
        context.display_set_service().add_display_set(display_set);
    }

    let grid = context.viewport_grid_service();
    for viewport in &spec.viewports {
        grid.set_viewport(viewport.clone());
    }
    if let Some(active) = &spec.active_viewport {
        grid.set_active_viewport(active)?;
    }

    for tool_group in &spec.tool_groups {
        context.tool_group_service().add_tool_group(tool_group.clone());
    }

    for segmentation_spec in &spec.segmentations {
        let descriptor = SegmentationDescriptor {
            segmentation_id: segmentation_spec.segmentation_id.clone(),
            label: segmentation_spec.label.clone(),
            segments: segmentation_spec.segments.clone(),
        };
        let segmentation_id = load_segmentations_for_viewport(
            &context,
            std::slice::from_ref(&descriptor),
            segmentation_spec.viewport_id.as_deref(),
        )?
        .remove(0);
        let service = context.segmentation_service();
        let segmentation = service
            .segmentation(&segmentation_id)
            .ok_or_else(|| ServiceError::SegmentationNotFound(segmentation_id.clone()))?;

        if let Some(path) = &segmentation_spec.labelmap {
            let display_set = context
                .display_set_service()
                .display_set(&segmentation.referenced_display_set_uid)
                .ok_or_else(|| {
                    ServiceError::DisplaySetNotFound(
                        segmentation.referenced_display_set_uid.clone(),
                    )
                })?;
            let data = read_labelmap_stack(path)?;
            service.set_labelmap(
                &segmentation_id,
                LabelmapVolume::from_array(&display_set, &data)?,
            )?;
        }

        if !segmentation_spec.colors.is_empty() {
            for representation in service.representations_for_segmentation(&segmentation_id) {
                for (index, color) in &segmentation_spec.colors {
                    service.set_segment_color(
                        &representation.viewport_id,
                        &segmentation_id,
                        *index,
                        *color,
                    )?;
                }
            }
        }
    }
    Ok(context)
}
