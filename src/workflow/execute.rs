use std::time::Instant;

use crate::model::summarize_labelmap;
use crate::runtime::AppContext;

use super::{Result, SegmentationSummary, SessionReport, SessionSpec, StepReport};

/// Label-map summary of every registered segmentation.
pub fn summarize_segmentations(context: &AppContext) -> Vec<SegmentationSummary> {
    context
        .segmentation_service()
        .segmentations()
        .iter()
        .map(|segmentation| {
            let summary = summarize_labelmap(&segmentation.labelmap);
            SegmentationSummary {
                segmentation_id: segmentation.segmentation_id.clone(),
                label: segmentation.label.clone(),
                referenced_display_set_uid: segmentation.referenced_display_set_uid.clone(),
                slices: summary.labelmaps_2d.len(),
                segments: segmentation.segments.keys().copied().collect(),
                segments_on_labelmap: summary.segments_on_labelmap.iter().copied().collect(),
                segments_per_slice: summary
                    .labelmaps_2d
                    .iter()
                    .map(|slice| slice.segments_on_labelmap.iter().copied().collect())
                    .collect(),
            }
        })
        .collect()
}

/// Runs the session's steps in order, stopping at the first failure.
pub fn run_session(spec: &SessionSpec, context: &AppContext) -> Result<SessionReport> {
    spec.validate()?;
    if spec.steps.is_empty() {
        log::warn!("session has no steps to run");
    }

    let mut steps = Vec::with_capacity(spec.steps.len());
    for invocation in &spec.steps {
        let started = Instant::now();
        let output = context.execute_command(&invocation.command, &invocation.params)?;
        let duration_ms = started.elapsed().as_millis();
        log::info!("{} finished in {} ms", invocation.command, duration_ms);
        steps.push(StepReport {
            command: invocation.command.clone(),
            duration_ms,
            payload: output.payload,
            artifacts: output.artifacts,
        });
    }

    Ok(SessionReport {
        session_name: spec.name.clone(),
        steps,
        segmentations: summarize_segmentations(context),
    })
}
