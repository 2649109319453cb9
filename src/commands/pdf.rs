use std::path::PathBuf;

use serde_json::{Value, json};

use crate::formats::{PdfReport, render_pdf, report_lines};
use crate::runtime::AppContext;

use super::generate::generate_segmentation;
use super::params::{get_optional_str, get_required_str};
use super::viewport::resolve_viewport;
use super::{Command, CommandOutput, CommandSchema, GenerationOptions, ParamSpec, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PdfExport {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Captures the viewport and saves it with the segment metadata as a
/// one-page PDF. A failure to generate metadata only empties the text block;
/// viewport and capture failures abort.
pub fn download_pdf(
    context: &AppContext,
    segmentation_id: &str,
    viewport_id: Option<&str>,
) -> Result<PdfExport> {
    let viewport = resolve_viewport(context, viewport_id)?;
    let capture = context.screen_capture().capture(&viewport)?;

    let metadata =
        match generate_segmentation(context, segmentation_id, &GenerationOptions::default()) {
            Ok(generated) => generated.metadata,
            Err(error) => {
                log::warn!(
                    "no segment metadata for `{segmentation_id}`, exporting without it: {error}"
                );
                Vec::new()
            }
        };

    let lines = report_lines(&metadata);
    let report = PdfReport {
        title: context.config().pdf.title.clone(),
        capture,
        lines: lines.clone(),
    };
    let bytes = render_pdf(&report)?;

    let label = context
        .segmentation_service()
        .segmentation(segmentation_id)
        .map(|segmentation| segmentation.label.clone())
        .unwrap_or_else(|| segmentation_id.to_string());
    let path = context
        .downloads()
        .save(&format!("{label}_report.pdf"), "application/pdf", &bytes)?;
    log::info!("exported report for `{}` to {}", segmentation_id, path.display());
    Ok(PdfExport { path, lines })
}

#[derive(Debug, Clone, Copy)]
pub struct DownloadPdfCommand;

impl Command for DownloadPdfCommand {
    fn name(&self) -> &'static str {
        "segmentation.download_pdf"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Export a viewport capture plus segment metadata as a PDF report."
                .to_string(),
            params: vec![
                ParamSpec::new("segmentationId", "string", true, "Segmentation to describe."),
                ParamSpec::new(
                    "viewportId",
                    "string",
                    false,
                    "Viewport to capture; the active viewport when omitted.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let segmentation_id = get_required_str(params, "segmentationId")?;
        let export = download_pdf(
            context,
            segmentation_id,
            get_optional_str(params, "viewportId"),
        )?;
        Ok(
            CommandOutput::payload_only(json!({ "path": export.path, "lines": export.lines }))
                .with_artifact(export.path),
        )
    }
}
