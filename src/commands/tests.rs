use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array3, array};
use serde_json::json;
use tempfile::tempdir;

use super::{
    CommandError, DEFAULT_THRESHOLD_TOOLS, GenerationOptions, download_pdf, download_rtss,
    download_segmentation, execute_command, generate_segmentation, list_commands,
    load_segmentations_for_viewport, resolve_viewport, set_brush_size, set_threshold_range,
    store_segmentation,
};
use crate::config::{DataSourceKind, DataSourceSettings, ViewerConfig};
use crate::formats::{FormatError, GeneratedDataset, NO_SEGMENT_METADATA};
use crate::model::{
    CoreError, DisplaySet, LabelmapSlice, LabelmapVolume, ReferencedImage, Segment,
    SegmentationDescriptor, ToolConfiguration, ToolGroup, Viewport, ViewportElement,
    rgb_to_dicom_lab,
};
use crate::runtime::{
    AppContext, DataSource, DataSourceConfig, DownloadSink, InMemoryMetadataStore, MetadataStore,
    PromptResult, ScriptedPrompt, ServiceError,
};

fn image(uid: &str, z: f64) -> ReferencedImage {
    ReferencedImage {
        sop_instance_uid: uid.to_string(),
        rows: 4,
        columns: 4,
        image_position_patient: [0.0, 0.0, z],
        image_orientation_patient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        pixel_spacing: [0.5, 0.5],
        slice_thickness: Some(1.0),
    }
}

fn display_set() -> DisplaySet {
    DisplaySet {
        display_set_instance_uid: "ds-1".into(),
        study_instance_uid: "1.2.3".into(),
        series_instance_uid: "1.2.3.4".into(),
        modality: "CT".into(),
        sop_class_uid: "1.2.840.10008.5.1.4.1.1.2".into(),
        frame_of_reference_uid: "1.2.3.9".into(),
        patient_id: "P-1".into(),
        patient_name: "Doe^Jane".into(),
        images: vec![image("1.2.3.4.1", 0.0), image("1.2.3.4.2", 1.0)],
        pixels: Some(Array3::from_shape_fn((2, 4, 4), |(_, row, column)| {
            (row * 4 + column) as f32
        })),
        ..DisplaySet::default()
    }
}

fn descriptor() -> SegmentationDescriptor {
    SegmentationDescriptor {
        segmentation_id: Some("seg-1".into()),
        label: "Liver".into(),
        segments: vec![Segment::new(1, "Liver"), Segment::new(2, "Tumor")],
    }
}

fn context(root: &Path) -> AppContext {
    let config = ViewerConfig {
        output_dir: root.join("downloads"),
        data_sources: vec![DataSourceSettings {
            name: "disk".into(),
            kind: DataSourceKind::Local {
                directory: root.join("store"),
            },
        }],
        ..ViewerConfig::default()
    };
    let context = AppContext::new(config);
    context.display_set_service().add_display_set(display_set());
    context.viewport_grid_service().set_viewport(Viewport {
        element: Some(ViewportElement {
            width: 64,
            height: 64,
        }),
        ..Viewport::new("vp-1", "ds-1")
    });
    context
}

fn load(context: &AppContext) -> String {
    load_segmentations_for_viewport(context, &[descriptor()], None)
        .expect("load")
        .remove(0)
}

fn paint(context: &AppContext, segmentation_id: &str) {
    let labelmap = LabelmapVolume::new(vec![
        LabelmapSlice {
            referenced_image_id: "1.2.3.4.1".into(),
            pixel_data: array![[1, 1, 0, 0], [1, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 3]],
        },
        LabelmapSlice {
            referenced_image_id: "1.2.3.4.2".into(),
            pixel_data: array![[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]],
        },
    ])
    .expect("labelmap");
    context
        .segmentation_service()
        .set_labelmap(segmentation_id, labelmap)
        .expect("paint");
}

fn files_in(directory: &Path) -> Vec<PathBuf> {
    let mut files = fs::read_dir(directory)
        .expect("read dir")
        .map(|entry| entry.expect("entry").path())
        .collect::<Vec<_>>();
    files.sort();
    files
}

struct FailingSink;

impl DownloadSink for FailingSink {
    fn save(
        &self,
        _file_name: &str,
        _mime_type: &str,
        _bytes: &[u8],
    ) -> crate::runtime::Result<PathBuf> {
        Err(ServiceError::Store("disk full".into()))
    }

    fn open_blob(&self, _mime_type: &str, _bytes: &[u8]) -> crate::runtime::Result<String> {
        Err(ServiceError::Store("disk full".into()))
    }
}

struct RejectingSource;

impl DataSource for RejectingSource {
    fn config(&self) -> DataSourceConfig {
        DataSourceConfig {
            name: "archive".into(),
            wado_root: Some("http://archive.invalid/dicom-web".into()),
        }
    }

    fn store_dicom(&self, _dataset: &GeneratedDataset) -> crate::runtime::Result<()> {
        Err(ServiceError::Store("HTTP 503".into()))
    }
}

#[test]
fn registry_lists_every_command() {
    let names = list_commands()
        .into_iter()
        .map(|schema| schema.name)
        .collect::<Vec<_>>();
    for expected in [
        "segmentation.load",
        "segmentation.generate",
        "segmentation.download_dicom",
        "segmentation.download_pdf",
        "segmentation.download_rtss",
        "segmentation.store",
        "tools.set_brush_size",
        "tools.set_threshold_range",
    ] {
        assert!(names.contains(&expected.to_string()), "{expected} missing");
    }
}

#[test]
fn unknown_command_is_rejected() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let error =
        execute_command(&context, "segmentation.explode", &json!({})).expect_err("unknown");
    assert!(matches!(error, CommandError::UnknownCommand(_)));
}

#[test]
fn load_registers_and_attaches_segmentations() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let output = execute_command(
        &context,
        "segmentation.load",
        &json!({
            "segmentations": [{
                "label": "Kidneys",
                "segments": [{"segmentIndex": 1, "label": "Left"}]
            }],
            "viewportId": "vp-1"
        }),
    )
    .expect("load");
    let segmentation_id = output.payload["segmentationIds"][0]
        .as_str()
        .expect("id")
        .to_string();
    let segmentation = context
        .segmentation_service()
        .segmentation(&segmentation_id)
        .expect("registered");
    assert_eq!(segmentation.label, "Kidneys");
    assert_eq!(segmentation.labelmap.len(), 2);
    assert_eq!(
        context
            .segmentation_service()
            .representations_for_viewport("vp-1")
            .len(),
        1
    );
}

#[test]
fn load_fails_for_unresolved_viewport() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let error = load_segmentations_for_viewport(&context, &[descriptor()], Some("vp-9"))
        .expect_err("unknown viewport");
    assert!(matches!(error, CommandError::ViewportNotFound(_)));

    let empty = AppContext::default();
    let error = resolve_viewport(&empty, None).expect_err("no active viewport");
    assert!(matches!(error, CommandError::NoActiveViewport));

    let error = load_segmentations_for_viewport(&context, &[], None).expect_err("no descriptors");
    assert!(matches!(error, CommandError::InvalidParams(_)));
}

#[test]
fn generate_describes_registered_and_painted_segments() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let generated = generate_segmentation(&context, &segmentation_id, &GenerationOptions::default())
        .expect("generate");
    assert_eq!(
        generated.segments_on_labelmap.iter().copied().collect::<Vec<_>>(),
        vec![1, 3]
    );
    let labels = generated
        .metadata
        .iter()
        .map(|metadata| metadata.segment_label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["Liver", "Tumor", "Segment 3"]);
    assert!(
        generated
            .metadata
            .iter()
            .all(|metadata| metadata.segment_algorithm_name == "dicomseg-rs Brush")
    );
    assert_eq!(generated.dataset.modality().as_deref(), Some("SEG"));
}

#[test]
fn generate_uses_viewport_color_override() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);
    context
        .segmentation_service()
        .set_segment_color("vp-1", &segmentation_id, 1, [255, 255, 255, 255])
        .expect("color");

    let generated = generate_segmentation(
        &context,
        &segmentation_id,
        &GenerationOptions::default().with_series_description("Override"),
    )
    .expect("generate");
    let expected = rgb_to_dicom_lab([1.0, 1.0, 1.0]).map(|value| value.round() as u16);
    assert_eq!(generated.metadata[0].recommended_display_cielab_value, expected);
    assert_eq!(
        generated.dataset.series_description().as_deref(),
        Some("Override")
    );
}

#[test]
fn generate_fails_for_unknown_or_empty_segmentation() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let error = generate_segmentation(&context, "missing", &GenerationOptions::default())
        .expect_err("unknown");
    assert!(matches!(error, CommandError::SegmentationNotFound(_)));

    let segmentation_id = load(&context);
    let error = generate_segmentation(&context, &segmentation_id, &GenerationOptions::default())
        .expect_err("empty");
    assert!(matches!(
        error,
        CommandError::Format(FormatError::EmptySegmentation)
    ));
}

#[test]
fn download_dicom_saves_label_named_file() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let path = download_segmentation(&context, &segmentation_id).expect("download");
    assert_eq!(path, directory.path().join("downloads").join("Liver.dcm"));
    let bytes = fs::read(&path).expect("read");
    assert_eq!(&bytes[128..132], b"DICM");

    let error = download_segmentation(&context, "missing").expect_err("unknown");
    assert!(matches!(error, CommandError::SegmentationNotFound(_)));
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Builtin-font text is written as an uppercase hex string operand.
fn pdf_hex_string(text: &str) -> String {
    let hex = text.bytes().map(|byte| format!("{byte:02X}")).collect::<String>();
    format!("<{hex}>")
}

#[test]
fn pdf_export_survives_failed_generation() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);

    let export = download_pdf(&context, &segmentation_id, None).expect("pdf");
    assert_eq!(export.lines, vec![NO_SEGMENT_METADATA.to_string()]);
    assert_eq!(
        export.path,
        directory.path().join("downloads").join("Liver_report.pdf")
    );
    let bytes = fs::read(&export.path).expect("read");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(contains(&bytes, b"/XObject"));
    assert!(contains(&bytes, b"/Image"));
    assert!(contains(&bytes, pdf_hex_string(NO_SEGMENT_METADATA).as_bytes()));
}

#[test]
fn pdf_export_lists_segments() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let output = execute_command(
        &context,
        "segmentation.download_pdf",
        &json!({"segmentationId": segmentation_id}),
    )
    .expect("pdf");
    let lines = output.payload["lines"].as_array().expect("lines");
    assert!(
        lines
            .iter()
            .any(|line| line.as_str() == Some("Segment 2: Tumor"))
    );
    assert_eq!(output.artifacts.len(), 1);
}

#[test]
fn pdf_export_aborts_without_capture() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    context
        .viewport_grid_service()
        .set_viewport(Viewport::new("vp-2", "ds-1"));

    let error = download_pdf(&context, &segmentation_id, Some("vp-2")).expect_err("no element");
    assert!(matches!(
        error,
        CommandError::Service(ServiceError::ElementNotFound(_))
    ));
    let error = download_pdf(&context, &segmentation_id, Some("vp-3")).expect_err("no viewport");
    assert!(matches!(error, CommandError::ViewportNotFound(_)));
}

#[test]
fn rtss_download_opens_blob() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path());
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let url = download_rtss(&context, &[segmentation_id.clone()])
        .expect("rtss")
        .expect("url");
    assert!(url.starts_with("file://"));
    assert_eq!(files_in(&directory.path().join("downloads")).len(), 1);

    let error = download_rtss(&context, &[segmentation_id, "missing".into()])
        .expect_err("unknown");
    assert!(matches!(error, CommandError::SegmentationNotFound(_)));
}

#[test]
fn rtss_publish_failure_returns_no_url() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path()).with_downloads(Arc::new(FailingSink));
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let url = download_rtss(&context, &[segmentation_id]).expect("rtss");
    assert!(url.is_none());
}

#[test]
fn store_records_instance_with_wado_root() {
    let directory = tempdir().expect("tempdir");
    let metadata_store = Arc::new(InMemoryMetadataStore::new());
    let context = context(directory.path())
        .with_metadata_store(metadata_store.clone())
        .with_report_prompt(Arc::new(ScriptedPrompt::new(PromptResult::save(Some(
            "Liver report".into(),
        )))));
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let stored = store_segmentation(&context, &segmentation_id, None)
        .expect("store")
        .expect("saved");
    let expected_root = format!("file://{}", directory.path().join("store").display());
    assert_eq!(stored.wado_root.as_deref(), Some(expected_root.as_str()));
    assert_eq!(
        stored.dataset.series_description().as_deref(),
        Some("Liver report")
    );

    let instances = metadata_store.instances();
    assert_eq!(instances.len(), 1);
    assert!(instances[0].made_in_client);
    assert_eq!(instances[0].wado_root.as_deref(), Some(expected_root.as_str()));
    assert_eq!(instances[0].sop_instance_uid, stored.dataset.sop_instance_uid().expect("uid"));
}

#[test]
fn store_is_skipped_when_prompt_is_cancelled() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path())
        .with_report_prompt(Arc::new(ScriptedPrompt::new(PromptResult::cancel())));
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let stored = store_segmentation(&context, &segmentation_id, None).expect("store");
    assert!(stored.is_none());
    assert!(context.metadata_store().instances().is_empty());
}

#[test]
fn store_propagates_data_source_errors() {
    let directory = tempdir().expect("tempdir");
    let context = context(directory.path()).with_data_source(Arc::new(RejectingSource));
    let segmentation_id = load(&context);
    paint(&context, &segmentation_id);

    let error = store_segmentation(&context, &segmentation_id, Some("archive"))
        .expect_err("rejected");
    assert!(matches!(
        error,
        CommandError::Service(ServiceError::Store(_))
    ));
    assert!(context.metadata_store().instances().is_empty());

    let error = store_segmentation(&context, "missing", None).expect_err("unknown");
    assert!(matches!(error, CommandError::SegmentationNotFound(_)));
}

#[test]
fn tool_actions_are_noops_without_tool_groups() {
    let context = AppContext::default();
    assert_eq!(set_brush_size(&context, 5.0, None).expect("brush"), 0);
    assert_eq!(
        set_threshold_range(&context, [0.0, 10.0], None).expect("range"),
        0
    );
}

#[test]
fn tool_actions_update_every_group() {
    let context = AppContext::default();
    let brush = ToolConfiguration {
        brush_size: Some(25.0),
        threshold_range: None,
    };
    let threshold = ToolConfiguration {
        brush_size: Some(25.0),
        threshold_range: Some([0.0, 1.0]),
    };
    for id in ["default", "mpr"] {
        context.tool_group_service().add_tool_group(
            ToolGroup::new(id)
                .with_tool("CircularBrush", brush.clone())
                .with_tool(DEFAULT_THRESHOLD_TOOLS[0], threshold.clone()),
        );
    }

    let output = execute_command(
        &context,
        "tools.set_brush_size",
        &json!({"value": 12.0, "toolNames": ["CircularBrush"]}),
    )
    .expect("brush");
    assert_eq!(output.payload["updated"], 2);
    assert_eq!(set_brush_size(&context, 8.0, None).expect("brush"), 4);

    let output = execute_command(
        &context,
        "tools.set_threshold_range",
        &json!({"value": [-100.0, 300.0]}),
    )
    .expect("range");
    assert_eq!(output.payload["updated"], 2);
    let group = context.tool_group_service().tool_group("mpr").expect("group");
    assert_eq!(
        group.tools[DEFAULT_THRESHOLD_TOOLS[0]].threshold_range,
        Some([-100.0, 300.0])
    );
    assert_eq!(group.tools["CircularBrush"].brush_size, Some(8.0));

    let error = set_threshold_range(&context, [10.0, 0.0], None).expect_err("inverted");
    assert!(matches!(
        error,
        CommandError::Core(CoreError::InvalidThresholdRange { .. })
    ));
    let error = set_threshold_range(&context, [f32::NAN, 0.0], None).expect_err("nan");
    assert!(matches!(
        error,
        CommandError::Core(CoreError::InvalidThresholdRange { .. })
    ));
    let group = context.tool_group_service().tool_group("mpr").expect("group");
    assert_eq!(
        group.tools[DEFAULT_THRESHOLD_TOOLS[0]].threshold_range,
        Some([-100.0, 300.0])
    );
}
