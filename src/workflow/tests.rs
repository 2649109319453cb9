use std::fs;

use ndarray::Array3;
use serde_json::json;
use tempfile::tempdir;

use super::{
    CommandInvocation, SessionSpec, build_context, load_session, run_session, save_report,
    summarize_segmentations,
};
use crate::config::ViewerConfig;
use crate::formats::write_labelmap_stack;

const SESSION: &str = r#"
name: liver-review
config:
  output_dir: downloads
  data_sources:
    - name: disk
      kind: local
      directory: store
display_sets:
  - display_set_instance_uid: ds-1
    study_instance_uid: "1.2.3"
    series_instance_uid: "1.2.3.4"
    modality: CT
    sop_class_uid: "1.2.840.10008.5.1.4.1.1.2"
    frame_of_reference_uid: "1.2.3.9"
    patient_id: P-1
    patient_name: Doe^Jane
    images:
      - sop_instance_uid: "1.2.3.4.1"
        rows: 3
        columns: 3
        image_position_patient: [0.0, 0.0, 0.0]
        image_orientation_patient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        pixel_spacing: [1.0, 1.0]
        slice_thickness: 2.0
      - sop_instance_uid: "1.2.3.4.2"
        rows: 3
        columns: 3
        image_position_patient: [0.0, 0.0, 2.0]
        image_orientation_patient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        pixel_spacing: [1.0, 1.0]
        slice_thickness: 2.0
viewports:
  - viewport_id: vp-1
    display_set_instance_uids: [ds-1]
    element: { width: 32, height: 32 }
tool_groups:
  - id: default
    tools:
      CircularBrush: { brush_size: 10.0 }
      ThresholdCircularBrush: { brush_size: 10.0, threshold_range: [0.0, 50.0] }
segmentations:
  - segmentation_id: seg-1
    label: Liver
    labelmap: liver.tif
    segments:
      - segmentIndex: 1
        label: Liver
    colors:
      1: [0, 255, 0, 255]
prompt:
  action: save
  value: Liver report
steps:
  - command: segmentation.generate
    params: { segmentationId: seg-1 }
  - command: segmentation.download_dicom
    params: { segmentationId: seg-1 }
  - command: segmentation.download_pdf
    params: { segmentationId: seg-1 }
  - command: segmentation.download_rtss
    params: { segmentationIds: [seg-1] }
  - command: segmentation.store
    params: { segmentationId: seg-1 }
  - command: tools.set_brush_size
    params: { value: 4.0 }
"#;

#[test]
fn session_runs_every_step() {
    let directory = tempdir().expect("tempdir");
    let mut labelmap = Array3::<u16>::zeros((2, 3, 3));
    labelmap[[0, 1, 1]] = 1;
    labelmap[[1, 0, 0]] = 1;
    write_labelmap_stack(directory.path().join("liver.tif"), &labelmap).expect("labelmap");
    let session_path = directory.path().join("session.yaml");
    fs::write(&session_path, SESSION).expect("session");

    let spec = load_session(&session_path).expect("load");
    assert_eq!(
        spec.segmentations[0].labelmap.as_deref(),
        Some(directory.path().join("liver.tif").as_path())
    );
    let config = spec.config.clone().expect("config");
    let context = build_context(&spec, config).expect("context");
    let report = run_session(&spec, &context).expect("run");

    assert_eq!(report.session_name.as_deref(), Some("liver-review"));
    assert_eq!(report.steps.len(), 6);
    assert_eq!(report.steps[0].payload["segmentsOnLabelmap"], json!([1]));
    assert!(report.steps[1].artifacts[0].ends_with("Liver.dcm"));
    assert!(report.steps[2].artifacts[0].exists());
    assert!(report.steps[3].payload["url"].is_string());
    assert_eq!(report.steps[4].payload["stored"], json!(true));
    assert_eq!(
        report.steps[4].payload["seriesDescription"],
        json!("Liver report")
    );
    assert_eq!(report.steps[5].payload["updated"], json!(2));

    let summary = &report.segmentations[0];
    assert_eq!(summary.segments_on_labelmap, vec![1]);
    assert_eq!(summary.segments_per_slice, vec![vec![1], vec![1]]);
    assert_eq!(
        context
            .segmentation_service()
            .segment_color("vp-1", "seg-1", 1),
        Some([0, 255, 0, 255])
    );

    let report_path = directory.path().join("report.json");
    save_report(&report_path, &report).expect("report");
    assert!(fs::read_to_string(report_path).expect("read").contains("liver-review"));
}

#[test]
fn session_without_labelmap_summarizes_empty() {
    let directory = tempdir().expect("tempdir");
    let session_path = directory.path().join("session.yaml");
    fs::write(&session_path, SESSION.replace("    labelmap: liver.tif\n", "")).expect("session");
    let mut spec = load_session(&session_path).expect("load");
    spec.steps.clear();

    let context = build_context(&spec, ViewerConfig::default()).expect("context");
    let summaries = summarize_segmentations(&context);
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].segments_on_labelmap.is_empty());
    assert_eq!(summaries[0].segments_per_slice, vec![Vec::<u16>::new(); 2]);
}

#[test]
fn failing_step_stops_session() {
    let directory = tempdir().expect("tempdir");
    let session_path = directory.path().join("session.yaml");
    fs::write(&session_path, SESSION).expect("session");
    let mut spec = load_session(&session_path).expect("load");
    spec.segmentations.clear();
    spec.steps = vec![CommandInvocation {
        command: "segmentation.download_dicom".into(),
        params: json!({"segmentationId": "seg-1"}),
    }];
    let context = build_context(&spec, ViewerConfig::default()).expect("context");
    let error = run_session(&spec, &context).expect_err("unknown segmentation");
    assert!(error.to_string().contains("seg-1"));
}

#[test]
fn invalid_sessions_are_rejected() {
    let spec = SessionSpec {
        viewports: vec![crate::model::Viewport::new("vp-1", "ds-missing")],
        ..SessionSpec::default()
    };
    assert!(spec.validate().is_err());

    let spec = SessionSpec {
        steps: vec![CommandInvocation {
            command: "segmentation.generate".into(),
            params: json!([1, 2]),
        }],
        ..SessionSpec::default()
    };
    assert!(spec.validate().is_err());

    let spec = SessionSpec {
        active_viewport: Some("vp-1".into()),
        ..SessionSpec::default()
    };
    assert!(spec.validate().is_err());
}
