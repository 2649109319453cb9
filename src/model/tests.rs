use std::collections::BTreeSet;

use ndarray::{Array2, Array3, array};

use super::{
    DisplaySet, LabelmapSlice, LabelmapVolume, ReferencedImage, Segment, SegmentMetadata,
    Segmentation, TISSUE_CODE, ToolConfiguration, ToolGroup, default_segment_color,
    rgb_to_dicom_lab, summarize_labelmap,
};

fn image(uid: &str, z: f64) -> ReferencedImage {
    ReferencedImage {
        sop_instance_uid: uid.to_string(),
        rows: 3,
        columns: 3,
        image_position_patient: [0.0, 0.0, z],
        image_orientation_patient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        pixel_spacing: [0.5, 0.25],
        slice_thickness: Some(2.0),
    }
}

fn display_set() -> DisplaySet {
    DisplaySet {
        display_set_instance_uid: "ds-1".into(),
        images: vec![image("img-1", 0.0), image("img-2", 2.0)],
        ..DisplaySet::default()
    }
}

fn slice(uid: &str, data: Array2<u16>) -> LabelmapSlice {
    LabelmapSlice {
        referenced_image_id: uid.to_string(),
        pixel_data: data,
    }
}

#[test]
fn empty_labelmap_has_no_segments() {
    let volume = LabelmapVolume::empty_for(&display_set());
    let summary = summarize_labelmap(&volume);
    assert_eq!(summary.labelmaps_2d.len(), 2);
    assert!(summary.segments_on_labelmap.is_empty());
    assert!(
        summary
            .labelmaps_2d
            .iter()
            .all(|labelmap| labelmap.segments_on_labelmap.is_empty())
    );
}

#[test]
fn per_slice_sets_match_distinct_nonzero_values() {
    let volume = LabelmapVolume::new(vec![
        slice("img-1", array![[0, 1, 1], [0, 3, 0], [0, 0, 0]]),
        slice("img-2", array![[2, 2, 0], [0, 0, 0], [0, 0, 2]]),
    ])
    .expect("volume");
    let summary = summarize_labelmap(&volume);

    for (labelmap, source) in summary.labelmaps_2d.iter().zip(volume.slices()) {
        let expected = source
            .pixel_data
            .iter()
            .copied()
            .filter(|value| *value != 0)
            .collect::<BTreeSet<_>>();
        assert_eq!(labelmap.segments_on_labelmap, expected);
    }
    assert_eq!(
        summary.segments_on_labelmap,
        BTreeSet::from([1_u16, 2, 3])
    );
    assert_eq!(summary.slices_with_segment(2), vec![1]);
    assert_eq!(summary.slices_with_segment(1), vec![0]);
}

#[test]
fn labelmap_rejects_mismatched_slices() {
    let result = LabelmapVolume::new(vec![
        slice("img-1", Array2::zeros((3, 3))),
        slice("img-2", Array2::zeros((2, 3))),
    ]);
    assert!(result.is_err());
}

#[test]
fn labelmap_from_array_requires_one_slice_per_image() {
    let data = Array3::<u16>::zeros((3, 3, 3));
    assert!(LabelmapVolume::from_array(&display_set(), &data).is_err());

    let data = Array3::<u16>::zeros((2, 3, 3));
    let volume = LabelmapVolume::from_array(&display_set(), &data).expect("volume");
    assert_eq!(volume.slice(1).expect("slice").referenced_image_id, "img-2");
}

#[test]
fn segmentation_rejects_background_segment() {
    let result = Segmentation::new(
        "seg",
        "Seg",
        "ds-1",
        vec![Segment::new(0, "Background")],
        LabelmapVolume::default(),
    );
    assert!(result.is_err());
}

#[test]
fn white_converts_to_dicom_lab_extremes() {
    let lab = rgb_to_dicom_lab([1.0, 1.0, 1.0]);
    assert!((lab[0] - 65_535.0).abs() < 1.0);
    assert!((lab[1] - 32_896.0).abs() < 2.0);
    assert!((lab[2] - 32_896.0).abs() < 2.0);

    let black = rgb_to_dicom_lab([0.0, 0.0, 0.0]);
    assert!(black[0].abs() < 1.0);
}

#[test]
fn segment_metadata_defaults_and_codes() {
    let segment = Segment::new(2, "Liver");
    let metadata = SegmentMetadata::describe(&segment, default_segment_color(2), "Brush");
    assert_eq!(metadata.segment_number, 2);
    assert_eq!(metadata.segment_algorithm_type, "MANUAL");
    assert_eq!(metadata.segment_algorithm_name, "Brush");
    assert_eq!(metadata.segmented_property_category, TISSUE_CODE);
    assert_eq!(metadata.segmented_property_type.code_value, "T-D0050");
}

#[test]
fn pixel_to_patient_uses_row_and_column_spacing() {
    let image = image("img-1", 4.0);
    let point = image.pixel_to_patient(2.0, 1.0);
    assert_eq!(point, [0.5, 0.5, 4.0]);
    assert_eq!(display_set().spacing_between_slices(), Some(2.0));
}

#[test]
fn brush_size_applies_only_to_brush_tools() {
    let mut group = ToolGroup::new("default")
        .with_tool(
            "CircularBrush",
            ToolConfiguration {
                brush_size: Some(10.0),
                ..ToolConfiguration::default()
            },
        )
        .with_tool("WindowLevel", ToolConfiguration::default());
    assert_eq!(group.set_brush_size(None, 25.0), 1);
    assert_eq!(group.tools["CircularBrush"].brush_size, Some(25.0));
    assert_eq!(group.tools["WindowLevel"].brush_size, None);
    assert_eq!(group.set_brush_size(Some("Missing"), 5.0), 0);
    assert!(group.set_threshold_range("CircularBrush", [10.0, 1.0]).is_err());
    assert!(group.set_threshold_range("CircularBrush", [f32::NAN, 1.0]).is_err());
    assert!(group.set_threshold_range("CircularBrush", [0.0, f32::NAN]).is_err());
    assert!(group.set_threshold_range("CircularBrush", [0.0, f32::INFINITY]).is_err());
    assert_eq!(group.tools["CircularBrush"].threshold_range, None);
}
