use std::collections::{BTreeMap, BTreeSet};

use dicom::object::open_file;
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, array};
use tempfile::tempdir;

use super::{
    FormatError, NO_SEGMENT_METADATA, OverlayLayer, PdfReport, RtssOptions, RtssSource,
    SegEncodingOptions, encode_rt_structure_set, encode_segmentation, extract_contours,
    generate_uid, read_labelmap_stack, render_pdf, render_viewport, report_lines,
    write_labelmap_stack,
};
use crate::model::{
    DisplaySet, LabelmapSlice, LabelmapVolume, ReferencedImage, Segment, SegmentMetadata,
    Segmentation, default_segment_color, summarize_labelmap,
};

fn image(uid: &str, z: f64) -> ReferencedImage {
    ReferencedImage {
        sop_instance_uid: uid.to_string(),
        rows: 4,
        columns: 4,
        image_position_patient: [-10.0, -10.0, z],
        image_orientation_patient: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        pixel_spacing: [1.0, 1.0],
        slice_thickness: Some(2.5),
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
        images: vec![image("1.2.3.4.1", 0.0), image("1.2.3.4.2", 2.5)],
        ..DisplaySet::default()
    }
}

fn segmentation() -> Segmentation {
    let labelmap = LabelmapVolume::new(vec![
        LabelmapSlice {
            referenced_image_id: "1.2.3.4.1".into(),
            pixel_data: array![[0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0], [2, 0, 0, 0]],
        },
        LabelmapSlice {
            referenced_image_id: "1.2.3.4.2".into(),
            pixel_data: array![[0, 0, 0, 0], [0, 1, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
        },
    ])
    .expect("labelmap");
    Segmentation::new(
        "seg-1",
        "Liver study",
        "ds-1",
        vec![Segment::new(1, "Liver"), Segment::new(2, "Lesion")],
        labelmap,
    )
    .expect("segmentation")
}

#[test]
fn contour_around_filled_square() {
    let mut mask = Array2::from_elem((5, 5), false);
    for row in 1..4 {
        for column in 1..4 {
            mask[[row, column]] = true;
        }
    }
    let contours = extract_contours(mask.view());
    assert_eq!(contours.len(), 1);
    assert!(!contours[0].hole);
    let points = &contours[0].points;
    assert_eq!(points.len(), 4);
    assert!(points.contains(&[1.0, 1.0]));
    assert!(points.contains(&[3.0, 3.0]));
    for [column, row] in points {
        assert!((1.0..=3.0).contains(column));
        assert!((1.0..=3.0).contains(row));
    }
}

#[test]
fn contours_for_disjoint_blobs() {
    let mask = array![
        [true, false, false, false],
        [false, false, false, false],
        [false, false, true, true],
        [false, false, true, true],
    ];
    let contours = extract_contours(mask.view());
    assert_eq!(contours.len(), 2);
    assert!(contours[0].points.contains(&[0.0, 0.0]));
    assert_eq!(contours[1].points.len(), 4);
    assert!(contours[1].points.contains(&[3.0, 3.0]));
    assert!(extract_contours(Array2::from_elem((3, 3), false).view()).is_empty());
}

#[test]
fn ring_yields_outer_and_hole_borders() {
    let mut mask = Array2::from_elem((5, 5), false);
    for row in 1..4 {
        for column in 1..4 {
            mask[[row, column]] = row != 2 || column != 2;
        }
    }
    let contours = extract_contours(mask.view());
    assert_eq!(contours.len(), 2);
    assert_eq!(contours.iter().filter(|contour| contour.hole).count(), 1);
}

#[test]
fn generated_uids_are_unique_and_valid() {
    let first = generate_uid();
    let second = generate_uid();
    assert_ne!(first, second);
    assert!(first.starts_with("2.25."));
    assert!(first.len() <= 64);
}

#[test]
fn segmentation_encodes_one_frame_per_present_slice() {
    let display_set = display_set();
    let segmentation = segmentation();
    let mut summary = summarize_labelmap(&segmentation.labelmap);
    for segment in segmentation.segments.values() {
        summary.metadata.insert(
            segment.segment_index,
            SegmentMetadata::describe(segment, default_segment_color(segment.segment_index), "Brush"),
        );
    }
    let images = display_set.images.iter().collect::<Vec<_>>();
    let options = SegEncodingOptions {
        series_description: "Liver SEG".into(),
        ..SegEncodingOptions::default()
    };
    let dataset = encode_segmentation(&display_set, &images, &summary, &options).expect("encode");
    assert_eq!(dataset.modality().as_deref(), Some("SEG"));
    assert_eq!(dataset.study_instance_uid().as_deref(), Some("1.2.3"));
    assert_eq!(dataset.series_description().as_deref(), Some("Liver SEG"));

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("seg.dcm");
    dataset.write_to_file(&path).expect("write");
    let object = open_file(&path).expect("open");

    let frames = object
        .element(tags::NUMBER_OF_FRAMES)
        .expect("frames")
        .to_int::<u32>()
        .expect("int");
    // segment 1 on both slices, segment 2 on the first only
    assert_eq!(frames, 3);
    let segments = object
        .element(tags::SEGMENT_SEQUENCE)
        .expect("segments")
        .items()
        .expect("items")
        .len();
    assert_eq!(segments, 2);
    let per_frame = object
        .element(tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE)
        .expect("per frame")
        .items()
        .expect("items")
        .len();
    assert_eq!(per_frame, 3);

    let pixel_data = object
        .element(tags::PIXEL_DATA)
        .expect("pixel data")
        .to_bytes()
        .expect("bytes");
    assert_eq!(pixel_data.len(), 6);
    // first frame: segment 1 on slice 0 sets pixels 1, 2, 5, 6
    assert_eq!(pixel_data[0], 0b0110_0110);
}

#[test]
fn segmentation_encoder_rejects_empty_labelmap() {
    let display_set = display_set();
    let volume = LabelmapVolume::empty_for(&display_set);
    let summary = summarize_labelmap(&volume);
    let images = display_set.images.iter().collect::<Vec<_>>();
    let result = encode_segmentation(
        &display_set,
        &images,
        &summary,
        &SegEncodingOptions::default(),
    );
    assert!(result.is_err());
}

#[test]
fn segmentation_encoder_rejects_oversized_frames() {
    let display_set = display_set();
    let mut pixel_data = Array2::<u16>::zeros((1, usize::from(u16::MAX) + 1));
    pixel_data[[0, 0]] = 1;
    let volume = LabelmapVolume::new(vec![LabelmapSlice {
        referenced_image_id: "1.2.3.4.1".into(),
        pixel_data,
    }])
    .expect("labelmap");
    let mut summary = summarize_labelmap(&volume);
    let segment = Segment::new(1, "Liver");
    summary.metadata.insert(
        1,
        SegmentMetadata::describe(&segment, default_segment_color(1), "Brush"),
    );
    let images = vec![&display_set.images[0]];
    let result = encode_segmentation(
        &display_set,
        &images,
        &summary,
        &SegEncodingOptions::default(),
    );
    assert!(matches!(result, Err(FormatError::Dicom(message)) if message.contains("columns")));
}

#[test]
fn rt_structure_set_has_roi_per_segment() {
    let display_set = display_set();
    let segmentation = segmentation();
    let source = RtssSource {
        segmentation: &segmentation,
        display_set: &display_set,
        colors: BTreeMap::from([(1, [255, 0, 0, 255])]),
    };
    let dataset =
        encode_rt_structure_set(&[source], &RtssOptions::default()).expect("encode rtss");
    assert_eq!(dataset.modality().as_deref(), Some("RTSTRUCT"));

    let bytes = dataset.to_bytes().expect("bytes");
    assert_eq!(&bytes[128..132], b"DICM");

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("rtss.dcm");
    dataset.write_to_file(&path).expect("write");
    let object = open_file(&path).expect("open");
    let roi_contours = object
        .element(dicom::core::Tag(0x3006, 0x0039))
        .expect("roi contours")
        .items()
        .expect("items");
    assert_eq!(roi_contours.len(), 2);
    let contours = roi_contours[0]
        .element(dicom::core::Tag(0x3006, 0x0040))
        .expect("contours")
        .items()
        .expect("items");
    assert_eq!(contours.len(), 2);
    let color = roi_contours[0]
        .element(dicom::core::Tag(0x3006, 0x002A))
        .expect("color")
        .to_str()
        .expect("str");
    assert_eq!(color.trim(), "255\\0\\0");
}

#[test]
fn report_lines_fall_back_to_placeholder() {
    assert_eq!(report_lines(&[]), vec![NO_SEGMENT_METADATA.to_string()]);
    let segment = Segment::new(1, "Liver");
    let metadata = SegmentMetadata::describe(&segment, [255, 0, 0, 255], "Brush");
    let lines = report_lines(&[metadata]);
    assert!(lines.iter().any(|line| line.contains("Segment 1: Liver")));
    assert!(lines.iter().any(|line| line.contains("MANUAL (Brush)")));
}

#[test]
fn pdf_rendering_produces_document() {
    let report = PdfReport {
        title: "Segmentation Report".into(),
        capture: image::RgbaImage::from_pixel(32, 16, image::Rgba([10, 20, 30, 255])),
        lines: report_lines(&[]),
    };
    let bytes = render_pdf(&report).expect("pdf");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn labelmap_stack_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("labels.tiff");
    let mut data = Array3::<u16>::zeros((2, 3, 4));
    data[[1, 2, 3]] = 7;
    write_labelmap_stack(&path, &data).expect("write");
    let restored = read_labelmap_stack(&path).expect("read");
    assert_eq!(restored.dim(), (2, 3, 4));
    assert_eq!(restored[[1, 2, 3]], 7);
    assert!(write_labelmap_stack(dir.path().join("labels.png"), &data).is_err());
}

#[test]
fn png_labelmap_keeps_native_values() {
    let dir = tempdir().expect("tempdir");
    let narrow = dir.path().join("labels8.png");
    image::GrayImage::from_raw(3, 1, vec![0, 1, 3])
        .expect("gray8")
        .save(&narrow)
        .expect("save");
    let restored = read_labelmap_stack(&narrow).expect("read");
    assert_eq!(restored.dim(), (1, 1, 3));
    assert_eq!(restored.iter().copied().collect::<Vec<_>>(), vec![0, 1, 3]);

    let wide = dir.path().join("labels16.png");
    image::ImageBuffer::<image::Luma<u16>, _>::from_raw(2, 1, vec![2_u16, 300])
        .expect("gray16")
        .save(&wide)
        .expect("save");
    let restored = read_labelmap_stack(&wide).expect("read");
    assert_eq!(restored.iter().copied().collect::<Vec<_>>(), vec![2, 300]);

    let rgb = dir.path().join("labels-rgb.png");
    image::RgbImage::from_pixel(2, 2, image::Rgb([1, 1, 1]))
        .save(&rgb)
        .expect("save");
    assert!(matches!(
        read_labelmap_stack(&rgb),
        Err(FormatError::UnsupportedLayout(_))
    ));
    assert!(matches!(
        read_labelmap_stack(dir.path().join("labels.bmp")),
        Err(FormatError::UnsupportedFormat(message)) if message.contains("tiff")
    ));
}

#[test]
fn viewport_render_blends_overlay() {
    let pixels = array![[0.0_f32, 1.0], [0.0, 1.0]];
    let slice = LabelmapSlice {
        referenced_image_id: "img".into(),
        pixel_data: array![[0, 0], [0, 1]],
    };
    let layer = OverlayLayer {
        slice: &slice,
        colors: BTreeMap::from([(1, [255, 0, 0, 255])]),
    };
    let canvas = render_viewport(Some(pixels.view()), &[layer], 4, 4);
    assert_eq!(canvas.dimensions(), (4, 4));
    assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(3, 0).0, [255, 255, 255, 255]);
    let blended = canvas.get_pixel(3, 3).0;
    assert!(blended[0] > blended[1]);

    let segments = summarize_labelmap(&LabelmapVolume::new(vec![slice.clone()]).expect("volume"))
        .segments_on_labelmap;
    assert_eq!(segments, BTreeSet::from([1]));
}
