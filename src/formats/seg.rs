use chrono::Local;
use dicom::core::VR;
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;

use crate::model::{DisplaySet, Labelmap3D, ReferencedImage};

use super::elements::{
    code_item, coded, put_bytes, put_decimals, put_integer, put_optional, put_sequence, put_str,
    put_strs, put_tag, put_u16, put_u16s, put_u32s, sop_reference, truncate,
};
use super::{FormatError, GeneratedDataset, Result, generate_uid};

pub const SEGMENTATION_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.66.4";

const RECOMMENDED_DISPLAY_CIELAB_VALUE: dicom::core::Tag = dicom::core::Tag(0x0062, 0x000D);

#[derive(Debug, Clone, PartialEq)]
pub struct SegEncodingOptions {
    pub series_description: String,
    pub series_number: u32,
    pub instance_number: u32,
    pub manufacturer: String,
    pub content_label: String,
    pub content_creator_name: Option<String>,
    pub software_versions: String,
}

impl Default for SegEncodingOptions {
    fn default() -> Self {
        Self {
            series_description: "Research Derived Series".to_string(),
            series_number: 300,
            instance_number: 1,
            manufacturer: "dicomseg-rs".to_string(),
            content_label: "SEGMENTATION".to_string(),
            content_creator_name: None,
            software_versions: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

struct Frame {
    segment: u16,
    slice: usize,
}

/// Encodes a binary DICOM Segmentation. One frame is emitted per
/// (segment, slice) pair where the segment is present; segments ascend and
/// slices keep label-map order. `images[i]` is the source image of
/// `labelmap.labelmaps_2d[i]`.
pub fn encode_segmentation(
    display_set: &DisplaySet,
    images: &[&ReferencedImage],
    labelmap: &Labelmap3D<'_>,
    options: &SegEncodingOptions,
) -> Result<GeneratedDataset> {
    if labelmap.segments_on_labelmap.is_empty() || labelmap.labelmaps_2d.is_empty() {
        return Err(FormatError::EmptySegmentation);
    }
    if images.len() != labelmap.labelmaps_2d.len() {
        return Err(FormatError::Dicom(format!(
            "{} label-map slices but {} referenced images",
            labelmap.labelmaps_2d.len(),
            images.len()
        )));
    }
    for segment in &labelmap.segments_on_labelmap {
        if !labelmap.metadata.contains_key(segment) {
            return Err(FormatError::MissingSegmentMetadata(*segment));
        }
    }

    let rows = labelmap.labelmaps_2d[0].rows;
    let columns = labelmap.labelmaps_2d[0].columns;
    let rows_value = dimension(rows, "rows")?;
    let columns_value = dimension(columns, "columns")?;
    let frames = labelmap
        .segments_on_labelmap
        .iter()
        .flat_map(|segment| {
            labelmap
                .slices_with_segment(*segment)
                .into_iter()
                .map(|slice| Frame {
                    segment: *segment,
                    slice,
                })
        })
        .collect::<Vec<_>>();

    let sop_instance_uid = generate_uid();
    let dimension_organization_uid = generate_uid();
    let now = Local::now();
    let date = now.format("%Y%m%d").to_string();
    let time = now.format("%H%M%S").to_string();

    let mut dataset = InMemDicomObject::new_empty();
    put_str(&mut dataset, tags::SOP_CLASS_UID, VR::UI, SEGMENTATION_STORAGE);
    put_str(&mut dataset, tags::SOP_INSTANCE_UID, VR::UI, sop_instance_uid.as_str());
    put_str(&mut dataset, tags::MODALITY, VR::CS, "SEG");
    put_strs(
        &mut dataset,
        tags::IMAGE_TYPE,
        VR::CS,
        vec!["DERIVED".into(), "PRIMARY".into()],
    );
    put_str(&mut dataset, tags::CONTENT_DATE, VR::DA, date.as_str());
    put_str(&mut dataset, tags::CONTENT_TIME, VR::TM, time.as_str());
    put_str(&mut dataset, tags::SERIES_DATE, VR::DA, date.as_str());
    put_str(&mut dataset, tags::SERIES_TIME, VR::TM, time.as_str());
    put_str(
        &mut dataset,
        tags::MANUFACTURER,
        VR::LO,
        truncate(&options.manufacturer, 64),
    );
    put_str(
        &mut dataset,
        tags::SOFTWARE_VERSIONS,
        VR::LO,
        options.software_versions.as_str(),
    );
    write_patient_and_study(&mut dataset, display_set);

    put_str(&mut dataset, tags::SERIES_INSTANCE_UID, VR::UI, generate_uid());
    put_integer(&mut dataset, tags::SERIES_NUMBER, i64::from(options.series_number));
    put_str(
        &mut dataset,
        tags::SERIES_DESCRIPTION,
        VR::LO,
        truncate(&options.series_description, 64),
    );
    put_integer(
        &mut dataset,
        tags::INSTANCE_NUMBER,
        i64::from(options.instance_number),
    );
    put_str(
        &mut dataset,
        tags::FRAME_OF_REFERENCE_UID,
        VR::UI,
        display_set.frame_of_reference_uid.as_str(),
    );
    put_str(&mut dataset, tags::POSITION_REFERENCE_INDICATOR, VR::LO, "");

    put_str(
        &mut dataset,
        tags::CONTENT_LABEL,
        VR::CS,
        truncate(&options.content_label.to_ascii_uppercase(), 16),
    );
    put_str(
        &mut dataset,
        tags::CONTENT_DESCRIPTION,
        VR::LO,
        truncate(&options.series_description, 64),
    );
    put_optional(
        &mut dataset,
        tags::CONTENT_CREATOR_NAME,
        VR::PN,
        options.content_creator_name.as_deref(),
    );

    put_u16(&mut dataset, tags::SAMPLES_PER_PIXEL, 1);
    put_str(&mut dataset, tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2");
    put_u16(&mut dataset, tags::ROWS, rows_value);
    put_u16(&mut dataset, tags::COLUMNS, columns_value);
    put_u16(&mut dataset, tags::BITS_ALLOCATED, 1);
    put_u16(&mut dataset, tags::BITS_STORED, 1);
    put_u16(&mut dataset, tags::HIGH_BIT, 0);
    put_u16(&mut dataset, tags::PIXEL_REPRESENTATION, 0);
    put_str(&mut dataset, tags::LOSSY_IMAGE_COMPRESSION, VR::CS, "00");
    put_str(&mut dataset, tags::SEGMENTATION_TYPE, VR::CS, "BINARY");
    put_integer(&mut dataset, tags::NUMBER_OF_FRAMES, frames.len() as i64);

    put_sequence(
        &mut dataset,
        tags::REFERENCED_SERIES_SEQUENCE,
        vec![referenced_series(display_set, images)],
    );
    put_sequence(
        &mut dataset,
        tags::DIMENSION_ORGANIZATION_SEQUENCE,
        vec![{
            let mut item = InMemDicomObject::new_empty();
            put_str(
                &mut item,
                tags::DIMENSION_ORGANIZATION_UID,
                VR::UI,
                dimension_organization_uid.as_str(),
            );
            item
        }],
    );
    put_sequence(
        &mut dataset,
        tags::DIMENSION_INDEX_SEQUENCE,
        dimension_index(&dimension_organization_uid),
    );
    put_sequence(
        &mut dataset,
        tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
        vec![shared_functional_groups(display_set, images[0])],
    );
    put_sequence(
        &mut dataset,
        tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
        frames
            .iter()
            .map(|frame| per_frame_functional_groups(display_set, images[frame.slice], frame))
            .collect(),
    );
    put_sequence(
        &mut dataset,
        tags::SEGMENT_SEQUENCE,
        labelmap
            .segments_on_labelmap
            .iter()
            .filter_map(|segment| labelmap.metadata.get(segment))
            .map(|metadata| {
                let mut item = InMemDicomObject::new_empty();
                put_u16(&mut item, tags::SEGMENT_NUMBER, metadata.segment_number);
                put_str(
                    &mut item,
                    tags::SEGMENT_LABEL,
                    VR::LO,
                    truncate(&metadata.segment_label, 64),
                );
                put_str(
                    &mut item,
                    tags::SEGMENT_ALGORITHM_TYPE,
                    VR::CS,
                    metadata.segment_algorithm_type.as_str(),
                );
                put_str(
                    &mut item,
                    tags::SEGMENT_ALGORITHM_NAME,
                    VR::LO,
                    truncate(&metadata.segment_algorithm_name, 64),
                );
                put_u16s(
                    &mut item,
                    RECOMMENDED_DISPLAY_CIELAB_VALUE,
                    metadata.recommended_display_cielab_value.to_vec(),
                );
                put_sequence(
                    &mut item,
                    tags::SEGMENTED_PROPERTY_CATEGORY_CODE_SEQUENCE,
                    vec![code_item(&metadata.segmented_property_category)],
                );
                put_sequence(
                    &mut item,
                    tags::SEGMENTED_PROPERTY_TYPE_CODE_SEQUENCE,
                    vec![code_item(&metadata.segmented_property_type)],
                );
                item
            })
            .collect(),
    );
    put_bytes(
        &mut dataset,
        tags::PIXEL_DATA,
        VR::OB,
        pack_frames(labelmap, &frames, rows, columns),
    );

    GeneratedDataset::new(dataset, SEGMENTATION_STORAGE, &sop_instance_uid)
}

pub(crate) fn write_patient_and_study(dataset: &mut InMemDicomObject, display_set: &DisplaySet) {
    put_str(dataset, tags::PATIENT_NAME, VR::PN, display_set.patient_name.as_str());
    put_str(dataset, tags::PATIENT_ID, VR::LO, display_set.patient_id.as_str());
    put_optional(
        dataset,
        tags::PATIENT_BIRTH_DATE,
        VR::DA,
        display_set.patient_birth_date.as_deref(),
    );
    put_optional(
        dataset,
        tags::PATIENT_SEX,
        VR::CS,
        display_set.patient_sex.as_deref(),
    );
    put_str(
        dataset,
        tags::STUDY_INSTANCE_UID,
        VR::UI,
        display_set.study_instance_uid.as_str(),
    );
    put_optional(dataset, tags::STUDY_ID, VR::SH, display_set.study_id.as_deref());
    put_optional(dataset, tags::STUDY_DATE, VR::DA, display_set.study_date.as_deref());
    put_optional(dataset, tags::STUDY_TIME, VR::TM, display_set.study_time.as_deref());
    put_optional(
        dataset,
        tags::ACCESSION_NUMBER,
        VR::SH,
        display_set.accession_number.as_deref(),
    );
    put_str(dataset, tags::REFERRING_PHYSICIAN_NAME, VR::PN, "");
}

fn referenced_series(display_set: &DisplaySet, images: &[&ReferencedImage]) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(
        &mut item,
        tags::SERIES_INSTANCE_UID,
        VR::UI,
        display_set.series_instance_uid.as_str(),
    );
    put_sequence(
        &mut item,
        tags::REFERENCED_INSTANCE_SEQUENCE,
        images
            .iter()
            .map(|image| sop_reference(&display_set.sop_class_uid, &image.sop_instance_uid))
            .collect(),
    );
    item
}

fn dimension_index(organization_uid: &str) -> Vec<InMemDicomObject> {
    let entries = [
        (
            tags::REFERENCED_SEGMENT_NUMBER,
            tags::SEGMENT_IDENTIFICATION_SEQUENCE,
            "ReferencedSegmentNumber",
        ),
        (
            tags::IMAGE_POSITION_PATIENT,
            tags::PLANE_POSITION_SEQUENCE,
            "ImagePositionPatient",
        ),
    ];
    entries
        .into_iter()
        .map(|(pointer, group, label)| {
            let mut item = InMemDicomObject::new_empty();
            put_str(&mut item, tags::DIMENSION_ORGANIZATION_UID, VR::UI, organization_uid);
            put_tag(&mut item, tags::DIMENSION_INDEX_POINTER, pointer);
            put_tag(&mut item, tags::FUNCTIONAL_GROUP_POINTER, group);
            put_str(&mut item, tags::DIMENSION_DESCRIPTION_LABEL, VR::LO, label);
            item
        })
        .collect()
}

fn shared_functional_groups(display_set: &DisplaySet, image: &ReferencedImage) -> InMemDicomObject {
    let mut orientation = InMemDicomObject::new_empty();
    put_decimals(
        &mut orientation,
        tags::IMAGE_ORIENTATION_PATIENT,
        &image.image_orientation_patient,
    );

    let mut measures = InMemDicomObject::new_empty();
    put_decimals(&mut measures, tags::PIXEL_SPACING, &image.pixel_spacing);
    let spacing = display_set.spacing_between_slices();
    if let Some(thickness) = image.slice_thickness.or(spacing) {
        put_decimals(&mut measures, tags::SLICE_THICKNESS, &[thickness]);
    }
    if let Some(spacing) = spacing {
        put_decimals(&mut measures, tags::SPACING_BETWEEN_SLICES, &[spacing]);
    }

    let mut groups = InMemDicomObject::new_empty();
    put_sequence(&mut groups, tags::PLANE_ORIENTATION_SEQUENCE, vec![orientation]);
    put_sequence(&mut groups, tags::PIXEL_MEASURES_SEQUENCE, vec![measures]);
    groups
}

fn per_frame_functional_groups(
    display_set: &DisplaySet,
    image: &ReferencedImage,
    frame: &Frame,
) -> InMemDicomObject {
    let mut source = sop_reference(&display_set.sop_class_uid, &image.sop_instance_uid);
    put_sequence(
        &mut source,
        tags::PURPOSE_OF_REFERENCE_CODE_SEQUENCE,
        vec![coded(
            "121322",
            "DCM",
            "Source image for image processing operation",
        )],
    );
    let mut derivation = InMemDicomObject::new_empty();
    put_sequence(&mut derivation, tags::SOURCE_IMAGE_SEQUENCE, vec![source]);
    put_sequence(
        &mut derivation,
        tags::DERIVATION_CODE_SEQUENCE,
        vec![coded("113076", "DCM", "Segmentation")],
    );

    let mut content = InMemDicomObject::new_empty();
    put_u32s(
        &mut content,
        tags::DIMENSION_INDEX_VALUES,
        vec![u32::from(frame.segment), frame.slice as u32 + 1],
    );

    let mut position = InMemDicomObject::new_empty();
    put_decimals(
        &mut position,
        tags::IMAGE_POSITION_PATIENT,
        &image.image_position_patient,
    );

    let mut identification = InMemDicomObject::new_empty();
    put_u16(&mut identification, tags::REFERENCED_SEGMENT_NUMBER, frame.segment);

    let mut groups = InMemDicomObject::new_empty();
    put_sequence(&mut groups, tags::DERIVATION_IMAGE_SEQUENCE, vec![derivation]);
    put_sequence(&mut groups, tags::FRAME_CONTENT_SEQUENCE, vec![content]);
    put_sequence(&mut groups, tags::PLANE_POSITION_SEQUENCE, vec![position]);
    put_sequence(
        &mut groups,
        tags::SEGMENT_IDENTIFICATION_SEQUENCE,
        vec![identification],
    );
    groups
}

/// Packs frames as contiguous 1-bit samples, least significant bit first,
/// padded to an even byte length.
fn pack_frames(
    labelmap: &Labelmap3D<'_>,
    frames: &[Frame],
    rows: usize,
    columns: usize,
) -> Vec<u8> {
    let frame_pixels = rows * columns;
    let total_bits = frames.len() * frame_pixels;
    let mut length = total_bits.div_ceil(8);
    if length % 2 == 1 {
        length += 1;
    }
    let mut bytes = vec![0_u8; length];
    for (index, frame) in frames.iter().enumerate() {
        let pixels = &labelmap.labelmaps_2d[frame.slice].pixel_data;
        let offset = index * frame_pixels;
        for (pixel, value) in pixels.iter().enumerate() {
            if *value == frame.segment {
                let bit = offset + pixel;
                bytes[bit / 8] |= 1 << (bit % 8);
            }
        }
    }
    bytes
}

fn dimension(value: usize, name: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        FormatError::Dicom(format!("{name} {value} exceed the 16-bit image dimension limit"))
    })
}
