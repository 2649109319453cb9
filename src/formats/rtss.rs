use std::collections::BTreeMap;

use chrono::Local;
use dicom::core::{Tag, VR};
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;
use rayon::prelude::*;

use crate::model::{
    DisplaySet, ReferencedImage, Rgba, Segmentation, default_segment_color, summarize_labelmap,
};

use super::elements::{
    put_decimals, put_integer, put_sequence, put_str, put_strs, sop_reference, truncate,
};
use super::seg::write_patient_and_study;
use super::{Contour, FormatError, GeneratedDataset, Result, extract_contours, generate_uid};

pub const RT_STRUCTURE_SET_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.3";
const DETACHED_STUDY_MANAGEMENT: &str = "1.2.840.10008.3.1.2.3.1";

const STRUCTURE_SET_LABEL: Tag = Tag(0x3006, 0x0002);
const STRUCTURE_SET_NAME: Tag = Tag(0x3006, 0x0004);
const STRUCTURE_SET_DATE: Tag = Tag(0x3006, 0x0008);
const STRUCTURE_SET_TIME: Tag = Tag(0x3006, 0x0009);
const REFERENCED_FRAME_OF_REFERENCE_SEQUENCE: Tag = Tag(0x3006, 0x0010);
const RT_REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x3006, 0x0012);
const RT_REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x3006, 0x0014);
const CONTOUR_IMAGE_SEQUENCE: Tag = Tag(0x3006, 0x0016);
const STRUCTURE_SET_ROI_SEQUENCE: Tag = Tag(0x3006, 0x0020);
const ROI_NUMBER: Tag = Tag(0x3006, 0x0022);
const REFERENCED_FRAME_OF_REFERENCE_UID: Tag = Tag(0x3006, 0x0024);
const ROI_NAME: Tag = Tag(0x3006, 0x0026);
const ROI_DISPLAY_COLOR: Tag = Tag(0x3006, 0x002A);
const ROI_GENERATION_ALGORITHM: Tag = Tag(0x3006, 0x0036);
const ROI_CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0039);
const CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0040);
const CONTOUR_GEOMETRIC_TYPE: Tag = Tag(0x3006, 0x0042);
const NUMBER_OF_CONTOUR_POINTS: Tag = Tag(0x3006, 0x0046);
const CONTOUR_NUMBER: Tag = Tag(0x3006, 0x0048);
const CONTOUR_DATA: Tag = Tag(0x3006, 0x0050);
const RT_ROI_OBSERVATIONS_SEQUENCE: Tag = Tag(0x3006, 0x0080);
const OBSERVATION_NUMBER: Tag = Tag(0x3006, 0x0082);
const REFERENCED_ROI_NUMBER: Tag = Tag(0x3006, 0x0084);
const RT_ROI_INTERPRETED_TYPE: Tag = Tag(0x3006, 0x00A4);
const ROI_INTERPRETER: Tag = Tag(0x3006, 0x00A6);

/// One segmentation to convert, with the display set its label map was
/// drawn on and the display colour of each segment.
#[derive(Debug, Clone)]
pub struct RtssSource<'a> {
    pub segmentation: &'a Segmentation,
    pub display_set: &'a DisplaySet,
    pub colors: BTreeMap<u16, Rgba>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtssOptions {
    pub structure_set_label: String,
    pub series_description: String,
    pub series_number: u32,
    pub manufacturer: String,
}

impl Default for RtssOptions {
    fn default() -> Self {
        Self {
            structure_set_label: "RTSS".to_string(),
            series_description: "Research Derived Structure Set".to_string(),
            series_number: 3000,
            manufacturer: "dicomseg-rs".to_string(),
        }
    }
}

struct PlanarContour<'a> {
    image: &'a ReferencedImage,
    contour: Contour,
}

struct Roi<'a> {
    number: usize,
    name: String,
    algorithm: String,
    color: Rgba,
    frame_of_reference_uid: &'a str,
    sop_class_uid: &'a str,
    contours: Vec<PlanarContour<'a>>,
}

/// Converts label-map segmentations into an RT Structure Set with one ROI
/// per segment present on a label map. Contours are closed planar polygons
/// traced on each slice and placed in patient coordinates.
pub fn encode_rt_structure_set(
    sources: &[RtssSource<'_>],
    options: &RtssOptions,
) -> Result<GeneratedDataset> {
    let first = sources.first().ok_or(FormatError::EmptySegmentation)?;

    let mut rois = Vec::new();
    for source in sources {
        let images = source
            .segmentation
            .labelmap
            .slices()
            .iter()
            .map(|slice| {
                source
                    .display_set
                    .image(&slice.referenced_image_id)
                    .ok_or_else(|| {
                        FormatError::MissingReferencedImage(slice.referenced_image_id.clone())
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let summary = summarize_labelmap(&source.segmentation.labelmap);

        for segment_index in &summary.segments_on_labelmap {
            let slices = summary.slices_with_segment(*segment_index);
            let contours = slices
                .par_iter()
                .flat_map_iter(|slice| {
                    let mask = source.segmentation.labelmap.slices()[*slice]
                        .segment_mask(*segment_index);
                    let image = images[*slice];
                    extract_contours(mask.view())
                        .into_iter()
                        .map(move |contour| PlanarContour { image, contour })
                })
                .collect::<Vec<_>>();

            let segment = source.segmentation.segment(*segment_index);
            rois.push(Roi {
                number: rois.len() + 1,
                name: segment
                    .map(|segment| segment.label.clone())
                    .unwrap_or_else(|| format!("Segment {segment_index}")),
                algorithm: segment
                    .and_then(|segment| segment.algorithm_type.clone())
                    .unwrap_or_else(|| "MANUAL".to_string()),
                color: source
                    .colors
                    .get(segment_index)
                    .copied()
                    .unwrap_or_else(|| default_segment_color(*segment_index)),
                frame_of_reference_uid: &source.display_set.frame_of_reference_uid,
                sop_class_uid: &source.display_set.sop_class_uid,
                contours,
            });
        }
    }
    if rois.is_empty() {
        return Err(FormatError::EmptySegmentation);
    }

    let sop_instance_uid = generate_uid();
    let now = Local::now();
    let date = now.format("%Y%m%d").to_string();
    let time = now.format("%H%M%S").to_string();

    let mut dataset = InMemDicomObject::new_empty();
    put_str(&mut dataset, tags::SOP_CLASS_UID, VR::UI, RT_STRUCTURE_SET_STORAGE);
    put_str(&mut dataset, tags::SOP_INSTANCE_UID, VR::UI, sop_instance_uid.as_str());
    put_str(&mut dataset, tags::MODALITY, VR::CS, "RTSTRUCT");
    put_str(
        &mut dataset,
        tags::MANUFACTURER,
        VR::LO,
        truncate(&options.manufacturer, 64),
    );
    write_patient_and_study(&mut dataset, first.display_set);
    put_str(&mut dataset, tags::SERIES_INSTANCE_UID, VR::UI, generate_uid());
    put_integer(&mut dataset, tags::SERIES_NUMBER, i64::from(options.series_number));
    put_str(
        &mut dataset,
        tags::SERIES_DESCRIPTION,
        VR::LO,
        truncate(&options.series_description, 64),
    );
    put_integer(&mut dataset, tags::INSTANCE_NUMBER, 1);
    put_str(
        &mut dataset,
        STRUCTURE_SET_LABEL,
        VR::SH,
        truncate(&options.structure_set_label, 16),
    );
    put_str(
        &mut dataset,
        STRUCTURE_SET_NAME,
        VR::LO,
        truncate(&options.structure_set_label, 64),
    );
    put_str(&mut dataset, STRUCTURE_SET_DATE, VR::DA, date.as_str());
    put_str(&mut dataset, STRUCTURE_SET_TIME, VR::TM, time.as_str());

    put_sequence(
        &mut dataset,
        REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
        referenced_frames_of_reference(sources),
    );
    put_sequence(
        &mut dataset,
        STRUCTURE_SET_ROI_SEQUENCE,
        rois.iter()
            .map(|roi| {
                let mut item = InMemDicomObject::new_empty();
                put_integer(&mut item, ROI_NUMBER, roi.number as i64);
                put_str(
                    &mut item,
                    REFERENCED_FRAME_OF_REFERENCE_UID,
                    VR::UI,
                    roi.frame_of_reference_uid,
                );
                put_str(&mut item, ROI_NAME, VR::LO, truncate(&roi.name, 64));
                put_str(
                    &mut item,
                    ROI_GENERATION_ALGORITHM,
                    VR::CS,
                    roi.algorithm.as_str(),
                );
                item
            })
            .collect(),
    );
    put_sequence(
        &mut dataset,
        ROI_CONTOUR_SEQUENCE,
        rois.iter()
            .map(roi_contour)
            .collect(),
    );
    put_sequence(
        &mut dataset,
        RT_ROI_OBSERVATIONS_SEQUENCE,
        rois.iter()
            .map(|roi| {
                let mut item = InMemDicomObject::new_empty();
                put_integer(&mut item, OBSERVATION_NUMBER, roi.number as i64);
                put_integer(&mut item, REFERENCED_ROI_NUMBER, roi.number as i64);
                put_str(&mut item, RT_ROI_INTERPRETED_TYPE, VR::CS, "");
                put_str(&mut item, ROI_INTERPRETER, VR::PN, "");
                item
            })
            .collect(),
    );

    GeneratedDataset::new(dataset, RT_STRUCTURE_SET_STORAGE, &sop_instance_uid)
}

fn referenced_frames_of_reference(sources: &[RtssSource<'_>]) -> Vec<InMemDicomObject> {
    let mut by_frame: BTreeMap<&str, Vec<&DisplaySet>> = BTreeMap::new();
    for source in sources {
        let display_sets = by_frame
            .entry(source.display_set.frame_of_reference_uid.as_str())
            .or_default();
        if !display_sets
            .iter()
            .any(|known| known.display_set_instance_uid == source.display_set.display_set_instance_uid)
        {
            display_sets.push(source.display_set);
        }
    }

    by_frame
        .into_iter()
        .map(|(frame_of_reference_uid, display_sets)| {
            let series = display_sets
                .iter()
                .map(|display_set| {
                    let mut item = InMemDicomObject::new_empty();
                    put_str(
                        &mut item,
                        tags::SERIES_INSTANCE_UID,
                        VR::UI,
                        display_set.series_instance_uid.as_str(),
                    );
                    put_sequence(
                        &mut item,
                        CONTOUR_IMAGE_SEQUENCE,
                        display_set
                            .images
                            .iter()
                            .map(|image| {
                                sop_reference(&display_set.sop_class_uid, &image.sop_instance_uid)
                            })
                            .collect(),
                    );
                    item
                })
                .collect();

            let study_uid = display_sets
                .first()
                .map(|display_set| display_set.study_instance_uid.as_str())
                .unwrap_or_default();
            let mut study = sop_reference(DETACHED_STUDY_MANAGEMENT, study_uid);
            put_sequence(&mut study, RT_REFERENCED_SERIES_SEQUENCE, series);

            let mut item = InMemDicomObject::new_empty();
            put_str(
                &mut item,
                tags::FRAME_OF_REFERENCE_UID,
                VR::UI,
                frame_of_reference_uid,
            );
            put_sequence(&mut item, RT_REFERENCED_STUDY_SEQUENCE, vec![study]);
            item
        })
        .collect()
}

fn roi_contour(roi: &Roi<'_>) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_strs(
        &mut item,
        ROI_DISPLAY_COLOR,
        VR::IS,
        roi.color[..3].iter().map(u8::to_string).collect(),
    );
    put_integer(&mut item, REFERENCED_ROI_NUMBER, roi.number as i64);
    if roi.contours.is_empty() {
        return item;
    }
    put_sequence(
        &mut item,
        CONTOUR_SEQUENCE,
        roi.contours
            .iter()
            .enumerate()
            .map(|(index, planar)| {
                let mut contour = InMemDicomObject::new_empty();
                put_sequence(
                    &mut contour,
                    CONTOUR_IMAGE_SEQUENCE,
                    vec![sop_reference(
                        roi.sop_class_uid,
                        &planar.image.sop_instance_uid,
                    )],
                );
                put_str(&mut contour, CONTOUR_GEOMETRIC_TYPE, VR::CS, "CLOSED_PLANAR");
                put_integer(
                    &mut contour,
                    NUMBER_OF_CONTOUR_POINTS,
                    planar.contour.points.len() as i64,
                );
                put_integer(&mut contour, CONTOUR_NUMBER, index as i64 + 1);
                let data = planar
                    .contour
                    .points
                    .iter()
                    .flat_map(|[column, row]| planar.image.pixel_to_patient(*column, *row))
                    .collect::<Vec<_>>();
                put_decimals(&mut contour, CONTOUR_DATA, &data);
                contour
            })
            .collect(),
    );
    item
}
