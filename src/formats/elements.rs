//! Small builders over the `dicom` object model used by the encoders.

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::InMemDicomObject;
use dicom_dictionary_std::tags;

use crate::model::CodedConcept;

pub(crate) fn put_str(object: &mut InMemDicomObject, tag: Tag, vr: VR, value: impl Into<String>) {
    object.put(DataElement::new(tag, vr, PrimitiveValue::from(value.into())));
}

pub(crate) fn put_strs(object: &mut InMemDicomObject, tag: Tag, vr: VR, values: Vec<String>) {
    object.put(DataElement::new(tag, vr, PrimitiveValue::Strs(values.into())));
}

pub(crate) fn put_decimals(object: &mut InMemDicomObject, tag: Tag, values: &[f64]) {
    let values = values.iter().map(|value| format_decimal(*value)).collect();
    put_strs(object, tag, VR::DS, values);
}

pub(crate) fn put_integer(object: &mut InMemDicomObject, tag: Tag, value: i64) {
    put_str(object, tag, VR::IS, value.to_string());
}

pub(crate) fn put_u16(object: &mut InMemDicomObject, tag: Tag, value: u16) {
    object.put(DataElement::new(tag, VR::US, PrimitiveValue::from(value)));
}

pub(crate) fn put_u16s(object: &mut InMemDicomObject, tag: Tag, values: Vec<u16>) {
    object.put(DataElement::new(tag, VR::US, PrimitiveValue::U16(values.into())));
}

pub(crate) fn put_u32s(object: &mut InMemDicomObject, tag: Tag, values: Vec<u32>) {
    object.put(DataElement::new(tag, VR::UL, PrimitiveValue::U32(values.into())));
}

pub(crate) fn put_tag(object: &mut InMemDicomObject, tag: Tag, value: Tag) {
    object.put(DataElement::new(tag, VR::AT, PrimitiveValue::Tags(vec![value].into())));
}

pub(crate) fn put_bytes(object: &mut InMemDicomObject, tag: Tag, vr: VR, bytes: Vec<u8>) {
    object.put(DataElement::new(tag, vr, PrimitiveValue::U8(bytes.into())));
}

pub(crate) fn put_sequence(object: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    object.put(DataElement::new(tag, VR::SQ, DataSetSequence::from(items)));
}

/// Type 2 attributes are written empty when the value is unknown.
pub(crate) fn put_optional(object: &mut InMemDicomObject, tag: Tag, vr: VR, value: Option<&str>) {
    put_str(object, tag, vr, value.unwrap_or_default());
}

pub(crate) fn code_item(code: &CodedConcept) -> InMemDicomObject {
    coded(code.code_value, code.coding_scheme_designator, code.code_meaning)
}

pub(crate) fn coded(value: &str, scheme: &str, meaning: &str) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(&mut item, tags::CODE_VALUE, VR::SH, value);
    put_str(&mut item, tags::CODING_SCHEME_DESIGNATOR, VR::SH, scheme);
    put_str(&mut item, tags::CODE_MEANING, VR::LO, meaning);
    item
}

pub(crate) fn sop_reference(sop_class_uid: &str, sop_instance_uid: &str) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_str(&mut item, tags::REFERENCED_SOP_CLASS_UID, VR::UI, sop_class_uid);
    put_str(&mut item, tags::REFERENCED_SOP_INSTANCE_UID, VR::UI, sop_instance_uid);
    item
}

/// Formats a decimal string within the 16-byte DS limit.
pub(crate) fn format_decimal(value: f64) -> String {
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let trimmed = if trimmed.is_empty() || trimmed == "-" {
        "0"
    } else {
        trimmed
    };
    if trimmed.len() <= 16 {
        trimmed.to_string()
    } else {
        format!("{value:.8e}")
    }
}

/// Truncates to the maximum length of a VR, as CS/SH/LO values must fit.
pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
