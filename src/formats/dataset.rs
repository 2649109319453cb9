use std::path::Path;

use dicom::core::Tag;
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::tags;

use super::{FormatError, Result};

const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
const IMPLEMENTATION_CLASS_UID: &str = "2.25.297846133725912786412498126331275431611";
const IMPLEMENTATION_VERSION_NAME: &str = "DICOMSEG_RS_01";

/// An encoded DICOM instance ready for download or storage. Callers treat it
/// as opaque apart from its identifying UIDs and its byte serialisation.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    object: FileDicomObject<InMemDicomObject>,
}

impl GeneratedDataset {
    pub(crate) fn new(
        dataset: InMemDicomObject,
        sop_class_uid: &str,
        sop_instance_uid: &str,
    ) -> Result<Self> {
        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(sop_class_uid)
            .media_storage_sop_instance_uid(sop_instance_uid)
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
            .implementation_class_uid(IMPLEMENTATION_CLASS_UID)
            .implementation_version_name(IMPLEMENTATION_VERSION_NAME)
            .build()
            .map_err(|error| FormatError::Dicom(error.to_string()))?;
        Ok(Self {
            object: dataset.with_exact_meta(meta),
        })
    }

    pub fn object(&self) -> &FileDicomObject<InMemDicomObject> {
        &self.object
    }

    /// Reads a string attribute, trimmed of DICOM padding.
    pub fn string(&self, tag: Tag) -> Option<String> {
        let element = self.object.element(tag).ok()?;
        let value = element.to_str().ok()?;
        Some(value.trim_end_matches(['\0', ' ']).to_string())
    }

    pub fn sop_class_uid(&self) -> Option<String> {
        self.string(tags::SOP_CLASS_UID)
    }

    pub fn sop_instance_uid(&self) -> Option<String> {
        self.string(tags::SOP_INSTANCE_UID)
    }

    pub fn series_instance_uid(&self) -> Option<String> {
        self.string(tags::SERIES_INSTANCE_UID)
    }

    pub fn study_instance_uid(&self) -> Option<String> {
        self.string(tags::STUDY_INSTANCE_UID)
    }

    pub fn modality(&self) -> Option<String> {
        self.string(tags::MODALITY)
    }

    pub fn series_description(&self) -> Option<String> {
        self.string(tags::SERIES_DESCRIPTION)
    }

    /// Serialises as a Part 10 file: preamble, file meta group, data set.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.object
            .write_all(&mut buffer)
            .map_err(|error| FormatError::Dicom(error.to_string()))?;
        Ok(buffer)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}
