use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DataSourceKind, DataSourceSettings};
use crate::formats::GeneratedDataset;

use super::{Result, ServiceError};

const MULTIPART_BOUNDARY: &str = "dicomseg-rs-stow-boundary";

/// What commands need to know about a data source once something has been
/// stored through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub name: String,
    pub wado_root: Option<String>,
}

pub trait DataSource: Send + Sync {
    fn config(&self) -> DataSourceConfig;
    fn store_dicom(&self, dataset: &GeneratedDataset) -> Result<()>;
}

/// Writes each instance to `<directory>/<study>/<series>/<sop>.dcm`.
#[derive(Debug, Clone)]
pub struct LocalDataSource {
    name: String,
    directory: PathBuf,
}

impl LocalDataSource {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}

impl DataSource for LocalDataSource {
    fn config(&self) -> DataSourceConfig {
        DataSourceConfig {
            name: self.name.clone(),
            wado_root: Some(format!("file://{}", self.directory.display())),
        }
    }

    fn store_dicom(&self, dataset: &GeneratedDataset) -> Result<()> {
        let sop_instance_uid = dataset
            .sop_instance_uid()
            .ok_or_else(|| ServiceError::Store("dataset has no SOP instance UID".to_string()))?;
        let directory = self
            .directory
            .join(dataset.study_instance_uid().unwrap_or_default())
            .join(dataset.series_instance_uid().unwrap_or_default());
        fs::create_dir_all(&directory)?;
        let path = directory.join(format!("{sop_instance_uid}.dcm"));
        dataset.write_to_file(&path)?;
        log::info!("stored {} in {}", sop_instance_uid, path.display());
        Ok(())
    }
}

/// STOW-RS client posting `multipart/related` bodies to `<wado_root>/studies`.
#[derive(Debug, Clone)]
pub struct DicomWebDataSource {
    name: String,
    wado_root: String,
    agent: ureq::Agent,
}

impl DicomWebDataSource {
    pub fn new(name: impl Into<String>, wado_root: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Self {
            name: name.into(),
            wado_root: wado_root.into().trim_end_matches('/').to_string(),
            agent,
        }
    }
}

pub(crate) fn multipart_body(part: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(part.len() + 160);
    body.extend_from_slice(
        format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: application/dicom\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(part);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

impl DataSource for DicomWebDataSource {
    fn config(&self) -> DataSourceConfig {
        DataSourceConfig {
            name: self.name.clone(),
            wado_root: Some(self.wado_root.clone()),
        }
    }

    fn store_dicom(&self, dataset: &GeneratedDataset) -> Result<()> {
        let body = multipart_body(&dataset.to_bytes()?);
        let url = format!("{}/studies", self.wado_root);
        let content_type = format!(
            "multipart/related; type=\"application/dicom\"; boundary={MULTIPART_BOUNDARY}"
        );
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", &content_type)
            .set("Accept", "application/dicom+json")
            .send_bytes(&body)
            .map_err(|error| ServiceError::Store(format!("{url}: {error}")))?;
        log::info!(
            "stored {} at {} (HTTP {})",
            dataset.sop_instance_uid().unwrap_or_default(),
            url,
            response.status()
        );
        Ok(())
    }
}

pub fn build_data_source(settings: &DataSourceSettings) -> Arc<dyn DataSource> {
    match &settings.kind {
        DataSourceKind::Local { directory } => Arc::new(LocalDataSource::new(
            settings.name.clone(),
            directory.clone(),
        )),
        DataSourceKind::Dicomweb { wado_root } => Arc::new(DicomWebDataSource::new(
            settings.name.clone(),
            wado_root.clone(),
        )),
    }
}
