use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::formats::GeneratedDataset;

use super::sync::{read, write};

/// What the viewer keeps about an instance once it has been stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
    pub sop_class_uid: String,
    pub modality: String,
    pub series_description: Option<String>,
    pub wado_root: Option<String>,
    pub made_in_client: bool,
}

impl InstanceRecord {
    pub fn from_dataset(dataset: &GeneratedDataset) -> Self {
        Self {
            study_instance_uid: dataset.study_instance_uid().unwrap_or_default(),
            series_instance_uid: dataset.series_instance_uid().unwrap_or_default(),
            sop_instance_uid: dataset.sop_instance_uid().unwrap_or_default(),
            sop_class_uid: dataset.sop_class_uid().unwrap_or_default(),
            modality: dataset.modality().unwrap_or_default(),
            series_description: dataset.series_description(),
            wado_root: None,
            made_in_client: false,
        }
    }
}

pub trait MetadataStore: Send + Sync {
    fn add_instances(&self, instances: Vec<InstanceRecord>, made_in_client: bool);
    fn instances(&self) -> Vec<InstanceRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    instances: RwLock<Vec<InstanceRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn add_instances(&self, instances: Vec<InstanceRecord>, made_in_client: bool) {
        let mut stored = write(&self.instances);
        for mut instance in instances {
            instance.made_in_client = made_in_client;
            match stored
                .iter_mut()
                .find(|existing| existing.sop_instance_uid == instance.sop_instance_uid)
            {
                Some(existing) => *existing = instance,
                None => stored.push(instance),
            }
        }
    }

    fn instances(&self) -> Vec<InstanceRecord> {
        read(&self.instances).clone()
    }
}
