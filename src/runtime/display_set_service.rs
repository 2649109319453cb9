use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::model::DisplaySet;

use super::sync::{read, write};

pub trait DisplaySetService: Send + Sync {
    fn display_set(&self, display_set_instance_uid: &str) -> Option<Arc<DisplaySet>>;
    fn add_display_set(&self, display_set: DisplaySet);
    fn display_set_uids(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct InMemoryDisplaySets {
    display_sets: RwLock<HashMap<String, Arc<DisplaySet>>>,
}

impl InMemoryDisplaySets {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySetService for InMemoryDisplaySets {
    fn display_set(&self, display_set_instance_uid: &str) -> Option<Arc<DisplaySet>> {
        read(&self.display_sets)
            .get(display_set_instance_uid)
            .cloned()
    }

    fn add_display_set(&self, display_set: DisplaySet) {
        write(&self.display_sets).insert(
            display_set.display_set_instance_uid.clone(),
            Arc::new(display_set),
        );
    }

    fn display_set_uids(&self) -> Vec<String> {
        let mut uids = read(&self.display_sets)
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        uids.sort();
        uids
    }
}
