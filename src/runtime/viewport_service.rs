use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::model::Viewport;

use super::sync::{read, write};
use super::{Result, ServiceError};

pub trait ViewportGridService: Send + Sync {
    fn active_viewport_id(&self) -> Option<String>;
    fn set_active_viewport(&self, viewport_id: &str) -> Result<()>;
    fn viewport(&self, viewport_id: &str) -> Option<Viewport>;
    fn viewports(&self) -> Vec<Viewport>;
    /// Adds or replaces a viewport. The first viewport added becomes active.
    fn set_viewport(&self, viewport: Viewport);
}

#[derive(Debug, Default)]
pub struct InMemoryViewportGrid {
    viewports: RwLock<BTreeMap<String, Viewport>>,
    active: RwLock<Option<String>>,
}

impl InMemoryViewportGrid {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewportGridService for InMemoryViewportGrid {
    fn active_viewport_id(&self) -> Option<String> {
        read(&self.active).clone()
    }

    fn set_active_viewport(&self, viewport_id: &str) -> Result<()> {
        if !read(&self.viewports).contains_key(viewport_id) {
            return Err(ServiceError::ViewportNotFound(viewport_id.to_string()));
        }
        *write(&self.active) = Some(viewport_id.to_string());
        Ok(())
    }

    fn viewport(&self, viewport_id: &str) -> Option<Viewport> {
        read(&self.viewports).get(viewport_id).cloned()
    }

    fn viewports(&self) -> Vec<Viewport> {
        read(&self.viewports).values().cloned().collect()
    }

    fn set_viewport(&self, viewport: Viewport) {
        let mut active = write(&self.active);
        if active.is_none() {
            *active = Some(viewport.viewport_id.clone());
        }
        write(&self.viewports).insert(viewport.viewport_id.clone(), viewport);
    }
}
