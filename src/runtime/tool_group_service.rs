use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::model::ToolGroup;

use super::sync::{read, write};
use super::{Result, ServiceError};

pub trait ToolGroupService: Send + Sync {
    fn tool_group_ids(&self) -> Vec<String>;
    fn tool_group(&self, tool_group_id: &str) -> Option<ToolGroup>;
    fn add_tool_group(&self, tool_group: ToolGroup);

    /// Returns how many tools of the group changed.
    fn set_brush_size(&self, tool_group_id: &str, tool_name: Option<&str>, size: f32)
    -> Result<usize>;

    /// Returns whether the group has a tool with that name.
    fn set_threshold_range(
        &self,
        tool_group_id: &str,
        tool_name: &str,
        range: [f32; 2],
    ) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct InMemoryToolGroups {
    groups: RwLock<BTreeMap<String, ToolGroup>>,
}

impl InMemoryToolGroups {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolGroupService for InMemoryToolGroups {
    fn tool_group_ids(&self) -> Vec<String> {
        read(&self.groups).keys().cloned().collect()
    }

    fn tool_group(&self, tool_group_id: &str) -> Option<ToolGroup> {
        read(&self.groups).get(tool_group_id).cloned()
    }

    fn add_tool_group(&self, tool_group: ToolGroup) {
        write(&self.groups).insert(tool_group.id.clone(), tool_group);
    }

    fn set_brush_size(
        &self,
        tool_group_id: &str,
        tool_name: Option<&str>,
        size: f32,
    ) -> Result<usize> {
        let mut groups = write(&self.groups);
        let group = groups
            .get_mut(tool_group_id)
            .ok_or_else(|| ServiceError::ToolGroupNotFound(tool_group_id.to_string()))?;
        Ok(group.set_brush_size(tool_name, size))
    }

    fn set_threshold_range(
        &self,
        tool_group_id: &str,
        tool_name: &str,
        range: [f32; 2],
    ) -> Result<bool> {
        let mut groups = write(&self.groups);
        let group = groups
            .get_mut(tool_group_id)
            .ok_or_else(|| ServiceError::ToolGroupNotFound(tool_group_id.to_string()))?;
        Ok(group.set_threshold_range(tool_name, range)?)
    }
}
