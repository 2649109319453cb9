use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CoreError, Result};

/// Per-tool settings the segmentation commands can change. A tool is brush
/// capable when it carries a brush size, threshold capable when it carries a
/// threshold range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfiguration {
    #[serde(default)]
    pub brush_size: Option<f32>,
    #[serde(default)]
    pub threshold_range: Option<[f32; 2]>,
}

/// A threshold range needs finite bounds with `low <= high`.
pub fn validate_threshold_range(range: [f32; 2]) -> Result<()> {
    let [low, high] = range;
    if low.is_finite() && high.is_finite() && low <= high {
        Ok(())
    } else {
        Err(CoreError::InvalidThresholdRange { low, high })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolGroup {
    pub id: String,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfiguration>,
}

impl ToolGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tools: BTreeMap::new(),
        }
    }

    pub fn with_tool(mut self, name: impl Into<String>, configuration: ToolConfiguration) -> Self {
        self.tools.insert(name.into(), configuration);
        self
    }

    /// Sets the brush size on `tool_name`, or on every brush tool when `None`.
    /// Returns how many tools changed.
    pub fn set_brush_size(&mut self, tool_name: Option<&str>, size: f32) -> usize {
        match tool_name {
            Some(name) => match self.tools.get_mut(name) {
                Some(configuration) => {
                    configuration.brush_size = Some(size);
                    1
                }
                None => 0,
            },
            None => {
                let mut changed = 0;
                for configuration in self.tools.values_mut() {
                    if configuration.brush_size.is_some() {
                        configuration.brush_size = Some(size);
                        changed += 1;
                    }
                }
                changed
            }
        }
    }

    pub fn set_threshold_range(&mut self, tool_name: &str, range: [f32; 2]) -> Result<bool> {
        validate_threshold_range(range)?;
        Ok(match self.tools.get_mut(tool_name) {
            Some(configuration) => {
                configuration.threshold_range = Some(range);
                true
            }
            None => false,
        })
    }
}
