use serde_json::{Value, json};

use crate::model::validate_threshold_range;
use crate::runtime::AppContext;

use super::params::{get_optional_strings, get_optional_typed, get_required_f32};
use super::{Command, CommandError, CommandOutput, CommandSchema, ParamSpec, Result};

pub const DEFAULT_THRESHOLD_TOOLS: [&str; 2] = ["ThresholdCircularBrush", "ThresholdSphereBrush"];

/// Sets the brush size in every tool group, on the named tools or on every
/// brush tool. Returns how many tools changed.
pub fn set_brush_size(
    context: &AppContext,
    value: f32,
    tool_names: Option<&[String]>,
) -> Result<usize> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CommandError::InvalidParams(format!(
            "brush size must be positive, got {value}"
        )));
    }
    let service = context.tool_group_service();
    let mut changed = 0;
    for tool_group_id in service.tool_group_ids() {
        match tool_names {
            None => changed += service.set_brush_size(&tool_group_id, None, value)?,
            Some(names) => {
                for name in names {
                    changed +=
                        service.set_brush_size(&tool_group_id, Some(name.as_str()), value)?;
                }
            }
        }
    }
    log::debug!("brush size {value} applied to {changed} tool(s)");
    Ok(changed)
}

/// Sets the threshold range on the named tools, by default the threshold
/// brushes, in every tool group.
pub fn set_threshold_range(
    context: &AppContext,
    range: [f32; 2],
    tool_names: Option<&[String]>,
) -> Result<usize> {
    validate_threshold_range(range)?;
    let defaults = DEFAULT_THRESHOLD_TOOLS.map(str::to_string);
    let names = tool_names.unwrap_or(&defaults);
    let service = context.tool_group_service();
    let mut changed = 0;
    for tool_group_id in service.tool_group_ids() {
        for name in names {
            if service.set_threshold_range(&tool_group_id, name, range)? {
                changed += 1;
            }
        }
    }
    log::debug!("threshold range {range:?} applied to {changed} tool(s)");
    Ok(changed)
}

#[derive(Debug, Clone, Copy)]
pub struct SetBrushSizeCommand;

impl Command for SetBrushSizeCommand {
    fn name(&self) -> &'static str {
        "tools.set_brush_size"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Set the brush size of brush tools in every tool group.".to_string(),
            params: vec![
                ParamSpec::new("value", "float", true, "Brush radius in pixels."),
                ParamSpec::new(
                    "toolNames",
                    "list",
                    false,
                    "Tools to change; every brush tool when omitted.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let value = get_required_f32(params, "value")?;
        let tool_names = get_optional_strings(params, "toolNames")?;
        let updated = set_brush_size(context, value, tool_names.as_deref())?;
        Ok(CommandOutput::payload_only(json!({ "updated": updated })))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetThresholdRangeCommand;

impl Command for SetThresholdRangeCommand {
    fn name(&self) -> &'static str {
        "tools.set_threshold_range"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name().to_string(),
            description: "Set the intensity range of threshold brushes in every tool group."
                .to_string(),
            params: vec![
                ParamSpec::new("value", "list", true, "`[low, high]` with low <= high."),
                ParamSpec::new(
                    "toolNames",
                    "list",
                    false,
                    "Tools to change; the threshold brushes when omitted.",
                ),
            ],
        }
    }

    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput> {
        let range = get_optional_typed::<[f32; 2]>(params, "value")?.ok_or_else(|| {
            CommandError::InvalidParams("missing range parameter `value`".to_string())
        })?;
        let tool_names = get_optional_strings(params, "toolNames")?;
        let updated = set_threshold_range(context, range, tool_names.as_deref())?;
        Ok(CommandOutput::payload_only(json!({ "updated": updated })))
    }
}
