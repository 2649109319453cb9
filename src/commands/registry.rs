use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::runtime::AppContext;
use serde_json::Value;

use super::{
    Command, CommandError, CommandOutput, CommandSchema, DownloadPdfCommand, DownloadRtssCommand,
    DownloadSegmentationCommand, GenerateSegmentationCommand, LoadSegmentationsCommand, Result,
    SetBrushSizeCommand, SetThresholdRangeCommand, StoreSegmentationCommand,
};

type Registry = HashMap<&'static str, Arc<dyn Command>>;

fn register<C: Command + 'static>(map: &mut Registry, command: C) {
    map.insert(command.name(), Arc::new(command));
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: Registry = HashMap::new();
        register(&mut map, LoadSegmentationsCommand);
        register(&mut map, GenerateSegmentationCommand);
        register(&mut map, DownloadSegmentationCommand);
        register(&mut map, DownloadPdfCommand);
        register(&mut map, DownloadRtssCommand);
        register(&mut map, StoreSegmentationCommand);
        register(&mut map, SetBrushSizeCommand);
        register(&mut map, SetThresholdRangeCommand);
        map
    })
}

pub fn default_registry() -> HashMap<&'static str, Arc<dyn Command>> {
    registry()
        .iter()
        .map(|(name, command)| (*name, Arc::clone(command)))
        .collect()
}

pub fn list_commands() -> Vec<CommandSchema> {
    let mut schemas = registry()
        .values()
        .map(|command| command.schema())
        .collect::<Vec<_>>();
    schemas.sort_by(|left, right| left.name.cmp(&right.name));
    schemas
}

pub fn execute_command(context: &AppContext, name: &str, params: &Value) -> Result<CommandOutput> {
    execute_command_with_registry(registry(), context, name, params)
}

pub fn execute_command_with_registry(
    registry: &HashMap<&'static str, Arc<dyn Command>>,
    context: &AppContext,
    name: &str,
    params: &Value,
) -> Result<CommandOutput> {
    let command = registry
        .get(name)
        .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
    if !params.is_object() && !params.is_null() {
        return Err(CommandError::InvalidParams(format!(
            "`{name}` parameters must be a JSON object"
        )));
    }
    command.execute(context, params)
}
