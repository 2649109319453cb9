use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::{
    Command, CommandOutput, Result, default_registry, execute_command_with_registry,
};
use serde_json::Value;

use super::AppContext;

#[derive(Clone)]
pub struct CommandService {
    registry: HashMap<&'static str, Arc<dyn Command>>,
}

impl std::fmt::Debug for CommandService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandService")
            .field("registered_commands", &self.registry.len())
            .finish()
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

impl CommandService {
    pub fn execute(
        &self,
        context: &AppContext,
        command: &str,
        params: &Value,
    ) -> Result<CommandOutput> {
        execute_command_with_registry(&self.registry, context, command, params)
    }
}
