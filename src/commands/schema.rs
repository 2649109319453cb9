use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::AppContext;

use super::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub kind: String,
}

impl ParamSpec {
    pub(crate) fn new(name: &str, kind: &str, required: bool, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

/// Result of one command: a JSON payload for the host plus any files the
/// command wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandOutput {
    pub payload: Value,
    pub artifacts: Vec<PathBuf>,
}

impl CommandOutput {
    pub fn payload_only(payload: Value) -> Self {
        Self {
            payload,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, path: PathBuf) -> Self {
        self.artifacts.push(path);
        self
    }
}

pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn schema(&self) -> CommandSchema;
    fn execute(&self, context: &AppContext, params: &Value) -> Result<CommandOutput>;
}
