use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use super::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptAction {
    Save,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub title: String,
    pub default_value: String,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    pub action: PromptAction,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub data_source_name: Option<String>,
}

impl PromptResult {
    pub fn save(value: Option<String>) -> Self {
        Self {
            action: PromptAction::Save,
            value,
            data_source_name: None,
        }
    }

    pub fn cancel() -> Self {
        Self {
            action: PromptAction::Cancel,
            value: None,
            data_source_name: None,
        }
    }

    /// The user confirmed, or typed something before dismissing.
    pub fn should_proceed(&self) -> bool {
        self.action == PromptAction::Save
            || self
                .value
                .as_deref()
                .is_some_and(|value| !value.trim().is_empty())
    }
}

/// Asks for a report name and where to send it.
pub trait ReportPrompt: Send + Sync {
    fn prompt(&self, request: &PromptRequest) -> Result<PromptResult>;
}

/// Answers every prompt with the same result.
#[derive(Debug, Clone)]
pub struct ScriptedPrompt {
    result: PromptResult,
}

impl ScriptedPrompt {
    pub fn new(result: PromptResult) -> Self {
        Self { result }
    }
}

impl Default for ScriptedPrompt {
    fn default() -> Self {
        Self::new(PromptResult::save(None))
    }
}

impl ReportPrompt for ScriptedPrompt {
    fn prompt(&self, _request: &PromptRequest) -> Result<PromptResult> {
        Ok(self.result.clone())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

fn read_answer(question: &str) -> Result<Option<String>> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{question}")?;
    stderr.flush()?;
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

impl ReportPrompt for StdinPrompt {
    fn prompt(&self, request: &PromptRequest) -> Result<PromptResult> {
        let Some(value) = read_answer(&format!(
            "{} [{}] (empty to accept, '-' to cancel): ",
            request.title, request.default_value
        ))?
        else {
            return Ok(PromptResult::cancel());
        };
        if value == "-" {
            return Ok(PromptResult::cancel());
        }

        let data_source_name = match request.data_sources.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            choices => {
                let answer = read_answer(&format!("Data source ({}): ", choices.join(", ")))?
                    .filter(|answer| !answer.is_empty());
                match answer {
                    Some(name) if choices.contains(&name) => Some(name),
                    Some(name) => {
                        return Err(ServiceError::Prompt(format!(
                            "unknown data source `{name}`"
                        )));
                    }
                    None => choices.first().cloned(),
                }
            }
        };

        Ok(PromptResult {
            action: PromptAction::Save,
            value: if value.is_empty() {
                Some(request.default_value.clone())
            } else {
                Some(value)
            },
            data_source_name,
        })
    }
}
