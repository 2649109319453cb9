use crate::commands::CommandError;
use crate::config::ConfigError;
use crate::formats::FormatError;
use crate::model::CoreError;
use crate::runtime::ServiceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file parse failure: {0}")]
    Parse(String),

    #[error("session I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("session YAML serialization failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("session configuration failure: {0}")]
    Config(#[from] ConfigError),

    #[error("command execution failed: {0}")]
    Command(#[from] CommandError),

    #[error("session setup failed: {0}")]
    Service(#[from] ServiceError),

    #[error("session input could not be read: {0}")]
    Format(#[from] FormatError),

    #[error("session data is inconsistent: {0}")]
    Core(#[from] CoreError),
}
