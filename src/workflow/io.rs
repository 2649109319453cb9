use std::fs;
use std::path::Path;

use crate::config::is_yaml;

use super::{Result, SessionReport, SessionSpec};

/// Reads a session from YAML or JSON. Relative file references resolve
/// against the session file's directory.
pub fn load_session(path: impl AsRef<Path>) -> Result<SessionSpec> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let mut spec = if is_yaml(path) {
        serde_yaml::from_str::<SessionSpec>(&raw)?
    } else {
        serde_json::from_str::<SessionSpec>(&raw)?
    };
    spec.validate()?;
    if let Some(base) = path.parent() {
        spec.resolve_paths(base);
    }
    Ok(spec)
}

pub fn save_report(path: impl AsRef<Path>, report: &SessionReport) -> Result<()> {
    let path = path.as_ref();
    let serialized = if is_yaml(path) {
        serde_yaml::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    fs::write(path, serialized)?;
    Ok(())
}
