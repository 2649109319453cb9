//! Viewer configuration, read from YAML or JSON depending on the file
//! extension. Every field has a default so an empty document is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration JSON failure: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("configuration YAML failure: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataSourceKind {
    Local { directory: PathBuf },
    Dicomweb { wado_root: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSettings {
    pub name: String,
    #[serde(flatten)]
    pub kind: DataSourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub manufacturer: String,
    pub series_number: u32,
    pub algorithm_name: String,
    pub rtss_series_number: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            manufacturer: "dicomseg-rs".to_string(),
            series_number: 300,
            algorithm_name: "dicomseg-rs Brush".to_string(),
            rtss_series_number: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    pub title: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            title: "Segmentation Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub output_dir: PathBuf,
    pub default_data_source: Option<String>,
    pub data_sources: Vec<DataSourceSettings>,
    pub generation: GenerationDefaults,
    pub pdf: PdfSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            default_data_source: None,
            data_sources: Vec::new(),
            generation: GenerationDefaults::default(),
            pdf: PdfSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        for (index, source) in self.data_sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "data source at index {index} has an empty name"
                )));
            }
            if self.data_sources[..index]
                .iter()
                .any(|other| other.name == source.name)
            {
                return Err(ConfigError::Invalid(format!(
                    "data source `{}` is declared twice",
                    source.name
                )));
            }
        }
        if let Some(default) = &self.default_data_source {
            if !self.data_sources.iter().any(|source| &source.name == default) {
                return Err(ConfigError::Invalid(format!(
                    "default data source `{default}` is not declared"
                )));
            }
        }
        Ok(())
    }

    /// The configured default, else the first declared data source.
    pub fn default_data_source_name(&self) -> Option<&str> {
        self.default_data_source
            .as_deref()
            .or_else(|| self.data_sources.first().map(|source| source.name.as_str()))
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(extension.as_str(), "yaml" | "yml")
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ViewerConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let config = if is_yaml(path) {
        serde_yaml::from_str::<ViewerConfig>(&raw)?
    } else {
        serde_json::from_str::<ViewerConfig>(&raw)?
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{DataSourceKind, ViewerConfig};

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: ViewerConfig = serde_yaml::from_str("{}").expect("config");
        assert_eq!(config, ViewerConfig::default());
        assert!(config.default_data_source_name().is_none());
    }

    #[test]
    fn data_sources_parse_by_kind() {
        let raw = r#"
output_dir: out
data_sources:
  - name: archive
    kind: dicomweb
    wado_root: http://localhost:8042/dicom-web
  - name: disk
    kind: local
    directory: /tmp/store
"#;
        let config: ViewerConfig = serde_yaml::from_str(raw).expect("config");
        config.validate().expect("valid");
        assert_eq!(config.default_data_source_name(), Some("archive"));
        assert!(matches!(
            config.data_sources[1].kind,
            DataSourceKind::Local { .. }
        ));
    }

    #[test]
    fn unknown_default_source_is_rejected() {
        let config = ViewerConfig {
            default_data_source: Some("missing".into()),
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
