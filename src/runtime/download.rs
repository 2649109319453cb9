use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Result;

/// Where exported files end up.
pub trait DownloadSink: Send + Sync {
    /// Saves `bytes` under `file_name` and returns the written path.
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf>;

    /// Publishes `bytes` as an anonymous blob and returns a URL to it.
    fn open_blob(&self, mime_type: &str, bytes: &[u8]) -> Result<String>;
}

#[derive(Debug)]
pub struct DirectoryDownloads {
    directory: PathBuf,
    blobs: AtomicUsize,
}

impl DirectoryDownloads {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            blobs: AtomicUsize::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

pub(crate) fn sanitize_file_name(file_name: &str) -> String {
    let cleaned = file_name
        .chars()
        .map(|character| match character {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other if other.is_control() => '_',
            other => other,
        })
        .collect::<String>();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "application/dicom" => "dcm",
        "application/pdf" => "pdf",
        "application/json" => "json",
        _ => "bin",
    }
}

impl DownloadSink for DirectoryDownloads {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(sanitize_file_name(file_name));
        fs::write(&path, bytes)?;
        log::info!(
            "saved {} ({}, {} bytes)",
            path.display(),
            mime_type,
            bytes.len()
        );
        Ok(path)
    }

    fn open_blob(&self, mime_type: &str, bytes: &[u8]) -> Result<String> {
        let index = self.blobs.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("blob-{index}.{}", extension_for(mime_type));
        let path = self.save(&file_name, mime_type, bytes)?;
        let absolute = fs::canonicalize(&path).unwrap_or(path);
        Ok(format!("file://{}", absolute.display()))
    }
}
