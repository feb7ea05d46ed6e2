use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::ExportFormat;

/// `owner_repo_export_20240301T102030.json`
pub fn file_name(repo_full_name: &str, format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "{}_export_{}.{}",
        repo_full_name.replace('/', "_"),
        at.format("%Y%m%dT%H%M%S"),
        format.as_api_str()
    )
}

/// Directory exports land in when none is configured.
pub fn default_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write an export payload, creating `dir` if needed. Returns the full path.
pub fn save(dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "export saved");
    Ok(path)
}
