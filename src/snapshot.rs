//! On-disk snapshot of the issue corpus.
//!
//! The snapshot is a single JSON array of `{key, summary, description}`
//! records. The file's modification time is the snapshot timestamp.

use crate::types::Issue;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A snapshot read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub issues: Vec<Issue>,
    pub modified: SystemTime,
}

/// Loads a previously saved snapshot.
///
/// A missing, unreadable or corrupt file is reported as `None`: the caller
/// treats it as "no snapshot yet" rather than an error.
pub async fn load_snapshot(path: &Path) -> Option<StoredSnapshot> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("No snapshot at {}: {}", path.display(), e);
            return None;
        }
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read snapshot {}: {}", path.display(), e);
            return None;
        }
    };

    let issues: Vec<Issue> = match serde_json::from_str(&content) {
        Ok(issues) => issues,
        Err(e) => {
            tracing::warn!("Ignoring corrupt snapshot {}: {}", path.display(), e);
            return None;
        }
    };

    let modified = metadata.modified().ok()?;
    Some(StoredSnapshot { issues, modified })
}

/// Saves a snapshot, replacing any previous one atomically.
///
/// The records are written to a sibling temporary file which is then renamed
/// over `path`, so readers see either the old file or the new one. Returns the
/// new file's modification time, or the current time when the filesystem does
/// not report one. Once the rename succeeds the save does not fail.
pub async fn save_snapshot(path: &Path, issues: &[Issue]) -> std::io::Result<SystemTime> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(issues)?;
    let temp_path = temp_path_for(path);

    tokio::fs::write(&temp_path, content).await?;
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    let modified = tokio::fs::metadata(path).await.and_then(|meta| meta.modified());
    Ok(modified_or_now(modified))
}

fn modified_or_now(modified: std::io::Result<SystemTime>) -> SystemTime {
    modified.unwrap_or_else(|e| {
        tracing::warn!("Snapshot mtime unavailable, using current time: {}", e);
        SystemTime::now()
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("snapshot"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
