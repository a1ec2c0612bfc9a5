//! Directory listings for browse requests.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::FilesResult;

/// One entry of a directory listing.
///
/// Paths are virtual; the real location of the entry is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File name of the entry.
    pub name: String,
    /// Virtual path of the entry (`<listed path>/<name>`).
    pub path: String,
    /// Whether the entry is a directory (symlinks are followed).
    pub dir: bool,
    /// Size in bytes.
    pub size: u64,
    /// Permission string as printed by `ls -l`, e.g. `-rw-r--r--`.
    pub mode: String,
    /// Number of hard links.
    pub nlink: u64,
    /// Last modification time, seconds since the Unix epoch.
    pub mtime: i64,
    /// Numeric owner id.
    pub uid: u32,
    /// Numeric group id.
    pub gid: u32,
}

impl FileInfo {
    /// Build a listing entry from `stat` results.
    pub fn from_metadata(name: &str, virtual_path: String, meta: &Metadata) -> Self {
        Self {
            name: name.to_string(),
            path: virtual_path,
            dir: meta.is_dir(),
            size: meta.len(),
            mode: unix_mode::to_string(meta.mode()),
            nlink: meta.nlink(),
            mtime: meta.mtime(),
            uid: meta.uid(),
            gid: meta.gid(),
        }
    }
}

/// Join a child name onto a virtual directory path.
pub fn join_virtual(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// List the immediate children of `real_dir`.
///
/// Entries are reported under `virtual_dir` and sorted by their real path.
/// Children that disappear or cannot be stat'ed between listing and
/// stat are skipped. If `real_dir` cannot be opened as a directory (a file,
/// or unreadable) the listing is empty.
pub async fn list_directory(real_dir: &Path, virtual_dir: &str) -> FilesResult<Vec<FileInfo>> {
    let mut files: BTreeMap<PathBuf, FileInfo> = BTreeMap::new();
    let mut dir = match fs::read_dir(real_dir).await {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(path = virtual_dir, error = %e, "cannot open directory for listing");
            return Ok(Vec::new());
        }
    };

    while let Some(entry) = dir.next_entry().await? {
        let full_path = entry.path();
        let meta = match fs::metadata(&full_path).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(
                    path = %full_path.display(),
                    error = %e,
                    "found in listing but stat failed"
                );
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let info = FileInfo::from_metadata(&name, join_virtual(virtual_dir, &name), &meta);
        files.insert(full_path, info);
    }

    Ok(files.into_values().collect())
}
