//! Filesystem half of virtual path resolution.
//!
//! [`Namespace::lookup`](crate::Namespace::lookup) picks the attachment; this
//! module turns the match into a canonical real path and enforces that the
//! result stays inside the attached root.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{FilesError, FilesResult};
use crate::namespace::PrefixMatch;

/// Resolve a prefix match to a canonical real path.
///
/// - `Ok(Some(path))`: the canonical real path.
/// - `Ok(None)`: nothing matched, or the request treats an attached file
///   as a directory. Both look the same to the client.
/// - `Err(_)`: the candidate could not be canonicalized or escapes the
///   attached root.
///
/// `virtual_path` is only used for error messages.
pub async fn resolve_match(
    virtual_path: &str,
    found: Option<PrefixMatch>,
) -> FilesResult<Option<PathBuf>> {
    let Some(PrefixMatch { target, suffix, .. }) = found else {
        return Ok(None);
    };

    if !is_dir(&target).await {
        if suffix.is_empty() {
            return Ok(Some(target));
        }
        return Ok(None);
    }

    let mut candidate = target.clone();
    for segment in suffix.split('/').filter(|s| !s.is_empty()) {
        candidate.push(segment);
    }

    let canonical = fs::canonicalize(&candidate)
        .await
        .map_err(|e| FilesError::canonicalize(virtual_path, e))?;

    if !is_within(&target, &canonical) {
        tracing::warn!(virtual_path, "resolution escaped its attached root");
        return Err(FilesError::path_escapes_root(virtual_path));
    }

    Ok(Some(canonical))
}

/// Whether `candidate` is `root` or lies below it.
///
/// Comparison is by path component, so `/a/bfoo` is not within `/a/b`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Whether `path` is a directory, following symlinks.
///
/// A path that cannot be stat'ed is not a directory.
pub async fn is_dir(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
