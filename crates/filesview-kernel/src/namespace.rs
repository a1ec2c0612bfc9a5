//! Virtual name → real path mapping with longest-prefix lookup.
//!
//! The namespace is plain data: it never touches the filesystem. Callers
//! canonicalize paths before inserting them (see [`crate::Files::attach`])
//! and do the filesystem half of resolution afterwards
//! (see [`crate::resolve`]).

use std::collections::BTreeMap;
use std::path::PathBuf;

/// The result of matching a virtual path against the namespace.
///
/// For `/sandbox/logs/today.txt` with `/sandbox` attached, `prefix` is
/// `/sandbox` and `suffix` is `logs/today.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    /// The virtual name that matched.
    pub prefix: String,
    /// The canonical real path attached under `prefix`.
    pub target: PathBuf,
    /// Remaining `/`-delimited segments below the prefix (may be empty).
    pub suffix: String,
}

/// Mapping of virtual names to canonical real paths.
///
/// Every stored value was canonical when it was inserted; lookups do not
/// re-validate it.
#[derive(Debug, Default, Clone)]
pub struct Namespace {
    entries: BTreeMap<String, PathBuf>,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a mapping.
    ///
    /// A single trailing `/` is stripped from `name`. The previous mapping
    /// under the same name, if any, is returned.
    pub fn insert(&mut self, name: &str, real_path: PathBuf) -> Option<PathBuf> {
        self.entries
            .insert(normalize_name(name).to_string(), real_path)
    }

    /// Remove a mapping. Removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<PathBuf> {
        self.entries.remove(name)
    }

    /// Copy of the full mapping, for introspection.
    pub fn snapshot(&self) -> BTreeMap<String, PathBuf> {
        self.entries.clone()
    }

    /// Find the longest attached prefix of `virtual_path`.
    ///
    /// The path is treated as `/`-delimited segments. Candidate prefixes
    /// are tried from the whole path down to its first segment, dropping
    /// one trailing segment per step, so `/a/b` is tried before `/a` for
    /// `/a/b/c`. Prefixes are slices of the input; nothing is allocated
    /// until a match is found.
    pub fn lookup(&self, virtual_path: &str) -> Option<PrefixMatch> {
        let path = normalize_name(virtual_path);
        let mut prefix = path;

        loop {
            if let Some(target) = self.entries.get(prefix) {
                let suffix = if prefix.len() == path.len() {
                    ""
                } else {
                    &path[prefix.len() + 1..]
                };
                return Some(PrefixMatch {
                    prefix: prefix.to_string(),
                    target: target.clone(),
                    suffix: suffix.to_string(),
                });
            }

            match prefix.rfind('/') {
                Some(idx) => prefix = &prefix[..idx],
                None => return None,
            }
        }
    }
}

/// Strip a single trailing `/`.
fn normalize_name(name: &str) -> &str {
    name.strip_suffix('/').unwrap_or(name)
}
