//! The files service: a namespace owned by a single actor task.
//!
//! ```text
//!   Files (Clone, Send+Sync)      mpsc      NamespaceActor (tokio task)
//!   ┌──────────────────────┐  ────────▶  ┌──────────────────────────┐
//!   │ .attach()            │             │ Namespace                │
//!   │ .detach()            │  ◀────────  │ (one command at a time)  │
//!   │ .resolve()           │   oneshot   │                          │
//!   └──────────────────────┘             └──────────────────────────┘
//! ```
//!
//! Every read or mutation of the namespace is a message to the actor, so
//! they are strictly sequential. Filesystem work (canonicalizing at attach,
//! stat/canonicalize during resolution) happens on the caller's task, so a
//! slow disk never holds up the actor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};

use crate::error::{FilesError, FilesResult};
use crate::namespace::{Namespace, PrefixMatch};
use crate::resolve::resolve_match;

/// Internal command sent from `Files` → `NamespaceActor`.
enum Command {
    Attach {
        name: String,
        real_path: PathBuf,
        reply: oneshot::Sender<()>,
    },
    Detach {
        name: String,
        reply: oneshot::Sender<()>,
    },
    Lookup {
        virtual_path: String,
        reply: oneshot::Sender<Option<PrefixMatch>>,
    },
    Snapshot {
        reply: oneshot::Sender<BTreeMap<String, PathBuf>>,
    },
}

/// Handle to a files service instance.
///
/// Cloning shares the same namespace. Independent instances created with
/// [`Files::new`] never share state. The actor task exits once every
/// handle has been dropped.
#[derive(Clone, Debug)]
pub struct Files {
    tx: mpsc::UnboundedSender<Command>,
}

impl Files {
    /// Spawn a new files service with an empty namespace.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = NamespaceActor {
            namespace: Namespace::new(),
        };
        tokio::spawn(actor.run(rx));
        Self { tx }
    }

    /// Attach `real_path` under `name`.
    ///
    /// The path is canonicalized and must be readable. A trailing `/` on
    /// `name` is ignored, and an existing attachment under the same name is
    /// replaced.
    pub async fn attach(&self, real_path: impl AsRef<Path>, name: &str) -> FilesResult<()> {
        let real_path = real_path.as_ref();
        let canonical = tokio::fs::canonicalize(real_path)
            .await
            .map_err(|source| FilesError::Realpath {
                path: real_path.display().to_string(),
                source,
            })?;

        check_readable(&canonical).map_err(|source| FilesError::AccessDenied {
            path: real_path.display().to_string(),
            source,
        })?;

        tracing::info!(name, real_path = %canonical.display(), "attaching");

        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Attach {
                name: name.to_string(),
                real_path: canonical,
                reply,
            })
            .map_err(|_| FilesError::Shutdown)?;
        rx.await.map_err(|_| FilesError::Shutdown)
    }

    /// Detach `name`. Detaching an unknown name does nothing.
    pub async fn detach(&self, name: &str) {
        let (reply, rx) = oneshot::channel();
        let sent = self.tx.send(Command::Detach {
            name: name.to_string(),
            reply,
        });
        if sent.is_err() || rx.await.is_err() {
            tracing::debug!(name, "detach after files service shut down");
        }
    }

    /// Resolve a virtual path to a canonical real path.
    ///
    /// See [`resolve_match`] for the meaning of each outcome.
    pub async fn resolve(&self, virtual_path: &str) -> FilesResult<Option<PathBuf>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Lookup {
                virtual_path: virtual_path.to_string(),
                reply,
            })
            .map_err(|_| FilesError::Shutdown)?;
        let found = rx.await.map_err(|_| FilesError::Shutdown)?;
        resolve_match(virtual_path, found).await
    }

    /// Copy of the current virtual name → real path mapping.
    pub async fn debug_snapshot(&self) -> FilesResult<BTreeMap<String, PathBuf>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .map_err(|_| FilesError::Shutdown)?;
        rx.await.map_err(|_| FilesError::Shutdown)
    }
}

impl Default for Files {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the namespace; processes commands sequentially.
struct NamespaceActor {
    namespace: Namespace,
}

impl NamespaceActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            self.handle_command(cmd);
        }
        tracing::debug!("files actor shutting down: channel closed");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Attach {
                name,
                real_path,
                reply,
            } => {
                if let Some(previous) = self.namespace.insert(&name, real_path) {
                    tracing::debug!(name = %name, previous = %previous.display(), "replaced attachment");
                }
                let _ = reply.send(());
            }
            Command::Detach { name, reply } => {
                if self.namespace.remove(&name).is_some() {
                    tracing::info!(name = %name, "detached");
                }
                let _ = reply.send(());
            }
            Command::Lookup {
                virtual_path,
                reply,
            } => {
                let _ = reply.send(self.namespace.lookup(&virtual_path));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.namespace.snapshot());
            }
        }
    }
}

/// `access(path, R_OK)` for the process's real uid/gid.
fn check_readable(path: &Path) -> std::io::Result<()> {
    rustix::fs::access(path, rustix::fs::Access::READ_OK).map_err(std::io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_attach_then_resolve_directory() {
        let dir = TempDir::new().unwrap();
        let files = Files::new();
        files.attach(dir.path(), "sandbox").await.unwrap();

        let resolved = files.resolve("sandbox").await.unwrap();
        assert_eq!(resolved, Some(dir.path().canonicalize().unwrap()));
    }

    #[tokio::test]
    async fn test_attach_then_resolve_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"0123456789").unwrap();

        let files = Files::new();
        files.attach(&file, "/f").await.unwrap();

        let resolved = files.resolve("/f").await.unwrap();
        assert_eq!(resolved, Some(file.canonicalize().unwrap()));
        assert_eq!(files.resolve("/f/child").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_attach_canonicalizes() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let messy = dir.path().join("sub").join("..").join("sub");

        let files = Files::new();
        files.attach(&messy, "sub/").await.unwrap();

        let snapshot = files.debug_snapshot().await.unwrap();
        assert_eq!(
            snapshot.get("sub"),
            Some(&dir.path().join("sub").canonicalize().unwrap())
        );
    }

    #[tokio::test]
    async fn test_attach_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let files = Files::new();
        let result = files.attach(dir.path().join("missing"), "x").await;
        assert!(matches!(result, Err(FilesError::Realpath { .. })));
        assert!(files.debug_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_longest_prefix() {
        let outer = TempDir::new().unwrap();
        let inner = TempDir::new().unwrap();
        std::fs::write(outer.path().join("x"), b"outer").unwrap();
        std::fs::write(inner.path().join("x"), b"inner").unwrap();

        let files = Files::new();
        files.attach(outer.path(), "/a").await.unwrap();
        files.attach(inner.path(), "/a/b").await.unwrap();

        let resolved = files.resolve("/a/b/x").await.unwrap().unwrap();
        assert_eq!(resolved, inner.path().join("x").canonicalize().unwrap());

        let resolved = files.resolve("/a/x").await.unwrap().unwrap();
        assert_eq!(resolved, outer.path().join("x").canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_reattach_replaces() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let files = Files::new();
        files.attach(first.path(), "logs").await.unwrap();
        files.attach(second.path(), "logs").await.unwrap();

        let resolved = files.resolve("logs").await.unwrap();
        assert_eq!(resolved, Some(second.path().canonicalize().unwrap()));
    }

    #[tokio::test]
    async fn test_detach() {
        let dir = TempDir::new().unwrap();
        let files = Files::new();
        files.attach(dir.path(), "sandbox").await.unwrap();

        files.detach("sandbox").await;
        assert_eq!(files.resolve("sandbox").await.unwrap(), None);

        // Detaching again is a no-op.
        files.detach("sandbox").await;
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let dir = TempDir::new().unwrap();
        let a = Files::new();
        let b = Files::new();
        a.attach(dir.path(), "sandbox").await.unwrap();

        assert!(a.resolve("sandbox").await.unwrap().is_some());
        assert!(b.resolve("sandbox").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_namespace() {
        let dir = TempDir::new().unwrap();
        let files = Files::new();
        let clone = files.clone();
        clone.attach(dir.path(), "sandbox").await.unwrap();

        assert_eq!(files.debug_snapshot().await.unwrap().len(), 1);
    }
}
