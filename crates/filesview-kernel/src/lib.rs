//! # filesview-kernel
//!
//! Read-only, sandboxed access to attached directory trees.
//!
//! Real paths are attached under virtual names; clients address files by
//! virtual path and never see or escape the real roots:
//!
//! - [`Namespace`] - virtual name → canonical real path, longest-prefix lookup
//! - [`resolve`] - turns a lookup into a canonical path and rejects escapes
//! - [`Files`] - the namespace behind a single actor, the public entry point
//! - [`listing`] / [`reader`] - directory listings and bounded ranged reads

mod error;
mod files;
pub mod listing;
mod namespace;
pub mod reader;
pub mod resolve;

pub use error::{FilesError, FilesResult};
pub use files::Files;
pub use listing::{FileInfo, list_directory};
pub use namespace::{Namespace, PrefixMatch};
pub use reader::{ReadChunk, max_read_length, read_range};
pub use resolve::{is_dir, is_within};
