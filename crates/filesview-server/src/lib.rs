//! filesview server library
//!
//! Read-only HTTP access to directories attached in a
//! [`filesview_kernel::Files`] namespace.

pub mod config;
pub mod constants;
pub mod handlers;
pub mod http;
pub mod mime;

pub use config::{Attachment, Cli, ServerConfig};
pub use handlers::{Endpoint, route};
pub use http::{ApiError, Body, serve};
