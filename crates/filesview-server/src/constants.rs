//! Server configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

/// Default HTTP port for the files server.
pub const DEFAULT_HTTP_PORT: u16 = 5051;

/// Default bind address (localhost only for security).
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Optional path prefix the endpoints also answer under.
pub const ROUTE_PREFIX: &str = "/files";

/// Content type for plain JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for JSONP-wrapped responses.
pub const JSONP_CONTENT_TYPE: &str = "text/javascript";

/// Fallback content type for downloads.
pub const DEFAULT_DOWNLOAD_TYPE: &str = "application/octet-stream";
