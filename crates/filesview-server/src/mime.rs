//! Static file extension → MIME type table for downloads.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::constants::DEFAULT_DOWNLOAD_TYPE;

static TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Text
        ("txt", "text/plain"),
        ("log", "text/plain"),
        ("out", "text/plain"),
        ("err", "text/plain"),
        ("conf", "text/plain"),
        ("ini", "text/plain"),
        ("md", "text/markdown"),
        ("csv", "text/csv"),
        ("tsv", "text/tab-separated-values"),
        ("htm", "text/html"),
        ("html", "text/html"),
        ("css", "text/css"),
        ("xml", "text/xml"),
        ("rtf", "text/rtf"),
        // Scripts and structured data
        ("js", "application/javascript"),
        ("json", "application/json"),
        ("yaml", "application/x-yaml"),
        ("yml", "application/x-yaml"),
        ("toml", "application/toml"),
        ("sh", "application/x-sh"),
        ("py", "text/x-python"),
        ("rs", "text/x-rust"),
        ("c", "text/x-c"),
        ("h", "text/x-c"),
        ("cpp", "text/x-c++"),
        ("hpp", "text/x-c++"),
        ("java", "text/x-java-source"),
        // Documents
        ("pdf", "application/pdf"),
        ("ps", "application/postscript"),
        ("doc", "application/msword"),
        ("xls", "application/vnd.ms-excel"),
        ("ppt", "application/vnd.ms-powerpoint"),
        // Archives
        ("gz", "application/x-gzip"),
        ("tgz", "application/x-gzip"),
        ("bz2", "application/x-bzip2"),
        ("xz", "application/x-xz"),
        ("zst", "application/zstd"),
        ("tar", "application/x-tar"),
        ("zip", "application/zip"),
        ("jar", "application/java-archive"),
        ("7z", "application/x-7z-compressed"),
        ("rar", "application/x-rar-compressed"),
        // Images
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("ico", "image/x-icon"),
        ("svg", "image/svg+xml"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("webp", "image/webp"),
        // Audio / video
        ("mp3", "audio/mpeg"),
        ("wav", "audio/x-wav"),
        ("ogg", "audio/ogg"),
        ("mp4", "video/mp4"),
        ("mpeg", "video/mpeg"),
        ("mpg", "video/mpeg"),
        ("mov", "video/quicktime"),
        ("avi", "video/x-msvideo"),
        ("webm", "video/webm"),
        // Fonts
        ("woff", "font/woff"),
        ("woff2", "font/woff2"),
        ("ttf", "font/ttf"),
        ("otf", "font/otf"),
        // Binaries
        ("bin", "application/octet-stream"),
        ("so", "application/octet-stream"),
        ("exe", "application/octet-stream"),
        ("wasm", "application/wasm"),
    ])
});

/// MIME type for a file name, by its last extension.
///
/// Matching ignores ASCII case. Unknown or missing extensions map to
/// `application/octet-stream`.
pub fn content_type_for(file_name: &str) -> &'static str {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_DOWNLOAD_TYPE)
}
