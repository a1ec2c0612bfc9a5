//! Request handlers for the files endpoints.
//!
//! Every endpoint is a GET with its arguments in the query string:
//!
//! | Endpoint    | Required | Optional                   |
//! |-------------|----------|----------------------------|
//! | `/browse`   | `path`   | `jsonp`                    |
//! | `/read`     | `path`   | `offset`, `length`, `jsonp`|
//! | `/download` | `path`   |                            |
//! | `/debug`    |          | `jsonp`                    |
//!
//! Each also answers at `<name>.json` and under the `/files` prefix, so
//! `/files/read.json` and `/read` are the same endpoint.

use std::collections::BTreeMap;
use std::collections::HashMap;

use filesview_kernel::{Files, is_dir, list_directory, read_range};
use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response};
use tokio_util::io::ReaderStream;

use crate::constants::ROUTE_PREFIX;
use crate::http::{ApiError, Body, json_response};
use crate::mime::content_type_for;

/// The endpoints this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Browse,
    Read,
    Download,
    Debug,
}

impl Endpoint {
    /// Match a request path, accepting the `/files` prefix and `.json`
    /// suffix forms.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix(ROUTE_PREFIX).unwrap_or(path);
        let path = path.strip_suffix(".json").unwrap_or(path);
        match path {
            "/browse" => Some(Endpoint::Browse),
            "/read" => Some(Endpoint::Read),
            "/download" => Some(Endpoint::Download),
            "/debug" => Some(Endpoint::Debug),
            _ => None,
        }
    }
}

/// Decoded query string. The first occurrence of a key wins.
#[derive(Debug, Default)]
pub struct Query {
    params: HashMap<String, String>,
}

impl Query {
    pub fn parse(query: Option<&str>) -> Self {
        let mut params = HashMap::new();
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The `path` parameter, which must be present and non-empty.
    fn path(&self) -> Result<&str, ApiError> {
        match self.get("path") {
            Some(path) if !path.is_empty() => Ok(path),
            _ => Err(ApiError::bad_request("Expecting 'path=value' in query")),
        }
    }

    /// An optional non-negative integer parameter. `-1` means absent.
    fn offset_param(&self, key: &str) -> Result<Option<u64>, ApiError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|e| ApiError::bad_request(format!("Failed to parse {key}: {e}")))?;
        if value == -1 {
            return Ok(None);
        }
        u64::try_from(value).map(Some).map_err(|_| {
            ApiError::bad_request(format!("Failed to parse {key}: must not be negative"))
        })
    }

    fn jsonp(&self) -> Option<&str> {
        self.get("jsonp")
    }
}

/// Dispatch a request to its endpoint.
///
/// The request body is ignored; every endpoint takes its input from the
/// query string.
pub async fn route<B>(files: &Files, req: Request<B>) -> Response<Body> {
    if req.method() != Method::GET {
        return ApiError::MethodNotAllowed.into_response();
    }

    let Some(endpoint) = Endpoint::from_path(req.uri().path()) else {
        return ApiError::NotFound.into_response();
    };
    let query = Query::parse(req.uri().query());

    tracing::debug!(?endpoint, query = ?req.uri().query(), "request");

    let result = match endpoint {
        Endpoint::Browse => browse(files, &query).await,
        Endpoint::Read => read(files, &query).await,
        Endpoint::Download => download(files, &query).await,
        Endpoint::Debug => debug(files, &query).await,
    };

    result.unwrap_or_else(ApiError::into_response)
}

/// List a directory as a JSON array of file descriptors, sorted by path.
pub async fn browse(files: &Files, query: &Query) -> Result<Response<Body>, ApiError> {
    let path = query.path()?;

    let resolved = match files.resolve(path).await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return Err(ApiError::NotFound),
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };

    let listing = list_directory(&resolved, path).await.map_err(|e| {
        tracing::warn!(path, "failed to list directory: {}", e);
        ApiError::internal(format!("Failed to list '{path}': {e}"))
    })?;

    json_response(&listing, query.jsonp())
}

/// Read a byte range of a file as `{"offset": .., "data": ..}`.
pub async fn read(files: &Files, query: &Query) -> Result<Response<Body>, ApiError> {
    let path = query.path()?;
    let offset = query.offset_param("offset")?;
    let length = query.offset_param("length")?;

    let resolved = match files.resolve(path).await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return Err(ApiError::NotFound),
        Err(e) => return Err(ApiError::bad_request(e.to_string())),
    };

    if is_dir(&resolved).await {
        return Err(ApiError::bad_request("Cannot read a directory"));
    }

    let chunk = read_range(&resolved, offset, length).await.map_err(|e| {
        let msg = format!("Failed to read file at '{path}': {e}");
        tracing::warn!("{}", msg);
        ApiError::internal(msg)
    })?;

    json_response(&chunk, query.jsonp())
}

/// Stream a whole file as an attachment.
pub async fn download(files: &Files, query: &Query) -> Result<Response<Body>, ApiError> {
    let path = query.path()?;

    let resolved = match files.resolve(path).await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => return Err(ApiError::NotFound),
        Err(e) => return Err(ApiError::bad_request(e.to_string())),
    };

    if is_dir(&resolved).await {
        return Err(ApiError::bad_request("Cannot download a directory"));
    }

    let Some(basename) = resolved.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        tracing::error!(path, "resolved path has no basename");
        return Err(ApiError::internal(format!(
            "Failed to determine basename of '{path}'"
        )));
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename={basename}"))
        .map_err(|e| ApiError::internal(format!("Invalid filename '{basename}': {e}")))?;

    let file = tokio::fs::File::open(&resolved).await.map_err(|e| {
        let msg = format!("Failed to open file at '{path}': {e}");
        tracing::warn!("{}", msg);
        ApiError::internal(msg)
    })?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stat file at '{path}': {e}")))?
        .len();

    let stream = ReaderStream::new(file).map_ok(Frame::data);
    let body: Body = StreamBody::new(stream).boxed();

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&basename)),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    Ok(response)
}

/// Dump the namespace as a flat `{virtual: real}` JSON object.
pub async fn debug(files: &Files, query: &Query) -> Result<Response<Body>, ApiError> {
    let snapshot = files
        .debug_snapshot()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let mapping: BTreeMap<String, String> = snapshot
        .into_iter()
        .map(|(name, path)| (name, path.display().to_string()))
        .collect();

    json_response(&mapping, query.jsonp())
}
