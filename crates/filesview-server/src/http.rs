//! HTTP plumbing: connection loop, response bodies, and error mapping.

use std::convert::Infallible;
use std::future::Future;

use bytes::Bytes;
use filesview_kernel::Files;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::constants::{JSON_CONTENT_TYPE, JSONP_CONTENT_TYPE};
use crate::handlers::route;

/// Response body type shared by every endpoint.
pub type Body = BoxBody<Bytes, std::io::Error>;

/// Errors a handler turns into a non-200 response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request input.
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    /// Filesystem or resolution failure.
    #[error("{0}")]
    Internal(String),
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Plain-text response for this error.
    ///
    /// 404 has an empty body; the others carry the message.
    pub fn into_response(self) -> Response<Body> {
        let status = self.status();
        let text = match &self {
            ApiError::NotFound => String::new(),
            other => format!("{other}.\n"),
        };

        let mut response = Response::new(full(text));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        if matches!(self, ApiError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
        }
        response
    }
}

/// Wrap bytes in a response body.
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Encode `value` as a 200 JSON response, or JSONP when `jsonp` names a
/// callback.
pub fn json_response<T: Serialize>(
    value: &T,
    jsonp: Option<&str>,
) -> Result<Response<Body>, ApiError> {
    let json = serde_json::to_string(value)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {e}")))?;

    let (body, content_type) = match jsonp {
        Some(callback) => {
            if !is_valid_callback(callback) {
                return Err(ApiError::bad_request(format!(
                    "Invalid jsonp callback '{callback}'"
                )));
            }
            (format!("{callback}({json});"), JSONP_CONTENT_TYPE)
        }
        None => (json, JSON_CONTENT_TYPE),
    };

    let mut response = Response::new(full(body));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok(response)
}

/// JSONP callbacks are restricted to JavaScript identifier characters and
/// `.` so the body cannot inject script.
fn is_valid_callback(callback: &str) -> bool {
    !callback.is_empty()
        && callback
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

/// Serve HTTP/1 connections from `listener` until `shutdown` resolves.
///
/// Each connection runs in its own task; in-flight connections are not
/// waited for after shutdown.
pub async fn serve(
    listener: TcpListener,
    files: Files,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("failed to accept connection: {}", e);
                        continue;
                    }
                };

                let files = files.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let files = files.clone();
                        async move { Ok::<_, Infallible>(route(&files, req).await) }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::debug!(%peer, "connection error: {}", e);
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down http server...");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = json_response(&serde_json::json!({"a": 1}), None).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(body_string(response).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_jsonp_response() {
        let response = json_response(&serde_json::json!([1, 2]), Some("cb.done")).unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSONP_CONTENT_TYPE);
        assert_eq!(body_string(response).await, "cb.done([1,2]);");
    }

    #[test]
    fn test_jsonp_rejects_script() {
        let result = json_response(&1, Some("alert(1)//"));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_error_responses() {
        let response = ApiError::bad_request("Cannot read a directory").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Cannot read a directory.\n");

        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "");

        let response = ApiError::MethodNotAllowed.into_response();
        assert_eq!(response.headers()[header::ALLOW], "GET");
    }
}
