//! Outgoing HTTP response type, the [`IntoResponse`] conversion trait, and
//! the error responses substituted by the interception stage.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::failure::Failure;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use warden::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/widgets/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response(http::Response<Full<Bytes>>);

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: Vec::new() }
    }

    pub fn status_code(&self) -> StatusCode { self.0.status() }
    pub fn headers(&self) -> &http::HeaderMap { self.0.headers() }

    pub fn into_inner(self) -> http::Response<Full<Bytes>> { self.0 }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`; terminated by a
/// typed body method.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Adds a header. Names or values that are not valid HTTP are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            _ => tracing::warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(Some(JSON), body.into())
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(Some(TEXT), Bytes::from(body.into()))
    }

    pub fn no_body(self) -> Response {
        self.finish(None, Bytes::new())
    }

    fn finish(self, content_type: Option<&'static str>, body: Bytes) -> Response {
        let mut inner = http::Response::new(Full::new(body));
        *inner.status_mut() = self.status;
        let headers = inner.headers_mut();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        Response(inner)
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`]. Implement it on your own types to
/// return them straight from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NO_CONTENT`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

// ── Error responses ───────────────────────────────────────────────────────────

/// Builds the responses substituted for a request the interception stage
/// refused.
pub trait ErrorResponder: Send + Sync + 'static {
    fn not_found(&self) -> Response;
    fn internal(&self, failure: &Failure) -> Response;
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Default responder: small JSON documents.
///
/// ```text
/// 404  {"status":404,"error":"not_found"}
/// 500  {"status":500,"error":"validation","message":"name is empty"}
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonResponder {
    expose_internal_errors: bool,
}

impl JsonResponder {
    /// With `expose` set, 500 bodies carry the full failure text instead of
    /// the sanitized message.
    pub fn new(expose: bool) -> Self {
        Self { expose_internal_errors: expose }
    }

    fn render(status: StatusCode, body: &ErrorBody<'_>) -> Response {
        match serde_json::to_vec(body) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode error body");
                Response::status(status)
            }
        }
    }
}

impl ErrorResponder for JsonResponder {
    fn not_found(&self) -> Response {
        let status = StatusCode::NOT_FOUND;
        Self::render(status, &ErrorBody { status: status.as_u16(), error: "not_found", message: None })
    }

    fn internal(&self, failure: &Failure) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = if self.expose_internal_errors {
            failure.to_string()
        } else {
            failure.public_message()
        };
        Self::render(
            status,
            &ErrorBody { status: status.as_u16(), error: failure.kind(), message: Some(message) },
        )
    }
}

#[cfg(test)]
pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let bytes = response.into_inner().into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_sets_status_and_headers() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/widgets/99")
            .header("bad header", "x")
            .json(b"{}".to_vec());
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.headers()["location"], "/widgets/99");
        assert_eq!(res.headers()[CONTENT_TYPE], JSON);
        assert_eq!(res.headers().len(), 2);
    }

    #[tokio::test]
    async fn not_found_body() {
        let res = JsonResponder::default().not_found();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await, json!({"status": 404, "error": "not_found"}));
    }

    #[tokio::test]
    async fn internal_body_is_sanitized_by_default() {
        let failure = Failure::Collaborator("dsn=postgres://admin:pw@db refused".into());

        let res = JsonResponder::default().internal(&failure);
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(res).await,
            json!({"status": 500, "error": "collaborator", "message": "internal server error"})
        );

        let res = JsonResponder::new(true).internal(&failure);
        let body = body_json(res).await;
        assert!(body["message"].as_str().unwrap().contains("postgres://"));
    }
}
