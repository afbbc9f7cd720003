//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::request::Parts;
use serde::de::DeserializeOwned;

/// An incoming HTTP request with its body fully buffered.
///
/// Cloning is cheap: the head and route parameters sit behind `Arc`s and the
/// body is a refcounted [`Bytes`]. The interception stage hands a clone to
/// the request descriptor and the original to the handler.
#[derive(Clone, Debug)]
pub struct Request {
    head: Arc<Parts>,
    body: Bytes,
    params: Arc<HashMap<String, String>>,
}

impl Request {
    pub fn new(head: Parts, body: Bytes) -> Self {
        Self { head: Arc::new(head), body, params: Arc::default() }
    }

    /// Returns a copy carrying the path parameters bound by route resolution.
    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = Arc::new(params);
        self
    }

    pub fn method(&self) -> &http::Method { &self.head.method }
    pub fn path(&self) -> &str { self.head.uri.path() }
    pub fn query(&self) -> Option<&str> { self.head.uri.query() }
    pub fn headers(&self) -> &http::HeaderMap { &self.head.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/widgets/{id}`, `req.param("id")` on `/widgets/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// The token of an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?;
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// A value stashed in the request extensions by an outer layer.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.head.extensions.get::<T>()
    }
}

#[cfg(test)]
pub(crate) fn build(method: http::Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request {
    let mut builder = http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (head, ()) = builder.body(()).unwrap().into_parts();
    Request::new(head, Bytes::copy_from_slice(body.as_bytes()))
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde::Deserialize;

    use super::*;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let req = build(Method::GET, "/", &[("Authorization", "Bearer abc.def")], "");
        assert_eq!(req.bearer_token(), Some("abc.def"));

        let req = build(Method::GET, "/", &[("authorization", "Basic dXNlcg==")], "");
        assert_eq!(req.bearer_token(), None);

        let req = build(Method::GET, "/", &[("authorization", "Bearer ")], "");
        assert_eq!(req.bearer_token(), None);
    }

    #[test]
    fn params_survive_cloning() {
        let req = build(Method::GET, "/widgets/42?full=1", &[], "")
            .with_params(HashMap::from([("id".to_owned(), "42".to_owned())]));
        let copy = req.clone();
        assert_eq!(copy.param("id"), Some("42"));
        assert_eq!(copy.path(), "/widgets/42");
        assert_eq!(copy.query(), Some("full=1"));
    }

    #[test]
    fn json_body() {
        #[derive(Deserialize)]
        struct Rename {
            name: String,
        }
        let req = build(Method::POST, "/widgets", &[], r#"{"name":"sprocket"}"#);
        assert_eq!(req.json::<Rename>().unwrap().name, "sprocket");
        assert!(build(Method::POST, "/", &[], "{").json::<Rename>().is_err());
    }
}
