//! Request and response model.
//!
//! [`Request`] is the transport-facing request handed to middleware and the
//! dispatcher. Its body and query string are parsed lazily, at most once,
//! and only when a binding actually reads them. [`ResponseHandle`] is the
//! shared response writer given to handlers that answer on their own.

use crate::context::RequestContext;
use crate::error::{DispatchError, DispatchResult};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use http_body_util::Full;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Body type of every response produced by Hermes.
pub type ResponseBody = Full<Bytes>;

/// Response type produced by Hermes.
pub type Response = http::Response<ResponseBody>;

const INLINE_PARAMS: usize = 4;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The HTTP verbs an endpoint can be compiled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// All verbs, in declaration order.
    pub const ALL: [Verb; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Returns the upper-case verb name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Converts to an [`http::Method`].
    #[must_use]
    pub fn to_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    /// Converts from an [`http::Method`], if it is one of the supported verbs.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.to_method() == *method)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = DispatchError;

    /// Parses a verb case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == upper)
            .ok_or_else(|| DispatchError::configuration(format!("unsupported HTTP verb '{s}'")))
    }
}

/// Path parameters captured by a route template match.
///
/// # Example
///
/// ```
/// use hermes_core::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("id", "42");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops parameters past the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Renders the parameters as a JSON object of strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(n, v)| (n.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// An incoming request.
///
/// The extension map is the per-request state bag: the dispatcher inserts
/// the [`RequestContext`] there without touching unrelated entries.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
    extensions: Extensions,
    parsed_body: OnceLock<Result<Option<Value>, String>>,
    parsed_query: OnceLock<Result<Map<String, Value>, String>>,
}

impl Request {
    /// Creates a request from its parts.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params: PathParams::new(),
            extensions: Extensions::new(),
            parsed_body: OnceLock::new(),
            parsed_query: OnceLock::new(),
        }
    }

    /// Creates a request from `http` request parts and a collected body,
    /// keeping the parts' extensions.
    #[must_use]
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        let mut request = Self::new(parts.method, parts.uri, parts.headers, body);
        request.extensions = parts.extensions;
        request
    }

    /// Starts building a request.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Replaces the captured path parameters.
    pub fn set_path_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    /// Returns the per-request state bag.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the per-request state bag mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the request context, once the dispatcher has attached one.
    #[must_use]
    pub fn context(&self) -> Option<&RequestContext> {
        self.extensions.get::<RequestContext>()
    }

    /// Returns the parsed body.
    ///
    /// An empty body reads as `None`. Form-encoded bodies become a JSON
    /// object of strings; everything else is parsed as JSON.
    pub fn body_json(&self) -> DispatchResult<Option<&Value>> {
        self.parsed_body
            .get_or_init(|| parse_body(self.header(CONTENT_TYPE.as_str()), &self.body))
            .as_ref()
            .map(Option::as_ref)
            .map_err(|msg| DispatchError::extraction(msg.clone()))
    }

    /// Returns the parsed query string as a JSON object.
    ///
    /// Repeated keys collect into an array in order of appearance.
    pub fn query(&self) -> DispatchResult<&Map<String, Value>> {
        self.parsed_query
            .get_or_init(|| {
                let raw = self.uri.query().unwrap_or("");
                serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
                    .map(pairs_to_object)
                    .map_err(|e| format!("malformed query string: {e}"))
            })
            .as_ref()
            .map_err(|msg| DispatchError::extraction(msg.clone()))
    }
}

fn parse_body(content_type: Option<&str>, body: &Bytes) -> Result<Option<Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let is_form = content_type.is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE));
    if is_form {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map(|pairs| Some(Value::Object(pairs_to_object(pairs))))
            .map_err(|e| format!("malformed form body: {e}"))
    } else {
        serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| format!("malformed JSON body: {e}"))
    }
}

fn pairs_to_object(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match out.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

/// Builder for [`Request`], mostly used by tests and transport adapters.
///
/// # Example
///
/// ```
/// use hermes_core::Request;
/// use http::Method;
///
/// let request = Request::builder()
///     .method(Method::POST)
///     .uri("/users?active=true")
///     .json(&serde_json::json!({ "name": "ada" }))
///     .build();
///
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.body_json().unwrap().unwrap()["name"], "ada");
/// ```
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Method,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: PathParams,
    extensions: Extensions,
}

impl RequestBuilder {
    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. Unparsable URIs are ignored.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = Some(uri);
        }
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and content type.
    #[must_use]
    pub fn json(mut self, value: &Value) -> Self {
        self.body = Bytes::from(value.to_string());
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Inserts a typed value into the state bag.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        let uri = self.uri.unwrap_or_else(|| Uri::from_static("/"));
        let mut request = Request::new(self.method, uri, self.headers, self.body);
        request.path_params = self.path_params;
        request.extensions = self.extensions;
        request
    }
}

#[derive(Debug, Default)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    written: bool,
}

/// A shared, writable response.
///
/// Handlers that do not use auto-response write their answer through this
/// handle. Clones share the same underlying response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHandle {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseHandle {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.state.lock().status = status;
    }

    /// Returns the current status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.state.lock().status
    }

    /// Sets a header, replacing existing values.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.state.lock().headers.insert(name, value);
    }

    /// Sets a header from strings.
    pub fn set_header(&self, name: &str, value: &str) -> DispatchResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DispatchError::handler(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DispatchError::handler(format!("invalid header value: {e}")))?;
        self.insert_header(name, value);
        Ok(())
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> DispatchResult<()> {
        let body = serde_json::to_vec(value)?;
        let mut state = self.state.lock();
        state
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        state.body = Bytes::from(body);
        state.written = true;
        Ok(())
    }

    /// Writes a plain-text body.
    pub fn text(&self, text: impl Into<String>) {
        let mut state = self.state.lock();
        state.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        state.body = Bytes::from(text.into());
        state.written = true;
    }

    /// Marks the response as complete without a body.
    pub fn end(&self) {
        self.state.lock().written = true;
    }

    /// Returns true once a body was written or the response was ended.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.state.lock().written
    }

    /// Takes the accumulated response out of the handle.
    #[must_use]
    pub fn into_response(self) -> Response {
        let state = std::mem::take(&mut *self.state.lock());
        let mut response = http::Response::new(Full::new(state.body));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_verb_parsing() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!(" Patch ".parse::<Verb>().unwrap(), Verb::Patch);
        assert!("OPTIONS".parse::<Verb>().is_err());
        assert_eq!(Verb::from_method(&Method::DELETE), Some(Verb::Delete));
        assert_eq!(Verb::from_method(&Method::HEAD), None);
    }

    #[test]
    fn test_empty_body_reads_as_none() {
        let request = Request::builder().build();
        assert!(request.body_json().unwrap().is_none());

        let request = Request::builder().body("  \n").build();
        assert!(request.body_json().unwrap().is_none());
    }

    #[test]
    fn test_malformed_body_is_extraction_error() {
        let request = Request::builder().body("{not json").build();
        let err = request.body_json().unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_ERROR");
        // second read hits the cached failure
        assert!(request.body_json().is_err());
    }

    #[test]
    fn test_form_body() {
        let request = Request::builder()
            .header("content-type", "application/x-www-form-urlencoded")
            .body("name=ada&tag=a&tag=b")
            .build();
        let body = request.body_json().unwrap().unwrap();
        assert_eq!(body["name"], "ada");
        assert_eq!(body["tag"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_query_parsing() {
        let request = Request::builder()
            .uri("/search?q=rust&page=2&q=async")
            .build();
        let query = request.query().unwrap();
        assert_eq!(query["page"], "2");
        assert_eq!(query["q"], serde_json::json!(["rust", "async"]));

        let request = Request::builder().uri("/plain").build();
        assert!(request.query().unwrap().is_empty());
    }

    #[test]
    fn test_context_lives_in_extensions() {
        let mut request = Request::builder().extension(7_u32).build();
        assert!(request.context().is_none());
        request
            .extensions_mut()
            .insert(RequestContext::mock().with_handler("A.b"));
        assert_eq!(request.context().map(RequestContext::handler), Some("A.b"));
        assert_eq!(request.extensions().get::<u32>(), Some(&7));
    }

    #[tokio::test]
    async fn test_response_handle_json() {
        let handle = ResponseHandle::new();
        assert!(!handle.is_written());
        handle.set_status(StatusCode::CREATED);
        handle.set_header("x-custom", "yes").unwrap();
        handle.json(&serde_json::json!({ "ok": true })).unwrap();
        assert!(handle.is_written());

        let response = handle.clone().into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-custom"], "yes");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[test]
    fn test_path_params_json() {
        let params: PathParams = vec![("id".to_string(), "9".to_string())]
            .into_iter()
            .collect();
        assert_eq!(params.to_json(), serde_json::json!({ "id": "9" }));
        assert_eq!(params.len(), 1);
    }
}
