use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_PATH_LENGTH: usize = 2048;
pub const MAX_REQUEST_BODY_SIZE: usize = 20 * 1024 * 1024;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const MAX_HEADER_NAME_LENGTH: usize = 256;
pub const MAX_HEADER_VALUE_LENGTH: usize = 8192;
pub const MAX_HEADERS_COUNT: usize = 64;

/// A validated, site-relative API path plus query parameters.
///
/// The core never speaks absolute URLs; the shell resolves paths against
/// its own origin. Query parameters are kept structured and encoded on
/// render so values are always escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiPath {
    path: String,
    query: Vec<(String, String)>,
}

impl ApiPath {
    pub fn new(path: impl Into<String>) -> Result<Self, HttpError> {
        let path = path.into();

        if path.is_empty() {
            return Err(HttpError::InvalidPath {
                path,
                reason: "path cannot be empty".to_string(),
            });
        }

        if !path.starts_with('/') {
            return Err(HttpError::InvalidPath {
                path,
                reason: "path must be site-relative and start with '/'".to_string(),
            });
        }

        if path.len() > MAX_PATH_LENGTH {
            return Err(HttpError::InvalidPath {
                path: format!("{}...", &path[..64]),
                reason: format!("path exceeds maximum length of {MAX_PATH_LENGTH} bytes"),
            });
        }

        if path.contains("..") {
            return Err(HttpError::InvalidPath {
                path,
                reason: "path cannot contain traversal sequences".to_string(),
            });
        }

        for c in path.chars() {
            if c.is_whitespace() || c.is_control() || c == '?' || c == '#' {
                return Err(HttpError::InvalidPath {
                    path,
                    reason: format!("invalid character '{}' in path", c.escape_default()),
                });
            }
        }

        Ok(Self {
            path,
            query: Vec::new(),
        })
    }

    /// Appends a query parameter; the value is percent-encoded on render.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Full request target, e.g. `/api/search?t=1712345678901`.
    #[must_use]
    pub fn rendered(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.query {
            serializer.append_pair(name, value);
        }
        format!("{}?{}", self.path, serializer.finish())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HttpHeaders {
    headers: Vec<(String, String)>,
}

impl HttpHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), HttpError> {
        if self.headers.len() >= MAX_HEADERS_COUNT {
            return Err(HttpError::TooManyHeaders {
                count: self.headers.len(),
                max: MAX_HEADERS_COUNT,
            });
        }

        let name = name.into();
        let value = value.into();

        Self::validate_header_name(&name)?;
        Self::validate_header_value(&value)?;

        let name_lower = name.to_lowercase();
        self.headers.retain(|(n, _)| n.to_lowercase() != name_lower);
        self.headers.push((name, value));

        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name_lower = name.to_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| n.to_lowercase() == name_lower)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn validate_header_name(name: &str) -> Result<(), HttpError> {
        if name.is_empty() {
            return Err(HttpError::InvalidHeader {
                name: name.to_string(),
                reason: "header name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_HEADER_NAME_LENGTH {
            return Err(HttpError::InvalidHeader {
                name: format!("{}...", &name[..32]),
                reason: format!(
                    "header name exceeds maximum length of {MAX_HEADER_NAME_LENGTH} bytes"
                ),
            });
        }

        for c in name.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(HttpError::InvalidHeader {
                    name: name.to_string(),
                    reason: format!("invalid character '{c}' in header name"),
                });
            }
        }

        let lower = name.to_lowercase();
        if lower == "host" || lower == "content-length" || lower == "transfer-encoding" {
            return Err(HttpError::InvalidHeader {
                name: name.to_string(),
                reason: "this header is managed automatically".to_string(),
            });
        }

        Ok(())
    }

    fn validate_header_value(value: &str) -> Result<(), HttpError> {
        if value.len() > MAX_HEADER_VALUE_LENGTH {
            return Err(HttpError::InvalidHeader {
                name: String::new(),
                reason: format!(
                    "header value exceeds maximum length of {MAX_HEADER_VALUE_LENGTH} bytes"
                ),
            });
        }

        for c in value.chars() {
            if c == '\r' || c == '\n' || c == '\0' {
                return Err(HttpError::InvalidHeader {
                    name: String::new(),
                    reason: "header value contains invalid characters (CR, LF, or NULL)"
                        .to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for HttpHeaders {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }

    #[must_use]
    pub const fn has_request_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    method: HttpMethod,
    path: ApiPath,
    headers: HttpHeaders,
    body: Option<Vec<u8>>,
    timeout_ms: u64,
    request_id: String,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: ApiPath) -> Self {
        Self {
            method,
            path,
            headers: HttpHeaders::new(),
            body: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn get(path: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self::new(HttpMethod::Get, ApiPath::new(path)?))
    }

    pub fn post(path: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self::new(HttpMethod::Post, ApiPath::new(path)?))
    }

    pub fn put(path: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self::new(HttpMethod::Put, ApiPath::new(path)?))
    }

    pub fn delete(path: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self::new(HttpMethod::Delete, ApiPath::new(path)?))
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, HttpError> {
        self.headers.insert(name, value)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Result<Self, HttpError> {
        if !self.method.has_request_body() {
            return Err(HttpError::InvalidRequest {
                reason: format!("{} requests cannot have a body", self.method.as_str()),
            });
        }

        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(HttpError::BodyTooLarge {
                size: body.len(),
                max: MAX_REQUEST_BODY_SIZE,
            });
        }

        self.body = Some(body);
        Ok(self)
    }

    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_vec(value).map_err(|e| HttpError::SerializationError {
            message: e.to_string(),
        })?;

        self.with_header("Content-Type", "application/json")?
            .with_body(body)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, HttpError> {
        if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
            return Err(HttpError::InvalidRequest {
                reason: format!("timeout must be between 1 and {MAX_TIMEOUT_MS} ms"),
            });
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    /// Headers that defeat every caching layer between client and server.
    /// Search correctness depends on this: results must reflect the
    /// latest resolution and match state.
    pub fn with_no_cache(self) -> Result<Self, HttpError> {
        self.with_header("Cache-Control", "no-cache, no-store, must-revalidate")?
            .with_header("Pragma", "no-cache")?
            .with_header("Expires", "0")
    }

    /// Timestamp query parameter that makes each request URL unique.
    #[must_use]
    pub fn with_cache_bust(mut self, now_ms: u64) -> Self {
        self.path = self.path.with_query("t", now_ms.to_string());
        self
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &ApiPath {
        &self.path
    }

    /// Full request target including the query string.
    #[must_use]
    pub fn url(&self) -> String {
        self.path.rendered()
    }

    #[must_use]
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Operation for HttpRequest {
    type Output = HttpResult;
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("too many headers: {count} exceeds maximum of {max}")]
    TooManyHeaders { count: usize, max: usize },

    #[error("request body too large: {size} bytes exceeds maximum of {max} bytes")]
    BodyTooLarge { size: usize, max: usize },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("connection failed: {message}")]
    ConnectionError { message: String },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl HttpError {
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionError { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    status: u16,
    headers: HttpHeaders,
    body: Vec<u8>,
    request_id: String,
    duration_ms: u64,
}

impl HttpResponse {
    #[must_use]
    pub fn new(
        status: u16,
        headers: HttpHeaders,
        body: Vec<u8>,
        request_id: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request_id,
            duration_ms,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::InvalidResponse {
            reason: format!("failed to parse JSON: {e}"),
        })
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

/// HTTP capability: the core hands a validated [`HttpRequest`] to the
/// shell and receives the [`HttpResult`] back as an event.
pub struct Http<Ev> {
    context: CapabilityContext<HttpRequest, Ev>,
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpRequest;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Http::new(self.context.map_event(f))
    }
}

impl<Ev> Http<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<HttpRequest, Ev>) -> Self {
        Self { context }
    }

    pub fn send<F>(&self, request: HttpRequest, make_event: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(request).await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rejects_empty() {
        assert!(ApiPath::new("").is_err());
    }

    #[test]
    fn test_path_rejects_relative() {
        assert!(matches!(
            ApiPath::new("api/report"),
            Err(HttpError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_path_rejects_traversal() {
        assert!(ApiPath::new("/api/../admin").is_err());
    }

    #[test]
    fn test_path_rejects_embedded_query() {
        assert!(ApiPath::new("/api/search?t=1").is_err());
    }

    #[test]
    fn test_path_rejects_whitespace_and_control() {
        assert!(ApiPath::new("/api/re port").is_err());
        assert!(ApiPath::new("/api/report\n").is_err());
    }

    #[test]
    fn test_path_renders_query_encoded() {
        let path = ApiPath::new("/api/search")
            .unwrap()
            .with_query("q", "black backpack");
        assert_eq!(path.rendered(), "/api/search?q=black+backpack");
    }

    #[test]
    fn test_path_without_query_renders_plain() {
        let path = ApiPath::new("/api/stats").unwrap();
        assert_eq!(path.rendered(), "/api/stats");
    }

    #[test]
    fn test_header_rejects_crlf_injection() {
        let mut headers = HttpHeaders::new();
        assert!(headers.insert("X-Custom", "value\r\nEvil: header").is_err());
    }

    #[test]
    fn test_header_rejects_reserved() {
        let mut headers = HttpHeaders::new();
        assert!(headers.insert("Host", "evil.com").is_err());
    }

    #[test]
    fn test_header_dedup_is_case_insensitive() {
        let mut headers = HttpHeaders::new();
        headers.insert("Accept", "text/html").unwrap();
        headers.insert("accept", "application/json").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("ACCEPT"), Some("application/json"));
    }

    #[test]
    fn test_request_builder_json() {
        let request = HttpRequest::post("/api/report")
            .unwrap()
            .with_json(&serde_json::json!({"query": "backpack"}))
            .unwrap();

        assert_eq!(request.method(), HttpMethod::Post);
        assert_eq!(request.headers().get("content-type"), Some("application/json"));
        assert!(request.body().is_some());
    }

    #[test]
    fn test_body_rejected_on_get() {
        assert!(HttpRequest::get("/api/stats")
            .unwrap()
            .with_body(vec![1, 2, 3])
            .is_err());
    }

    #[test]
    fn test_body_size_limit() {
        let result = HttpRequest::post("/api/report")
            .unwrap()
            .with_body(vec![0u8; MAX_REQUEST_BODY_SIZE + 1]);
        assert!(matches!(result, Err(HttpError::BodyTooLarge { .. })));
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(HttpRequest::get("/api/stats").unwrap().with_timeout_ms(0).is_err());
        assert!(HttpRequest::get("/api/stats")
            .unwrap()
            .with_timeout_ms(MAX_TIMEOUT_MS + 1)
            .is_err());
        assert!(HttpRequest::get("/api/stats").unwrap().with_timeout_ms(5000).is_ok());
    }

    #[test]
    fn test_no_cache_headers() {
        let request = HttpRequest::post("/api/search").unwrap().with_no_cache().unwrap();
        assert_eq!(
            request.headers().get("cache-control"),
            Some("no-cache, no-store, must-revalidate")
        );
        assert_eq!(request.headers().get("pragma"), Some("no-cache"));
        assert_eq!(request.headers().get("expires"), Some("0"));
    }

    #[test]
    fn test_cache_bust_appends_timestamp() {
        let request = HttpRequest::post("/api/search").unwrap().with_cache_bust(1_712_345_678_901);
        assert_eq!(request.url(), "/api/search?t=1712345678901");
    }

    #[test]
    fn test_method_properties() {
        assert!(HttpMethod::Get.is_idempotent());
        assert!(!HttpMethod::Post.is_idempotent());
        assert!(HttpMethod::Put.has_request_body());
        assert!(!HttpMethod::Delete.has_request_body());
    }

    #[test]
    fn test_response_json_parsing() {
        let body = serde_json::to_vec(&serde_json::json!({"success": true})).unwrap();
        let response = HttpResponse::new(200, HttpHeaders::new(), body, "req-1".into(), 12);

        assert!(response.is_success());
        let parsed: serde_json::Value = response.json().unwrap();
        assert_eq!(parsed["success"], true);
    }

    #[test]
    fn test_error_retryable() {
        assert!(HttpError::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(HttpError::ConnectionError {
            message: "refused".into()
        }
        .is_retryable());
        assert!(!HttpError::InvalidRequest {
            reason: "nope".into()
        }
        .is_retryable());
    }
}
