use crate::error::MockError;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use url::Url;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";
pub const DEFAULT_PROBLEM_TYPE_BASE: &str = "https://httpproblems.com/http-status/";

/// An incoming request with its body already read once
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl MockRequest {
    pub fn new(method: impl Into<String>, url: &str) -> Result<Self, MockError> {
        let url = Url::parse(url)
            .map_err(|e| MockError::Unhandled(format!("Invalid request URL '{}': {}", url, e)))?;
        Ok(Self {
            method: method.into(),
            url,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Appends a header; repeated names keep every value
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, MockError> {
        let name = HeaderName::try_from(name)
            .map_err(|e| MockError::Unhandled(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| MockError::Unhandled(format!("invalid value for header '{}': {}", name, e)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of a header as text; values that are not visible ASCII
    /// read as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// First value of a query-string parameter, percent-decoded
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Body text, empty when none was sent
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    /// Reason phrase to send instead of the canonical one
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, content_type: HeaderValue, body: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);
        Self {
            status,
            status_text: None,
            headers,
            body,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// `status_text` when set, else the canonical reason phrase
    pub fn reason(&self) -> &str {
        self.status_text
            .as_deref()
            .unwrap_or_else(|| status_title(self.status))
    }
}

/// RFC 7807 style error body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ProblemDetails {
    pub fn new(type_base: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            problem_type: format!("{}{}", type_base, status),
            title: status_title(status).to_string(),
            status,
            detail: detail.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn into_response(self) -> MockResponse {
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            format!(r#"{{"status":{},"title":"{}"}}"#, self.status, self.title)
        });
        MockResponse::new(self.status, HeaderValue::from_static(PROBLEM_CONTENT_TYPE), body)
    }
}

/// Canonical reason phrase for a status code
pub fn status_title(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn header_lookup_ignores_case() {
        let request = MockRequest::new("GET", "http://localhost/")
            .unwrap()
            .with_header("Content-Type", "text/plain")
            .unwrap()
            .with_header("X-Trace", "1")
            .unwrap();
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("x-TRACE"), Some("1"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn repeated_headers_keep_the_first_value_first() {
        let request = MockRequest::new("GET", "http://localhost/")
            .unwrap()
            .with_header("banana", "1")
            .unwrap()
            .with_header("Banana", "2")
            .unwrap();
        assert_eq!(request.header("banana"), Some("1"));
        assert_eq!(request.headers.get_all("banana").iter().count(), 2);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let request = MockRequest::new("GET", "http://localhost/").unwrap();
        assert!(request.clone().with_header("bad name", "x").is_err());
        assert!(request.with_header("x-ok", "line\nbreak").is_err());
    }

    #[test]
    fn titles_follow_the_status_registry() {
        assert_eq!(status_title(404), "Not Found");
        assert_eq!(status_title(418), "I'm a teapot");
        assert_eq!(status_title(429), "Too Many Requests");
        assert_eq!(status_title(599), "Unknown Error");
        assert_eq!(status_title(42), "Unknown Error");
    }

    #[test]
    fn reason_prefers_the_explicit_status_text() {
        let mut response = MockResponse::new(200, HeaderValue::from_static("text/plain"), String::new());
        assert_eq!(response.reason(), "OK");
        response.status_text = Some("Fine".into());
        assert_eq!(response.reason(), "Fine");
    }

    #[test]
    fn reads_first_query_value_decoded() {
        let request = MockRequest::new("GET", "http://localhost/a?tag=x%20y&tag=z").unwrap();
        assert_eq!(request.query_param("tag").as_deref(), Some("x y"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn problem_bodies_omit_absent_errors() {
        let response = ProblemDetails::new(DEFAULT_PROBLEM_TYPE_BASE, 404, "gone").into_response();
        assert_eq!(response.status, 404);
        assert_eq!(response.content_type(), Some(PROBLEM_CONTENT_TYPE));

        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "https://httpproblems.com/http-status/404",
                "title": "Not Found",
                "status": 404,
                "detail": "gone"
            })
        );
    }
}
