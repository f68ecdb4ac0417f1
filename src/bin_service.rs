//! Serving stored bins, one document per bin.
//!
//! A bin is addressed by the first path segment of the request. Ids ending in
//! `_oas` hold an OpenAPI document and the rest of the path is matched against
//! it. Any other bin holds a fixed response that is returned for every request.

use crate::config::MockServerConfig;
use crate::error::MockError;
use crate::http_types::{MockRequest, MockResponse};
use crate::mock::generator::{RandomSource, ThreadRandom};
use crate::mock::server::{problem_response, MockServer};
use crate::spec::loader::parse_document;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No document stored for bin '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for MockError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(bin_id) => MockError::BinNotFound(bin_id),
            StoreError::Backend(message) => MockError::Storage(message),
        }
    }
}

/// Suffix of bin ids whose document is an OpenAPI description
pub const OPENAPI_BIN_SUFFIX: &str = "_oas";

pub fn is_openapi_bin(bin_id: &str) -> bool {
    bin_id.ends_with(OPENAPI_BIN_SUFFIX)
}

/// Stored document of a fixed-response bin
#[derive(Debug, Clone, Deserialize)]
pub struct BinResponse {
    pub response: StaticResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticResponse {
    pub status: u16,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl StaticResponse {
    pub fn into_response(self) -> Result<MockResponse, MockError> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| MockError::InvalidBinResponse(format!("status {} is out of range", self.status)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                MockError::InvalidBinResponse(format!("header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                MockError::InvalidBinResponse(format!("value of header '{}': {}", name, e))
            })?;
            headers.append(header_name, header_value);
        }

        Ok(MockResponse {
            status: status.as_u16(),
            status_text: self.status_text,
            headers,
            body: self.body.unwrap_or_default(),
        })
    }
}

/// Source of stored bin documents
pub trait DocumentStore {
    fn fetch_document(&self, bin_id: &str) -> Result<Vec<u8>, StoreError>;
}

/// Storage key of a bin's document
pub fn document_key(bin_id: &str) -> String {
    format!("{}.json", bin_id)
}

/// Reads `<root>/<bin_id>.json`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentStore for DirectoryStore {
    fn fetch_document(&self, bin_id: &str) -> Result<Vec<u8>, StoreError> {
        let unsafe_id = bin_id.contains(|c: char| c == '/' || c == '\\') || bin_id.starts_with('.');
        if bin_id.is_empty() || unsafe_id {
            return Err(StoreError::NotFound(bin_id.to_string()));
        }

        let path = self.root.join(document_key(bin_id));
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(bin_id.to_string()),
            _ => StoreError::Backend(format!("Failed to read {}: {}", path.display(), e)),
        })
    }
}

/// Splits `/<binId>/rest` into the bin id and the bin-relative path
pub fn split_bin_path(path: &str) -> Option<(String, String)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (bin_id, rest) = match trimmed.split_once('/') {
        Some((bin_id, rest)) => (bin_id, format!("/{}", rest)),
        None => (trimmed, "/".to_string()),
    };
    if bin_id.is_empty() {
        return None;
    }
    Some((bin_id.to_string(), rest))
}

/// Mock endpoint over a [`DocumentStore`]
///
/// The document is fetched and parsed per request, so edits to a bin take
/// effect on the next call.
pub struct MockService<S, R = ThreadRandom> {
    store: S,
    config: MockServerConfig,
    random: R,
}

impl<S: DocumentStore> MockService<S, ThreadRandom> {
    pub fn new(store: S) -> Self {
        Self::with_random(store, ThreadRandom)
    }
}

impl<S: DocumentStore, R: RandomSource> MockService<S, R> {
    pub fn with_random(store: S, random: R) -> Self {
        Self {
            store,
            config: MockServerConfig::default(),
            random,
        }
    }

    pub fn with_config(mut self, config: MockServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Serves a request whose URL path is already relative to the bin
    pub fn handle(&self, bin_id: &str, request: &MockRequest) -> MockResponse {
        self.serve(bin_id, request, request.url.path())
    }

    /// Serves a request addressed as `/<binId>/<path>`
    pub fn handle_routed(&self, request: &MockRequest) -> MockResponse {
        let Some((bin_id, rest)) = split_bin_path(request.url.path()) else {
            let error = MockError::NoMatchingOperation {
                method: request.method.to_uppercase(),
                url: request.url.to_string(),
            };
            return problem_response(&self.config, &error);
        };

        debug!(bin = %bin_id, path = %rest, "routing to bin");
        self.serve(&bin_id, request, &rest)
    }

    fn serve(&self, bin_id: &str, request: &MockRequest, path: &str) -> MockResponse {
        let result = if is_openapi_bin(bin_id) {
            self.server_for(bin_id)
                .map(|server| server.handle_request_at(request, path))
        } else {
            self.stored_response(bin_id)
        };
        result.unwrap_or_else(|e| problem_response(&self.config, &e))
    }

    fn server_for(&self, bin_id: &str) -> Result<MockServer<&R>, MockError> {
        let bytes = self.store.fetch_document(bin_id)?;
        let document = parse_document(&bytes)?;
        Ok(MockServer::with_random(document, &self.random).with_config(self.config.clone()))
    }

    fn stored_response(&self, bin_id: &str) -> Result<MockResponse, MockError> {
        let bytes = self.store.fetch_document(bin_id)?;
        let stored: BinResponse = serde_json::from_slice(&bytes)
            .map_err(|e| MockError::InvalidBinResponse(e.to_string()))?;
        debug!(bin = %bin_id, status = stored.response.status, "serving stored response");
        stored.response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::generator::FirstChoice;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    const ORDERS: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Orders", "version": "1"},
        "paths": {
            "/orders/{id}": {
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {"application/json": {"example": {"id": "o-1"}}}
                        }
                    }
                }
            }
        }
    }"#;

    const FIXED: &str = r#"{
        "response": {
            "status": 202,
            "statusText": "Queued",
            "headers": {"Content-Type": "text/plain", "X-Bin": "fixed"},
            "body": "on its way"
        }
    }"#;

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn fetch_document(&self, _bin_id: &str) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Backend("bucket unavailable".into()))
        }
    }

    fn store() -> (TempDir, DirectoryStore) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("abc123_oas.json"), ORDERS).unwrap();
        fs::write(dir.path().join("garbled_oas.json"), "{ not: [valid").unwrap();
        fs::write(dir.path().join("garbled.json"), "{ not: [valid").unwrap();
        fs::write(dir.path().join("fixed.json"), FIXED).unwrap();
        fs::write(dir.path().join("teapot.json"), r#"{"response": {"status": 418}}"#).unwrap();
        fs::write(dir.path().join("broken.json"), r#"{"response": {"status": 42}}"#).unwrap();
        let store = DirectoryStore::new(dir.path());
        (dir, store)
    }

    fn get(url: &str) -> MockRequest {
        MockRequest::new("GET", url).unwrap()
    }

    fn detail(response: &MockResponse) -> Value {
        serde_json::from_str::<Value>(&response.body).unwrap()["detail"].clone()
    }

    #[rstest]
    #[case("/abc123/orders/7", Some(("abc123", "/orders/7")))]
    #[case("/abc123", Some(("abc123", "/")))]
    #[case("/abc123/", Some(("abc123", "/")))]
    #[case("/", None)]
    #[case("", None)]
    fn splits_bin_paths(#[case] path: &str, #[case] expected: Option<(&str, &str)>) {
        let expected = expected.map(|(bin, rest)| (bin.to_string(), rest.to_string()));
        assert_eq!(split_bin_path(path), expected);
    }

    #[test]
    fn serves_stored_documents() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let response = service.handle_routed(&get("http://localhost/abc123_oas/orders/7?x=1"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"id":"o-1"}"#);
    }

    #[test]
    fn unknown_bins_are_not_found() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let response = service.handle_routed(&get("http://localhost/missing/orders/7"));
        assert_eq!(response.status, 404);
        assert_eq!(detail(&response), json!("Bin 'missing' not found"));

        let traversal = service.handle("../abc123_oas", &get("http://localhost/orders/7"));
        assert_eq!(traversal.status, 404);
    }

    #[test]
    fn unparseable_documents_and_backend_failures_are_server_errors() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);
        assert_eq!(service.handle("garbled_oas", &get("http://localhost/orders/7")).status, 500);

        let failing = MockService::with_random(FailingStore, FirstChoice);
        let response = failing.handle("abc123_oas", &get("http://localhost/orders/7"));
        assert_eq!(response.status, 500);
        assert_eq!(detail(&response), json!("Storage error: bucket unavailable"));
    }

    #[test]
    fn paths_outside_the_bin_document_are_not_matched() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let response = service.handle_routed(&get("http://localhost/abc123_oas/pets?page=2"));
        assert_eq!(response.status, 404);
        assert_eq!(
            detail(&response),
            json!("No matching operation for GET http://localhost/abc123_oas/pets?page=2")
        );
    }

    #[rstest]
    #[case("http://localhost/fixed")]
    #[case("http://localhost/fixed/any/path?at=all")]
    fn plain_bins_replay_their_stored_response(#[case] url: &str) {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let response = service.handle_routed(&MockRequest::new("DELETE", url).unwrap());
        assert_eq!(response.status, 202);
        assert_eq!(response.reason(), "Queued");
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.headers.get("x-bin").map(|v| v.as_bytes()), Some(&b"fixed"[..]));
        assert_eq!(response.body, "on its way");
    }

    #[test]
    fn stored_responses_default_to_an_empty_body() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let response = service.handle("teapot", &get("http://localhost/"));
        assert_eq!(response.status, 418);
        assert_eq!(response.reason(), "I'm a teapot");
        assert!(response.headers.is_empty());
        assert_eq!(response.body, "");
    }

    #[test]
    fn malformed_stored_responses_are_server_errors() {
        let (_dir, store) = store();
        let service = MockService::with_random(store, FirstChoice);

        let out_of_range = service.handle("broken", &get("http://localhost/"));
        assert_eq!(out_of_range.status, 500);
        assert_eq!(
            detail(&out_of_range),
            json!("Invalid bin response: status 42 is out of range")
        );

        let unparseable = service.handle("garbled", &get("http://localhost/"));
        assert_eq!(unparseable.status, 500);
    }

    #[test]
    fn only_oas_suffixed_bins_are_mocked_from_documents() {
        assert!(is_openapi_bin("abc123_oas"));
        assert!(!is_openapi_bin("abc123"));
        assert!(!is_openapi_bin("oas_abc123"));
    }
}
