//! Upload-time checks for OpenAPI bins.
//!
//! The mock engine tolerates loosely written documents. Bins are validated
//! strictly once, when they are stored, using the `openapiv3` model.

use crate::error::MockError;
use crate::spec::loader::parse_tree;
use openapiv3::{OpenAPI, Server};

/// Parses and validates an uploaded document as OpenAPI 3.0
pub fn ingest_document(bytes: &[u8]) -> Result<OpenAPI, MockError> {
    let tree = parse_tree(bytes)?;

    let version = tree
        .get("openapi")
        .and_then(|v| v.as_str())
        .ok_or_else(|| MockError::InvalidDocument("missing 'openapi' version".to_string()))?;
    if !version.starts_with("3.0") {
        return Err(MockError::InvalidDocument(format!(
            "unsupported OpenAPI version {}",
            version
        )));
    }

    serde_json::from_value(tree).map_err(|e| MockError::InvalidDocument(e.to_string()))
}

/// Advertises the bin's invoke URL as the first server
pub fn with_invoke_server(mut spec: OpenAPI, invoke_url: &str) -> OpenAPI {
    spec.servers.insert(
        0,
        Server {
            url: invoke_url.to_string(),
            ..Server::default()
        },
    );
    spec
}

/// One-line summary for logs: title, version and operation count
pub fn describe(spec: &OpenAPI) -> String {
    let operations: usize = spec
        .paths
        .paths
        .values()
        .filter_map(|path_item_ref| path_item_ref.as_item())
        .map(|path_item| path_item.iter().count())
        .sum();

    format!(
        "{} v{} ({} operations)",
        spec.info.title, spec.info.version, operations
    )
}
