use crate::error::MockError;
use crate::spec::document::OpenApiDocument;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads an OpenAPI document from a JSON or YAML file
pub fn load_openapi_document(path: &Path) -> Result<OpenApiDocument, MockError> {
    let bytes = fs::read(path).map_err(|e| {
        MockError::DocumentParse(format!("Failed to open spec file {}: {}", path.display(), e))
    })?;

    let document = parse_document(&bytes)?;
    info!(
        path = %path.display(),
        paths = document.paths().len(),
        "loaded OpenAPI document"
    );
    Ok(document)
}

/// Parses stored document bytes. JSON is tried first; anything else is read
/// as YAML.
pub fn parse_document(bytes: &[u8]) -> Result<OpenApiDocument, MockError> {
    OpenApiDocument::from_value(parse_tree(bytes)?)
}

/// Parses JSON or YAML bytes into a JSON tree, keeping key order
pub fn parse_tree(bytes: &[u8]) -> Result<Value, MockError> {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        return Ok(value);
    }

    serde_yaml::from_slice(bytes)
        .map_err(|e| MockError::DocumentParse(format!("Failed to parse OpenAPI spec: {}", e)))
}
