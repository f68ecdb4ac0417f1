//! Typed view of the parts of an OpenAPI 3.0 document the mock engine reads.
//!
//! Every node that may be written as `$ref` keeps the reference string next to
//! its own optional fields, so callers resolve first and then pattern-match on
//! plain data. The raw JSON tree stays on [`OpenApiDocument`] for pointer
//! lookups.

use crate::api_mock::HttpMethod;
use crate::error::MockError;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A parsed OpenAPI document: the typed path table plus the raw tree
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    raw: Value,
    paths: IndexMap<String, PathItem>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentRoot {
    #[serde(default)]
    paths: IndexMap<String, PathItem>,
}

impl OpenApiDocument {
    /// Builds the typed model from an already-parsed JSON tree
    pub fn from_value(raw: Value) -> Result<Self, MockError> {
        if !raw.is_object() {
            return Err(MockError::DocumentParse(
                "document root must be an object".to_string(),
            ));
        }
        let root: DocumentRoot = serde_json::from_value(raw.clone())?;
        Ok(Self {
            raw,
            paths: root.paths,
        })
    }

    /// The raw JSON tree, used for `$ref` pointer walks
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Path templates in declaration order
    pub fn paths(&self) -> &IndexMap<String, PathItem> {
        &self.paths
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterNode>,
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::GET => self.get.as_ref(),
            HttpMethod::PUT => self.put.as_ref(),
            HttpMethod::POST => self.post.as_ref(),
            HttpMethod::DELETE => self.delete.as_ref(),
            HttpMethod::OPTIONS => self.options.as_ref(),
            HttpMethod::HEAD => self.head.as_ref(),
            HttpMethod::PATCH => self.patch.as_ref(),
            HttpMethod::TRACE => self.trace.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, deserialize_with = "lenient")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterNode>,
    pub request_body: Option<RequestBodyNode>,
    #[serde(default)]
    pub responses: IndexMap<String, ResponseNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter as written, before reference merging. All fields are optional
/// because a `$ref` entry may override only some of them locally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterNode {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "in", default, deserialize_with = "lenient")]
    pub location: Option<ParameterLocation>,
    #[serde(default, deserialize_with = "lenient")]
    pub required: Option<bool>,
    pub schema: Option<SchemaNode>,
}

impl ParameterNode {
    /// Overlays the locally written keys on top of the referenced definition
    pub fn merged_over(&self, base: &ParameterNode) -> ParameterNode {
        ParameterNode {
            reference: None,
            name: self.name.clone().or_else(|| base.name.clone()),
            location: self.location.or(base.location),
            required: self.required.or(base.required),
            schema: self.schema.clone().or_else(|| base.schema.clone()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBodyNode {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub required: bool,
    #[serde(default)]
    pub content: IndexMap<String, MediaTypeNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseNode {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaTypeNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypeNode {
    pub schema: Option<SchemaNode>,
    pub example: Option<Value>,
    pub examples: Option<IndexMap<String, ExampleNode>>,
}

impl MediaTypeNode {
    /// True when the media type declares nothing a mock could be built from
    pub fn is_empty(&self) -> bool {
        self.schema.is_none()
            && self.example.is_none()
            && self.examples.as_ref().map_or(true, IndexMap::is_empty)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleNode {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    pub value: Option<Value>,
    pub external_value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub schema_type: Option<String>,
    #[serde(rename = "enum", default, deserialize_with = "lenient")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "field_names")]
    pub required: Vec<String>,
    pub properties: Option<IndexMap<String, SchemaNode>>,
    pub items: Option<Box<SchemaNode>>,
    pub any_of: Option<Vec<SchemaNode>>,
    pub one_of: Option<Vec<SchemaNode>>,
    pub all_of: Option<Vec<SchemaNode>>,
    #[serde(default, deserialize_with = "present")]
    pub example: Option<Value>,
    pub examples: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
}

impl SchemaNode {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type.as_str().to_string()),
            ..Self::default()
        }
    }

    /// The declared type, `None` when absent. Unknown names parse to
    /// [`SchemaType::Unknown`] so validation can reject them.
    pub fn kind(&self) -> Option<SchemaType> {
        self.schema_type
            .as_deref()
            .map(|t| SchemaType::from_str(t).unwrap_or(SchemaType::Unknown))
    }
}

/// Off-shape values (`type: [string, null]`, `format: 7`) read as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or(false))
}

/// `required` only counts as a list of names; a property-level
/// `required: true` is ignored
fn field_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Keeps an explicit `null`, which plain `Option<Value>` would drop
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    Unknown,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for SchemaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "null" => Ok(Self::Null),
            _ => Err(()),
        }
    }
}
