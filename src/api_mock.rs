use crate::error::MockError;
use crate::spec::document::{OpenApiDocument, Operation, ParameterNode};
use crate::spec::reference_resolver::ResolveReference;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, warn};

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::PATCH => "PATCH",
            Self::HEAD => "HEAD",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::GET),
            "POST" => Ok(Self::POST),
            "PUT" => Ok(Self::PUT),
            "DELETE" => Ok(Self::DELETE),
            "PATCH" => Ok(Self::PATCH),
            "HEAD" => Ok(Self::HEAD),
            "OPTIONS" => Ok(Self::OPTIONS),
            "TRACE" => Ok(Self::TRACE),
            _ => Err(()),
        }
    }
}

/// An operation selected for a request, with its decoded path parameters
#[derive(Debug, Clone)]
pub struct MatchedOperation {
    pub template: String,
    pub operation: Operation,
    /// Parameters declared on the path item, shared by all of its operations
    pub path_item_parameters: Vec<ParameterNode>,
    pub path_params: IndexMap<String, String>,
}

/// A path template compiled to an anchored pattern
///
/// Every `{name}` matches exactly one non-empty segment, wherever it sits in
/// the segment. Everything else is literal.
#[derive(Debug, Clone)]
struct PathTemplate {
    template: String,
    pattern: Regex,
    names: Vec<String>,
}

impl PathTemplate {
    fn compile(template: &str) -> Result<Self, regex::Error> {
        let placeholder = PLACEHOLDER_RE
            .get_or_init(|| Regex::new(r"\{([^{}/]+)\}").expect("Invalid regex constant"));

        let mut pattern = String::from("^");
        let mut names = Vec::new();
        let mut literal_start = 0;
        for caps in placeholder.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            pattern.push_str(&regex::escape(&template[literal_start..whole.start()]));
            pattern.push_str("([^/]+)");
            names.push(name.as_str().to_string());
            literal_start = whole.end();
        }
        pattern.push_str(&regex::escape(&template[literal_start..]));
        pattern.push('$');

        Ok(Self {
            template: template.to_string(),
            pattern: Regex::new(&pattern)?,
            names,
        })
    }

    /// Decoded parameter values when `path` matches
    fn captures(&self, path: &str) -> Option<IndexMap<String, String>> {
        let caps = self.pattern.captures(path)?;
        let params = self
            .names
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, raw)| {
                let raw = raw?.as_str();
                let value = percent_decode_str(raw).decode_utf8_lossy().into_owned();
                Some((name.clone(), value))
            })
            .collect();
        Some(params)
    }
}

/// Matches request paths against a document's path templates
///
/// Templates are tried in declaration order: the first declared template that
/// matches and declares the request method wins, regardless of how specific
/// later templates are.
pub struct OperationMatcher {
    templates: Vec<PathTemplate>,
}

impl OperationMatcher {
    pub fn new(document: &OpenApiDocument) -> Self {
        let mut templates = Vec::with_capacity(document.paths().len());

        for template in document.paths().keys() {
            match PathTemplate::compile(template) {
                Ok(compiled) => templates.push(compiled),
                Err(e) => warn!(template = %template, error = %e, "skipping unroutable path template"),
            }
        }

        Self { templates }
    }

    /// Finds the operation for a method and request path
    pub fn find_operation(
        &self,
        document: &OpenApiDocument,
        method: &str,
        path: &str,
    ) -> Result<Option<MatchedOperation>, MockError> {
        let method = match HttpMethod::from_str(method) {
            Ok(method) => method,
            Err(()) => return Ok(None),
        };

        for compiled in &self.templates {
            let Some(path_params) = compiled.captures(path) else {
                continue;
            };
            let template = &compiled.template;

            let path_item = match document.paths().get(template) {
                Some(item) => item.resolve(document)?,
                None => continue,
            };
            let operation = match path_item.operation(method) {
                Some(operation) => operation.clone(),
                None => {
                    debug!(template = %template, method = method.as_str(), "path matched without method");
                    continue;
                }
            };

            debug!(template = %template, method = method.as_str(), "matched operation");
            return Ok(Some(MatchedOperation {
                template: template.clone(),
                operation,
                path_item_parameters: path_item.parameters.clone(),
                path_params,
            }));
        }

        Ok(None)
    }
}
