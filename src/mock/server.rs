use crate::api_mock::OperationMatcher;
use crate::config::{MockServerConfig, REDACTED_DETAIL};
use crate::error::MockError;
use crate::http_types::{MockRequest, MockResponse, ProblemDetails};
use crate::media_type::is_json;
use crate::mock::generator::{ExampleGenerator, RandomSource, ThreadRandom};
use crate::mock::negotiation::negotiate;
use crate::spec::document::{MediaTypeNode, OpenApiDocument, Operation, ResponseNode};
use crate::spec::reference_resolver::ResolveReference;
use crate::validators::{ParametersValidator, RequestBodyValidator};
use http::HeaderValue;
use serde_json::Value;
use tracing::{debug, warn};

/// Response keys tried in order before falling back to the first declared one
const PREFERRED_RESPONSE_KEYS: [&str; 2] = ["200", "default"];

/// Answers requests from an OpenAPI document
///
/// A request is matched to an operation, its parameters and body are checked,
/// a response media type is negotiated and a body is taken from the declared
/// examples or generated from the schema. Every failure becomes a problem
/// response.
pub struct MockServer<R = ThreadRandom> {
    document: OpenApiDocument,
    matcher: OperationMatcher,
    config: MockServerConfig,
    random: R,
}

impl MockServer<ThreadRandom> {
    pub fn new(document: OpenApiDocument) -> Self {
        Self::with_random(document, ThreadRandom)
    }
}

impl<R: RandomSource> MockServer<R> {
    pub fn with_random(document: OpenApiDocument, random: R) -> Self {
        let matcher = OperationMatcher::new(&document);
        Self {
            document,
            matcher,
            config: MockServerConfig::default(),
            random,
        }
    }

    pub fn with_config(mut self, config: MockServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    pub fn config(&self) -> &MockServerConfig {
        &self.config
    }

    /// Produces the mock response for a request; never fails
    pub fn handle_request(&self, request: &MockRequest) -> MockResponse {
        self.handle_request_at(request, request.url.path())
    }

    /// Like [`handle_request`](Self::handle_request), but matches `path`
    /// instead of the URL's own path. Problems still report the full URL.
    pub fn handle_request_at(&self, request: &MockRequest, path: &str) -> MockResponse {
        match self.respond_at(request, path) {
            Ok(response) => response,
            Err(e) => problem_response(&self.config, &e),
        }
    }

    /// Runs the mock pipeline, returning the first stage failure as an error
    pub fn respond(&self, request: &MockRequest) -> Result<MockResponse, MockError> {
        self.respond_at(request, request.url.path())
    }

    pub fn respond_at(&self, request: &MockRequest, path: &str) -> Result<MockResponse, MockError> {
        let matched = self
            .matcher
            .find_operation(&self.document, &request.method, path)?
            .ok_or_else(|| MockError::NoMatchingOperation {
                method: request.method.to_uppercase(),
                url: request.url.to_string(),
            })?;
        debug!(method = %request.method, template = %matched.template, "matched");

        let param_errors = ParametersValidator::new(&self.document).validate(request, &matched)?;
        if !param_errors.is_empty() {
            return Err(MockError::ParameterValidationFailed(param_errors));
        }

        let body_errors =
            RequestBodyValidator::new(&self.document).validate(request, &matched.operation)?;
        if !body_errors.is_empty() {
            return Err(MockError::BodyValidationFailed(body_errors));
        }
        debug!(template = %matched.template, "request validated");

        let (status_key, response) =
            select_response(&matched.operation).ok_or(MockError::NoMockableResponse)?;
        let response = response.resolve(&self.document)?;
        if response.content.is_empty() {
            return Err(MockError::NoMockableResponse);
        }

        let available: Vec<&str> = response.content.keys().map(String::as_str).collect();
        let media_type = negotiate(request.header("accept"), &available).ok_or_else(|| {
            MockError::NotAcceptable {
                available: available.iter().map(|s| s.to_string()).collect(),
            }
        })?;
        debug!(status = %status_key, media_type, "negotiated response");

        let media = response
            .content
            .get(media_type)
            .ok_or(MockError::NoMockableResponse)?;
        let value = self.mock_body(media)?;
        let body = render_body(media_type, &value)?;
        let content_type = HeaderValue::from_str(media_type).map_err(|e| {
            MockError::Unhandled(format!("Invalid media type '{}': {}", media_type, e))
        })?;

        Ok(MockResponse::new(status_code(status_key), content_type, body))
    }

    /// Named examples, then the inline example, then a schema-generated value
    fn mock_body(&self, media: &MediaTypeNode) -> Result<Value, MockError> {
        if let Some(examples) = media.examples.as_ref().filter(|e| !e.is_empty()) {
            let index = match examples.len() {
                1 => 0,
                n => self.random.pick(n),
            };
            if let Some((name, example)) = examples.get_index(index) {
                let example = example.resolve(&self.document)?;
                if let Some(value) = &example.value {
                    debug!(example = %name, "using named example");
                    return Ok(value.clone());
                }
            }
        }

        if let Some(example) = &media.example {
            return Ok(example.clone());
        }

        match &media.schema {
            Some(schema) => ExampleGenerator::new(&self.document, &self.random).generate(schema),
            None => Err(MockError::NoMockableResponse),
        }
    }
}

fn select_response(operation: &Operation) -> Option<(&str, &ResponseNode)> {
    PREFERRED_RESPONSE_KEYS
        .iter()
        .find_map(|key| operation.responses.get_key_value(*key))
        .or_else(|| operation.responses.first())
        .map(|(key, response)| (key.as_str(), response))
}

/// Numeric response keys become the status; `default` and ranges give 200
fn status_code(key: &str) -> u16 {
    key.parse().unwrap_or(200)
}

fn render_body(media_type: &str, value: &Value) -> Result<String, MockError> {
    if is_json(media_type) {
        return serde_json::to_string(value)
            .map_err(|e| MockError::Unhandled(format!("Failed to serialize mock body: {}", e)));
    }
    Ok(match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

/// Converts an error into a problem response, redacting unexpected details
/// when configured to
pub(crate) fn problem_response(config: &MockServerConfig, error: &MockError) -> MockResponse {
    let status = error.status();
    let detail = if error.is_unexpected() && !config.expose_error_details {
        REDACTED_DETAIL.to_string()
    } else {
        error.to_string()
    };

    if error.is_unexpected() {
        warn!(status, error = %error, "mock request failed");
    } else {
        debug!(status, error = %error, "responding with problem");
    }

    let mut problem = ProblemDetails::new(&config.problem_type_base, status, detail);
    if let Some(messages) = error.messages() {
        problem = problem.with_errors(messages.to_vec());
    }
    problem.into_response()
}
