use crate::error::MockError;
use crate::http_types::MockRequest;
use crate::media_type::{covers, essence, is_json};
use crate::spec::document::{MediaTypeNode, OpenApiDocument, Operation, RequestBodyNode};
use crate::spec::reference_resolver::ResolveReference;
use crate::validation_helpers::into_messages;
use crate::validators::schema::SchemaValidator;
use crate::violation_types::ValidationContext;
use serde_json::Value;

pub const UNSUPPORTED_CONTENT_TYPE: &str = "Missing or unsupported content type";
pub const MISSING_BODY: &str = "Missing request body";
pub const INVALID_JSON: &str = "Invalid JSON in request body";

/// Validates a request body against the operation's declared request body
///
/// One content type is considered per request: the one the client sent, or
/// the only declared one when the client sent none.
pub struct RequestBodyValidator<'d> {
    document: &'d OpenApiDocument,
    schemas: SchemaValidator<'d>,
}

impl<'d> RequestBodyValidator<'d> {
    pub fn new(document: &'d OpenApiDocument) -> Self {
        Self {
            document,
            schemas: SchemaValidator::new(document),
        }
    }

    pub fn validate(
        &self,
        request: &MockRequest,
        operation: &Operation,
    ) -> Result<Vec<String>, MockError> {
        let Some(request_body) = &operation.request_body else {
            return Ok(Vec::new());
        };
        let request_body = request_body.resolve(self.document)?;

        let selected = if request_body.content.is_empty() {
            None
        } else {
            match select_media_type(request, &request_body) {
                Some(selected) => Some(selected),
                None => return Ok(vec![UNSUPPORTED_CONTENT_TYPE.to_string()]),
            }
        };

        let text = request.body_text();
        if text.is_empty() {
            return Ok(if request_body.required {
                vec![MISSING_BODY.to_string()]
            } else {
                Vec::new()
            });
        }

        let Some((content_type, media)) = selected else {
            return Ok(Vec::new());
        };

        let value = if is_json(&content_type) {
            match serde_json::from_str::<Value>(text) {
                Ok(value) => value,
                Err(_) => return Ok(vec![INVALID_JSON.to_string()]),
            }
        } else {
            Value::String(text.to_string())
        };

        match &media.schema {
            Some(schema) => {
                let errors = self.schemas.validate(&value, schema, "")?;
                Ok(into_messages(errors, ValidationContext::RequestBody))
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Picks the declared media type for the request's `Content-Type`, falling
/// back to the single declared one when the header is absent
fn select_media_type<'b>(
    request: &MockRequest,
    request_body: &'b RequestBodyNode,
) -> Option<(String, &'b MediaTypeNode)> {
    let sent = request
        .header("content-type")
        .map(essence)
        .filter(|sent| !sent.is_empty());

    match sent {
        Some(sent) => request_body
            .content
            .iter()
            .find(|(declared, _)| covers(declared, &sent))
            .map(|(_, media)| (sent, media)),
        None if request_body.content.len() == 1 => request_body
            .content
            .iter()
            .next()
            .map(|(declared, media)| (essence(declared), media)),
        None => None,
    }
}
