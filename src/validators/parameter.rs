use crate::api_mock::MatchedOperation;
use crate::error::MockError;
use crate::http_types::MockRequest;
use crate::spec::document::{OpenApiDocument, ParameterLocation, ParameterNode, SchemaNode, SchemaType};
use crate::spec::reference_resolver::ResolveReference;
use crate::validation_helpers::into_messages;
use crate::validators::schema::SchemaValidator;
use crate::violation_types::ValidationContext;
use serde_json::Value;

/// A parameter after `$ref` merging, with the fields validation needs
#[derive(Debug, Clone)]
pub struct EffectiveParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<SchemaNode>,
}

/// Validates the path, query and header parameters of a request
pub struct ParametersValidator<'d> {
    document: &'d OpenApiDocument,
    schemas: SchemaValidator<'d>,
}

impl<'d> ParametersValidator<'d> {
    pub fn new(document: &'d OpenApiDocument) -> Self {
        Self {
            document,
            schemas: SchemaValidator::new(document),
        }
    }

    /// Checks every declared parameter and returns all messages together
    pub fn validate(
        &self,
        request: &MockRequest,
        matched: &MatchedOperation,
    ) -> Result<Vec<String>, MockError> {
        let mut messages = Vec::new();

        for parameter in self.effective_parameters(matched)? {
            let raw = match parameter.location {
                ParameterLocation::Query => request.query_param(&parameter.name),
                ParameterLocation::Header => request.header(&parameter.name).map(str::to_string),
                ParameterLocation::Path => matched.path_params.get(&parameter.name).cloned(),
                // Cookie parameters are not read
                ParameterLocation::Cookie => None,
            };

            let raw = match raw {
                Some(raw) => raw,
                None => {
                    if parameter.required {
                        messages.push(format!(
                            "Missing required {} parameter '{}'",
                            parameter.location, parameter.name
                        ));
                    }
                    continue;
                }
            };

            let Some(schema) = &parameter.schema else { continue };
            let schema = schema.resolve(self.document)?;
            let value = self.coerce(&raw, &schema)?;
            let errors = self.schemas.validate(&value, &schema, &parameter.name)?;
            messages.extend(into_messages(errors, ValidationContext::Parameter));
        }

        Ok(messages)
    }

    /// Path-item parameters followed by operation parameters; an operation
    /// entry replaces a path-item entry with the same name and location.
    pub fn effective_parameters(
        &self,
        matched: &MatchedOperation,
    ) -> Result<Vec<EffectiveParameter>, MockError> {
        let mut effective: Vec<EffectiveParameter> = Vec::new();

        for node in matched
            .path_item_parameters
            .iter()
            .chain(&matched.operation.parameters)
        {
            let parameter = self.effective(node)?;
            match effective
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(existing) => *existing = parameter,
                None => effective.push(parameter),
            }
        }

        Ok(effective)
    }

    fn effective(&self, node: &ParameterNode) -> Result<EffectiveParameter, MockError> {
        let resolved = node.resolve(self.document)?;
        let name = resolved
            .name
            .clone()
            .ok_or_else(|| MockError::InvalidDocument("parameter without a name".to_string()))?;
        let location = resolved.location.ok_or_else(|| {
            MockError::InvalidDocument(format!("parameter '{}' has no location", name))
        })?;

        Ok(EffectiveParameter {
            name,
            location,
            required: resolved.is_required(),
            schema: resolved.schema.clone(),
        })
    }

    /// Best-effort conversion of a raw string to the schema's type. Values
    /// that do not convert stay strings so the type check reports them.
    fn coerce(&self, raw: &str, schema: &SchemaNode) -> Result<Value, MockError> {
        Ok(match schema.kind() {
            Some(SchemaType::Integer) => parse_leading_integer(raw)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            Some(SchemaType::Number) => parse_leading_float(raw)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            Some(SchemaType::Boolean) => match raw {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            Some(SchemaType::Array) => {
                let items = match &schema.items {
                    Some(items) => Some(items.resolve(self.document)?.into_owned()),
                    None => None,
                };
                let elements = raw
                    .split(',')
                    .map(|part| match &items {
                        Some(items) => self.coerce(part, items),
                        None => Ok(Value::String(part.to_string())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Array(elements)
            }
            _ => Value::String(raw.to_string()),
        })
    }
}

/// Reads an optionally signed run of leading digits (`"12abc"` is 12,
/// `"3.7"` is 3)
fn parse_leading_integer(raw: &str) -> Option<Value> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(|c: char| c == '+' || c == '-'));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }

    let literal = &trimmed[..sign_len + digits];
    match literal.parse::<i64>() {
        Ok(n) => Some(Value::from(n)),
        Err(_) => literal
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
    }
}

/// Reads the longest leading decimal literal (`"1.5e3kg"` is 1500)
fn parse_leading_float(raw: &str) -> Option<Value> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = usize::from(trimmed.starts_with(|c: char| c == '+' || c == '-'));

    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    trimmed[..end]
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
