use crate::error::MockError;
use crate::spec::document::{OpenApiDocument, SchemaNode, SchemaType};
use crate::spec::reference_resolver::ResolveReference;
use crate::validation_helpers::{display_value, index_path, json_type_name, property_path};
use crate::violation_types::{ValidationError, ViolationKind};
use serde_json::Value;

/// Validates JSON values against schema nodes of one document
///
/// Violations accumulate across the whole value. Only a type mismatch stops
/// descent, and only into the mismatched node.
pub struct SchemaValidator<'d> {
    document: &'d OpenApiDocument,
}

impl<'d> SchemaValidator<'d> {
    pub fn new(document: &'d OpenApiDocument) -> Self {
        Self { document }
    }

    /// Validates `data` against `schema`; `path` qualifies reported fields
    pub fn validate(
        &self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
    ) -> Result<Vec<ValidationError>, MockError> {
        let mut errors = Vec::new();
        self.validate_into(data, schema, path, &mut Vec::new(), &mut errors)?;
        Ok(errors)
    }

    /// `expanding` holds the `$ref`s entered so far with the data path each
    /// was entered at. Meeting one again at the same path means the schema
    /// recurses without consuming any data.
    fn validate_into(
        &self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        expanding: &mut Vec<(String, String)>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), MockError> {
        let Some(reference) = &schema.reference else {
            return self.validate_node(data, schema, path, expanding, errors);
        };
        if expanding.iter().any(|(seen, at)| seen == reference && at == path) {
            return Err(MockError::CycleDetected(reference.clone()));
        }

        expanding.push((reference.clone(), path.to_string()));
        let result = self.validate_node(data, schema, path, expanding, errors);
        expanding.pop();
        result
    }

    fn validate_node(
        &self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        expanding: &mut Vec<(String, String)>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), MockError> {
        let schema = schema.resolve(self.document)?;
        let kind = schema.kind();

        if let (Some(kind), Some(declared)) = (kind, schema.schema_type.as_deref()) {
            if !matches_type(data, kind) {
                errors.push(ValidationError::new(
                    ViolationKind::TypeMismatch,
                    path,
                    format!(
                        "Expected type '{}' at path '{}', but got '{}'",
                        declared,
                        path,
                        json_type_name(data)
                    ),
                ));
                return Ok(());
            }
        }

        if let Some(allowed) = &schema.enumeration {
            if !allowed.iter().any(|candidate| values_equal(candidate, data)) {
                let listed: Vec<String> = allowed.iter().map(display_value).collect();
                errors.push(ValidationError::new(
                    ViolationKind::EnumViolation,
                    path,
                    format!(
                        "Value '{}' at path '{}' is not in enum [{}]",
                        display_value(data),
                        path,
                        listed.join(", ")
                    ),
                ));
            }
        }

        match kind {
            Some(SchemaType::Object) => {
                self.validate_object(data, &schema, path, expanding, errors)?
            }
            Some(SchemaType::Array) => match data.as_array() {
                Some(items) => {
                    if let Some(item_schema) = &schema.items {
                        for (i, item) in items.iter().enumerate() {
                            let item_path = index_path(path, i);
                            self.validate_into(item, item_schema, &item_path, expanding, errors)?;
                        }
                    }
                }
                None => errors.push(ValidationError::new(
                    ViolationKind::TypeMismatch,
                    path,
                    format!(
                        "Expected an array at path '{}', but got '{}'",
                        path,
                        json_type_name(data)
                    ),
                )),
            },
            _ => {}
        }

        self.validate_composition(data, &schema, path, expanding, errors)
    }

    fn validate_object(
        &self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        expanding: &mut Vec<(String, String)>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), MockError> {
        for name in &schema.required {
            if data.get(name).is_none() {
                let field = property_path(path, name);
                errors.push(ValidationError::new(
                    ViolationKind::MissingRequired,
                    field.clone(),
                    format!("Missing required field '{}'", field),
                ));
            }
        }

        if let Some(properties) = &schema.properties {
            for (name, property) in properties {
                if let Some(value) = data.get(name) {
                    let field = property_path(path, name);
                    self.validate_into(value, property, &field, expanding, errors)?;
                }
            }
        }
        Ok(())
    }

    fn validate_composition(
        &self,
        data: &Value,
        schema: &SchemaNode,
        path: &str,
        expanding: &mut Vec<(String, String)>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), MockError> {
        if let Some(branches) = &schema.all_of {
            for branch in branches {
                self.validate_into(data, branch, path, expanding, errors)?;
            }
        }

        for (keyword, branches) in [("anyOf", &schema.any_of), ("oneOf", &schema.one_of)] {
            let Some(branches) = branches else { continue };
            if branches.is_empty() {
                continue;
            }
            let mut matched = false;
            for branch in branches {
                let mut branch_errors = Vec::new();
                self.validate_into(data, branch, path, expanding, &mut branch_errors)?;
                if branch_errors.is_empty() {
                    matched = true;
                    break;
                }
            }
            if !matched {
                errors.push(ValidationError::new(
                    ViolationKind::CompositionMismatch,
                    path,
                    format!(
                        "Value at path '{}' does not match any schema in {}",
                        path, keyword
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Runtime type check; `integer` accepts only whole numbers
pub fn matches_type(data: &Value, kind: SchemaType) -> bool {
    match kind {
        SchemaType::String => data.is_string(),
        SchemaType::Number => data.as_f64().map_or(false, f64::is_finite),
        SchemaType::Integer => {
            data.is_i64()
                || data.is_u64()
                || data.as_f64().map_or(false, |n| n.is_finite() && n.fract() == 0.0)
        }
        SchemaType::Boolean => data.is_boolean(),
        SchemaType::Object => data.is_object(),
        SchemaType::Array => data.is_array(),
        SchemaType::Null => data.is_null(),
        SchemaType::Unknown => false,
    }
}

/// Equality where `1` and `1.0` are the same number
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
