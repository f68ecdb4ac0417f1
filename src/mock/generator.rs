use crate::error::MockError;
use crate::spec::document::{OpenApiDocument, SchemaNode, SchemaType};
use crate::spec::reference_resolver::ResolveReference;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::{Map, Value};

/// Chooses among equally valid candidates (examples, enum values, branches)
pub trait RandomSource {
    /// Returns an index in `[0, n)`; `n` is never zero
    fn pick(&self, n: usize) -> usize;
}

impl<R: RandomSource + ?Sized> RandomSource for &R {
    fn pick(&self, n: usize) -> usize {
        (**self).pick(n)
    }
}

/// Uniform choice from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }
}

/// Always the first candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstChoice;

impl RandomSource for FirstChoice {
    fn pick(&self, _n: usize) -> usize {
        0
    }
}

/// A fixed index, clamped to the last candidate
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub usize);

impl RandomSource for FixedChoice {
    fn pick(&self, n: usize) -> usize {
        self.0.min(n - 1)
    }
}

pub const EXAMPLE_UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

const CANNED_FORMATS: &[(&str, &str)] = &[
    ("email", "user@example.com"),
    ("uuid", EXAMPLE_UUID),
    ("uri", "https://example.com"),
    ("url", "https://example.com"),
    ("hostname", "example.com"),
    ("ipv4", "192.0.2.1"),
    ("ipv6", "2001:db8::1"),
    ("byte", "c3RyaW5n"),
    ("password", "********"),
];

/// Builds representative values from schemas
///
/// Declared `examples`, `example` and `default` win over synthesis. A `$ref`
/// met again while already being expanded yields `null`, so recursive schemas
/// terminate.
pub struct ExampleGenerator<'d, R> {
    document: &'d OpenApiDocument,
    random: R,
}

impl<'d, R: RandomSource> ExampleGenerator<'d, R> {
    pub fn new(document: &'d OpenApiDocument, random: R) -> Self {
        Self { document, random }
    }

    pub fn generate(&self, schema: &SchemaNode) -> Result<Value, MockError> {
        let mut expanding = Vec::new();
        self.generate_node(schema, &mut expanding)
    }

    fn generate_node(
        &self,
        schema: &SchemaNode,
        expanding: &mut Vec<String>,
    ) -> Result<Value, MockError> {
        let reference = schema.reference.clone();
        if let Some(reference) = &reference {
            if expanding.contains(reference) {
                return Ok(Value::Null);
            }
            expanding.push(reference.clone());
        }

        let result = schema
            .resolve(self.document)
            .and_then(|resolved| self.synthesize(&resolved, expanding));

        if reference.is_some() {
            expanding.pop();
        }
        result
    }

    fn synthesize(
        &self,
        schema: &SchemaNode,
        expanding: &mut Vec<String>,
    ) -> Result<Value, MockError> {
        if let Some(Value::Array(examples)) = &schema.examples {
            if let Some(example) = self.choose(examples) {
                return Ok(example.clone());
            }
        }
        if let Some(example) = &schema.example {
            return Ok(example.clone());
        }
        if let Some(default) = &schema.default {
            return Ok(default.clone());
        }

        let kind = schema.kind();
        if !matches!(kind, Some(SchemaType::Object | SchemaType::Array)) {
            if let Some(value) = schema.enumeration.as_deref().and_then(|e| self.choose(e)) {
                return Ok(value.clone());
            }
        }

        match kind {
            Some(SchemaType::Object) => {
                let mut object = Map::new();
                if let Some(properties) = &schema.properties {
                    for (name, property) in properties {
                        object.insert(name.clone(), self.generate_node(property, expanding)?);
                    }
                }
                Ok(Value::Object(object))
            }
            Some(SchemaType::Array) => match &schema.items {
                Some(items) => Ok(Value::Array(vec![self.generate_node(items, expanding)?])),
                None => Ok(Value::Array(Vec::new())),
            },
            Some(SchemaType::String) => Ok(Value::String(example_for_format(
                schema.format.as_deref(),
            ))),
            Some(SchemaType::Number | SchemaType::Integer) => Ok(Value::from(0)),
            Some(SchemaType::Boolean) => Ok(Value::Bool(true)),
            Some(SchemaType::Null | SchemaType::Unknown) => Ok(Value::Null),
            None => self.synthesize_composition(schema, expanding),
        }
    }

    fn synthesize_composition(
        &self,
        schema: &SchemaNode,
        expanding: &mut Vec<String>,
    ) -> Result<Value, MockError> {
        for branches in [&schema.any_of, &schema.one_of].into_iter().flatten() {
            if let Some(branch) = self.choose(branches) {
                return self.generate_node(branch, expanding);
            }
        }

        if let Some(branches) = schema.all_of.as_ref().filter(|b| !b.is_empty()) {
            let mut merged = Map::new();
            for branch in branches {
                if let Value::Object(part) = self.generate_node(branch, expanding)? {
                    merged.extend(part);
                }
            }
            return Ok(Value::Object(merged));
        }

        Ok(Value::Null)
    }

    fn choose<'v, T>(&self, candidates: &'v [T]) -> Option<&'v T> {
        match candidates.len() {
            0 => None,
            1 => candidates.first(),
            n => candidates.get(self.random.pick(n)),
        }
    }
}

/// Canned string for a `format` hint; `"string"` when unknown
pub fn example_for_format(format: Option<&str>) -> String {
    match format {
        Some("date-time") => Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        Some("date") => Utc::now().format("%Y-%m-%d").to_string(),
        Some(format) => CANNED_FORMATS
            .iter()
            .find(|(name, _)| *name == format)
            .map_or("string", |(_, value)| value)
            .to_string(),
        None => "string".to_string(),
    }
}
