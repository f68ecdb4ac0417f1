use crate::error::MockError;
use crate::spec::document::{
    ExampleNode, OpenApiDocument, ParameterNode, PathItem, RequestBodyNode, ResponseNode,
    SchemaNode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

/// Resolves document-local `$ref` pointers to the node they name
///
/// Any node kind that may be written as a reference implements this trait:
///
/// ```yaml
/// parameters:
///   - $ref: "#/components/parameters/PageLimit"   # ParameterNode
/// content:
///   application/json:
///     schema:
///       $ref: "#/components/schemas/User"         # SchemaNode
/// ```
///
/// Chains of references are followed until a node without `$ref` is reached.
/// A pointer seen twice in one chain fails with [`MockError::CycleDetected`].
pub trait ResolveReference: Clone + DeserializeOwned {
    fn reference(&self) -> Option<&str>;

    fn resolve<'a>(&'a self, document: &OpenApiDocument) -> Result<Cow<'a, Self>, MockError> {
        match self.reference() {
            None => Ok(Cow::Borrowed(self)),
            Some(reference) => {
                let target = follow_reference(document.raw(), reference)?;
                let node = serde_json::from_value(target.clone()).map_err(|e| {
                    MockError::InvalidDocument(format!(
                        "Reference {} points at an unusable node: {}",
                        reference, e
                    ))
                })?;
                Ok(Cow::Owned(node))
            }
        }
    }
}

/// Follows `reference` (and any reference found at its target) through `root`
pub fn follow_reference<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, MockError> {
    let mut visited = HashSet::new();
    let mut current = reference.to_string();

    loop {
        if !visited.insert(current.clone()) {
            return Err(MockError::CycleDetected(current));
        }
        let target = lookup_pointer(root, &current)?;
        match target.get("$ref").and_then(Value::as_str) {
            Some(next) => current = next.to_string(),
            None => return Ok(target),
        }
    }
}

/// Walks a single `#/a/b/c` pointer without following nested references
fn lookup_pointer<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, MockError> {
    let unresolved = || MockError::ReferenceResolutionFailed(reference.to_string());

    let pointer = match reference.strip_prefix('#') {
        Some(pointer) => pointer,
        None => return Err(unresolved()),
    };
    if pointer.is_empty() {
        return Ok(root);
    }
    let pointer = pointer.strip_prefix('/').ok_or_else(unresolved)?;

    pointer.split('/').try_fold(root, |node, segment| {
        let key = segment.replace("~1", "/").replace("~0", "~");
        let child = match node {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        child.ok_or_else(unresolved)
    })
}

impl ResolveReference for SchemaNode {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl ResolveReference for ParameterNode {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Parameters merge: keys written next to the `$ref` override the target's
    fn resolve<'a>(&'a self, document: &OpenApiDocument) -> Result<Cow<'a, Self>, MockError> {
        match self.reference() {
            None => Ok(Cow::Borrowed(self)),
            Some(reference) => {
                let target = follow_reference(document.raw(), reference)?;
                let base: ParameterNode = serde_json::from_value(target.clone()).map_err(|e| {
                    MockError::InvalidDocument(format!(
                        "Reference {} points at an unusable parameter: {}",
                        reference, e
                    ))
                })?;
                Ok(Cow::Owned(self.merged_over(&base)))
            }
        }
    }
}

impl ResolveReference for RequestBodyNode {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl ResolveReference for ResponseNode {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl ResolveReference for ExampleNode {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl ResolveReference for PathItem {
    fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}
