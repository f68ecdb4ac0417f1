pub mod document;
pub mod ingest;
pub mod loader;
pub mod reference_resolver;

pub use document::{
    ExampleNode, MediaTypeNode, OpenApiDocument, Operation, ParameterLocation, ParameterNode,
    PathItem, RequestBodyNode, ResponseNode, SchemaNode, SchemaType,
};
pub use ingest::{describe, ingest_document, with_invoke_server};
pub use loader::{load_openapi_document, parse_document};
pub use reference_resolver::{follow_reference, ResolveReference};
