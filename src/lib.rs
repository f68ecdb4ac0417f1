pub mod api_mock;
pub mod bin_service;
pub mod config;
pub mod error;
pub mod http_types;
pub mod media_type;
pub mod mock;
pub mod spec;
pub mod validation_helpers;
pub mod validators;
pub mod violation_types;

pub use api_mock::{HttpMethod, MatchedOperation, OperationMatcher};
pub use bin_service::{
    is_openapi_bin, split_bin_path, BinResponse, DirectoryStore, DocumentStore, MockService,
    StaticResponse, StoreError,
};
pub use config::MockServerConfig;
pub use error::MockError;
pub use http_types::{MockRequest, MockResponse, ProblemDetails};
pub use mock::{ExampleGenerator, FirstChoice, FixedChoice, MockServer, RandomSource, ThreadRandom};
pub use spec::{load_openapi_document, parse_document, OpenApiDocument, ResolveReference};
pub use validators::{ParametersValidator, RequestBodyValidator, SchemaValidator};
pub use violation_types::{ValidationContext, ValidationError, ViolationKind};
