pub mod parameter;
pub mod request;
pub mod schema;

pub use parameter::{EffectiveParameter, ParametersValidator};
pub use request::RequestBodyValidator;
pub use schema::SchemaValidator;
