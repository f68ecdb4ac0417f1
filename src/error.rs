use thiserror::Error;

pub const NO_MOCKABLE_DETAIL: &str = "Unable to Mock. No mockable information found for this path.";

#[derive(Error, Debug)]
pub enum MockError {
    #[error("No matching operation for {method} {url}")]
    NoMatchingOperation { method: String, url: String },

    #[error("Invalid parameters")]
    ParameterValidationFailed(Vec<String>),

    #[error("Invalid request body")]
    BodyValidationFailed(Vec<String>),

    #[error("No acceptable content type. Available: {}", .available.join(", "))]
    NotAcceptable { available: Vec<String> },

    #[error("{}", NO_MOCKABLE_DETAIL)]
    NoMockableResponse,

    #[error("Cannot resolve reference: {0}")]
    ReferenceResolutionFailed(String),

    #[error("Circular reference detected: {0}")]
    CycleDetected(String),

    #[error("Failed to parse OpenAPI document: {0}")]
    DocumentParse(String),

    #[error("Invalid OpenAPI document: {0}")]
    InvalidDocument(String),

    #[error("Invalid bin response: {0}")]
    InvalidBinResponse(String),

    #[error("Bin '{0}' not found")]
    BinNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Unhandled(String),
}

impl MockError {
    /// HTTP status the error is reported with
    pub fn status(&self) -> u16 {
        match self {
            Self::NoMatchingOperation { .. } | Self::BinNotFound(_) => 404,
            Self::ParameterValidationFailed(_) | Self::BodyValidationFailed(_) => 400,
            Self::NotAcceptable { .. } => 406,
            Self::NoMockableResponse
            | Self::ReferenceResolutionFailed(_)
            | Self::CycleDetected(_)
            | Self::DocumentParse(_)
            | Self::InvalidDocument(_)
            | Self::InvalidBinResponse(_)
            | Self::Storage(_)
            | Self::Unhandled(_) => 500,
        }
    }

    /// Messages carried in the problem body's `errors` list
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            Self::ParameterValidationFailed(errors) | Self::BodyValidationFailed(errors) => {
                Some(errors)
            }
            _ => None,
        }
    }

    /// Whether the error reflects a defect in the document or engine rather
    /// than an expected mock outcome. These are the details subject to redaction.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            Self::ReferenceResolutionFailed(_)
                | Self::CycleDetected(_)
                | Self::DocumentParse(_)
                | Self::InvalidDocument(_)
                | Self::InvalidBinResponse(_)
                | Self::Storage(_)
                | Self::Unhandled(_)
        )
    }
}

impl From<serde_json::Error> for MockError {
    fn from(e: serde_json::Error) -> Self {
        Self::DocumentParse(e.to_string())
    }
}
