use crate::http_types::DEFAULT_PROBLEM_TYPE_BASE;
use serde::Deserialize;

/// Detail used for unexpected 500s when error details are redacted
pub const REDACTED_DETAIL: &str = "An unexpected error occurred while mocking this request.";

/// Runtime options for [`crate::mock::MockServer`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockServerConfig {
    /// Include the underlying message in unexpected 500 problem details
    pub expose_error_details: bool,
    /// Prefix of the problem `type` URI; the status code is appended
    pub problem_type_base: String,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            expose_error_details: true,
            problem_type_base: DEFAULT_PROBLEM_TYPE_BASE.to_string(),
        }
    }
}
