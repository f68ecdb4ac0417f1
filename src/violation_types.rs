use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    TypeMismatch,
    EnumViolation,
    MissingRequired,
    CompositionMismatch,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::EnumViolation => "ENUM_VIOLATION",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::CompositionMismatch => "COMPOSITION_MISMATCH",
        }
    }
}

/// A single schema violation, qualified by the path of the offending value
/// (`""` for the root, `a.b[0]` below it).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ViolationKind,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ViolationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where a batch of violations was found, for log lines
#[derive(Debug, Clone, Copy)]
pub enum ValidationContext {
    Parameter,
    RequestBody,
}

impl ValidationContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parameter => "parameter",
            Self::RequestBody => "request body",
        }
    }
}
