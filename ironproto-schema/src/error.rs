//! Error types for schema parsing and validation.

use thiserror::Error;

/// Error type for schema parsing operations.
///
/// Covers both textual forms: the canonical JSON document and the
/// interface-definition language.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed JSON in a canonical schema document.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Interface-definition syntax error.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// Error message.
        message: String,
    },

    /// Input ended in the middle of a declaration.
    #[error("unexpected end of input at {line}:{column}: expected {expected}")]
    UnexpectedEof {
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// What the parser was looking for.
        expected: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on {element}")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on {element}")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Invalid schema structure.
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// The parsed protocol failed validation.
    #[error("invalid protocol: {0}")]
    Schema(#[from] SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for schema validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Referenced type not found.
    #[error("type '{name}' referenced in {context} not found")]
    TypeNotFound {
        /// Type name as referenced.
        name: String,
        /// Where the reference appears.
        context: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (type, field, message, etc.).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// A `throws` clause names a type that is not an error.
    #[error("message '{message}' throws '{name}', which is not an error type")]
    NotAnError {
        /// Message name.
        message: String,
        /// Offending type name.
        name: String,
    },

    /// Invalid union layout.
    #[error("invalid union in {context}: {reason}")]
    InvalidUnion {
        /// Where the union appears.
        context: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a syntax error at the given position.
    pub fn syntax(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Returns the source position for IDL errors, if known.
    #[must_use]
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            Self::Syntax { line, column, .. } | Self::UnexpectedEof { line, column, .. } => {
                Some((*line, *column))
            }
            Self::Json(e) => Some((e.line() as u32, e.column() as u32)),
            _ => None,
        }
    }
}

impl SchemaError {
    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a type-not-found error.
    pub fn not_found(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::TypeNotFound {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Creates a generic validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
