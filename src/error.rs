//! Error types for Switchboard
//!
//! This module defines all error types used throughout the engine.

use thiserror::Error;

/// The main error type for Switchboard
#[derive(Error, Debug)]
pub enum Error {
    // ========== Business-Rule Errors ==========
    /// Raised only by a failed `check`; carries the HTTP status and the
    /// user-facing message, surfaced verbatim as a structured error response.
    #[error("business rule violated: {message}")]
    BusinessRule { status: u16, message: String },

    // ========== Argument Errors ==========
    #[error("Type error: invalid type descriptor '{0}'")]
    InvalidDescriptor(String),

    #[error("Type error: invalid {kind} literal '{literal}'")]
    InvalidLiteral { kind: &'static str, literal: String },

    #[error("Type error: length overflow (actual {actual} exceeds maximal {max})")]
    LengthOverflow { actual: usize, max: i64 },

    #[error("Type error: uuid literals cannot be parsed")]
    UuidLiteralUnsupported,

    #[error("Module error: unknown module class '{0}'")]
    UnknownModuleClass(String),

    // ========== State Errors ==========
    #[error("State error: reassignment of variable '{0}'")]
    VariableRedefined(String),

    #[error("State error: cannot resolve variable '{0}'")]
    UnknownVariable(String),

    #[error("State error: cannot resolve module '{0}'")]
    UnknownModule(String),

    #[error("State error: redefinition of module '{0}'")]
    ModuleRedefined(String),

    #[error("State error: executing '{0}' outside of a transaction")]
    NoTransaction(&'static str),

    #[error("State error: executing 'START TRANSACTION' inside of a transaction")]
    TransactionAlreadyOpen,

    #[error("State error: started transaction was neither committed nor rolled back")]
    TransactionLeftOpen,

    #[error("State error: empty resultset")]
    EmptyResultSet,

    #[error("State error: main aggregate query returned more than a single row")]
    AmbiguousResultSet,

    #[error("State error: statement kind '{kind}' is not supported by module '{module}'")]
    UnsupportedStatement { module: String, kind: String },

    // ========== Backend Errors ==========
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Switchboard operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownVariable("customerId".to_string());
        assert_eq!(
            err.to_string(),
            "State error: cannot resolve variable 'customerId'"
        );

        let err = Error::LengthOverflow { actual: 12, max: 8 };
        assert_eq!(
            err.to_string(),
            "Type error: length overflow (actual 12 exceeds maximal 8)"
        );
    }

    #[test]
    fn test_business_rule_fields() {
        let err = Error::BusinessRule {
            status: 409,
            message: "duplicate".to_string(),
        };
        assert_eq!(err.to_string(), "business rule violated: duplicate");
    }
}
