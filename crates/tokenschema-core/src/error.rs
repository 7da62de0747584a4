//! Error types for the tokenschema core library
//!
//! Validation failures are not errors in this sense: they are reported as
//! [`ValidationError`] nodes through the validator's error sink. The variants
//! below are the conditions that stop the current validation call.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::schema::SchemaError;
use crate::token::TokenKind;
use crate::validation::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Main error type for tokenschema operations
#[derive(Error, Debug)]
pub enum Error {
    /// A token was fed before any root schema was configured
    #[error("No schema has been set for the validator")]
    SchemaNotSet,

    /// A validation failure was raised while no error handler was registered
    #[error("{0}")]
    Validation(Box<ValidationError>),

    /// A user-supplied pattern did not finish within the configured timeout
    #[error("Regex pattern '{pattern}' timed out after {elapsed:?} (limit {limit:?})")]
    RegexTimeout {
        pattern: String,
        elapsed: Duration,
        limit: Duration,
    },

    /// Schema compilation or loading failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The token stream is not well formed for the validator's current state
    #[error("Unexpected {kind} token at depth {depth}: {reason}")]
    InvalidToken {
        kind: TokenKind,
        depth: usize,
        reason: String,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid token error
    pub fn invalid_token(kind: TokenKind, depth: usize, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            kind,
            depth,
            reason: reason.into(),
        }
    }

    /// The validation error carried by an unhandled validation failure
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// Whether this error aborts validation regardless of handler configuration
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Self::Validation(Box::new(error))
    }
}
