//! Tokenschema Core - streaming JSON Schema validation over token events
//!
//! This crate validates JSON documents against JSON Schema while they are
//! being read, one token at a time, without materializing the document:
//! - **Schema model**: compiled schema arena with reference resolution
//!   (drafts 4 through 2020-12 keywords)
//! - **Validation engine**: per-value scopes, composition keywords resolved
//!   from buffered branch results, `unevaluatedProperties`/`unevaluatedItems`
//! - **Error trees**: Newtonsoft-style messages with JSON paths, nested
//!   branch failures and lazily resolved schema URIs
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tokenschema_core::schema::SchemaRoot;
//!
//! let schema = Arc::new(SchemaRoot::compile(&json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": { "name": { "type": "string" } }
//! }))
//! .unwrap());
//!
//! let errors = tokenschema_core::collect_errors(&schema, &json!({ "name": 3 })).unwrap();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].path(), "name");
//! assert!(!tokenschema_core::is_valid(&schema, &json!({})).unwrap());
//! ```
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod number;
pub mod reader;
pub mod schema;
pub mod token;
pub mod validation;

use std::sync::Arc;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use number::JsonNumber;
pub use reader::{walk_value, TokenSink};
pub use schema::{Schema, SchemaCompiler, SchemaError, SchemaId, SchemaLoader, SchemaRoot};
pub use token::{Token, TokenKind};
pub use validation::{
    ErrorKind, PropertyNameComparison, ValidationError, Validator, ValidatorSettings,
};

/// Validate a document and return every top-level error
pub fn collect_errors(
    schema: &Arc<SchemaRoot>,
    value: &serde_json::Value,
) -> Result<Vec<ValidationError>> {
    collect_errors_with(schema, value, ValidatorSettings::new())
}

/// [`collect_errors`] with custom settings; the settings' schema is replaced
pub fn collect_errors_with(
    schema: &Arc<SchemaRoot>,
    value: &serde_json::Value,
    settings: ValidatorSettings,
) -> Result<Vec<ValidationError>> {
    let mut validator = Validator::new(settings.with_schema(Arc::clone(schema)));
    validator.collect_errors();
    validator.validate_value(value)?;
    Ok(validator.take_errors())
}

/// Whether a document is valid
pub fn is_valid(schema: &Arc<SchemaRoot>, value: &serde_json::Value) -> Result<bool> {
    Ok(collect_errors(schema, value)?.is_empty())
}
