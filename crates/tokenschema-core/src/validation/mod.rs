//! Streaming validation of token events against a compiled schema
//!
//! The [`Validator`] consumes one token at a time and reports failures as
//! [`ValidationError`] trees. Errors are delivered in one of three ways:
//!
//! - **Raise** (default): the `feed` call that detects the failure returns
//!   [`crate::Error::Validation`]
//! - **Handler**: a callback registered with [`Validator::on_error`]
//! - **Collect**: kept until [`Validator::take_errors`]
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tokenschema_core::schema::SchemaRoot;
//! use tokenschema_core::validation::Validator;
//!
//! let schema = SchemaRoot::compile(&json!({ "type": "integer", "maximum": 5 })).unwrap();
//! let mut validator = Validator::for_schema(Arc::new(schema));
//! validator.collect_errors();
//! validator.validate_value(&json!(10)).unwrap();
//!
//! let errors = validator.take_errors();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].message(), "Integer 10 exceeds maximum value of 5.");
//! ```
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

mod array;
mod buffer;
mod conditional;
mod context;
mod driver;
pub mod error;
pub mod format;
mod object;
mod path;
mod primitive;
mod scope;
pub mod settings;

// Re-export commonly used types
pub use driver::Validator;
pub use error::{ErrorKind, LineInfo, MessageArg, ValidationError};
pub use format::validate_format;
pub use settings::{
    CustomValidator, CustomValidatorContext, PropertyNameComparison, ValidatorSettings,
};
