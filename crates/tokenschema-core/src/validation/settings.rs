//! Validator configuration
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::schema::{Schema, SchemaRoot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How property names are compared by `properties`, `required` and
/// `dependencies`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyNameComparison {
    #[default]
    Ordinal,
    IgnoreCase,
}

/// Extension point for value-level checks outside the schema vocabulary
///
/// Values of schemas accepted by `can_validate` are buffered whole and
/// passed to `validate` once complete.
pub trait CustomValidator: Send + Sync {
    /// Whether this validator applies to values of `schema`
    fn can_validate(&self, schema: &Schema) -> bool;

    fn validate(&self, value: &Value, context: &mut CustomValidatorContext<'_>);
}

/// Handed to a [`CustomValidator`] to report failures
pub struct CustomValidatorContext<'a> {
    schema: &'a Schema,
    messages: Vec<String>,
}

impl<'a> CustomValidatorContext<'a> {
    pub(crate) fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            messages: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Report a failure; each call produces one validation error
    pub fn raise_error(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub(crate) fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// Settings shared by every scope of a validator
#[derive(Clone)]
pub struct ValidatorSettings {
    pub schema: Option<Arc<SchemaRoot>>,
    pub property_name_comparison: PropertyNameComparison,
    /// Limit for a single user-supplied pattern match
    pub regex_timeout: Option<Duration>,
    /// Disable to skip the `format` keyword
    pub validate_formats: bool,
    pub validators: Vec<Arc<dyn CustomValidator>>,
}

impl ValidatorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Arc<SchemaRoot>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_property_name_comparison(mut self, comparison: PropertyNameComparison) -> Self {
        self.property_name_comparison = comparison;
        self
    }

    pub fn with_regex_timeout(mut self, timeout: Duration) -> Self {
        self.regex_timeout = Some(timeout);
        self
    }

    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn CustomValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub(crate) fn ignore_case(&self) -> bool {
        self.property_name_comparison == PropertyNameComparison::IgnoreCase
    }
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            schema: None,
            property_name_comparison: PropertyNameComparison::Ordinal,
            regex_timeout: None,
            validate_formats: true,
            validators: Vec::new(),
        }
    }
}

impl fmt::Debug for ValidatorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorSettings")
            .field("schema", &self.schema.as_ref().map(|s| s.len()))
            .field("property_name_comparison", &self.property_name_comparison)
            .field("regex_timeout", &self.regex_timeout)
            .field("validate_formats", &self.validate_formats)
            .field("validators", &self.validators.len())
            .finish()
    }
}
