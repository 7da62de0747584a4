//! Keywords for scalar values
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::driver::Validator;
use super::error::{ErrorKind, MessageArg};
use super::format::validate_format;
use super::scope::ScopeHeader;
use crate::error::Result;
use crate::number::JsonNumber;
use crate::schema::Schema;
use crate::token::Token;
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

struct NumberMessages {
    exceeds_maximum: &'static str,
    equals_maximum: &'static str,
    below_minimum: &'static str,
    equals_minimum: &'static str,
    not_multiple: &'static str,
}

const INTEGER_MESSAGES: NumberMessages = NumberMessages {
    exceeds_maximum: "Integer {0} exceeds maximum value of {1}.",
    equals_maximum: "Integer {0} equals maximum value of {1} and exclusive maximum is true.",
    below_minimum: "Integer {0} is less than minimum value of {1}.",
    equals_minimum: "Integer {0} equals minimum value of {1} and exclusive minimum is true.",
    not_multiple: "Integer {0} is not a multiple of {1}.",
};

const FLOAT_MESSAGES: NumberMessages = NumberMessages {
    exceeds_maximum: "Float {0} exceeds maximum value of {1}.",
    equals_maximum: "Float {0} equals maximum value of {1} and exclusive maximum is true.",
    below_minimum: "Float {0} is less than minimum value of {1}.",
    equals_minimum: "Float {0} equals minimum value of {1} and exclusive minimum is true.",
    not_multiple: "Float {0} is not a multiple of {1}.",
};

impl Validator {
    /// Validate a scalar token against its scope's schema
    pub(super) fn validate_primitive(
        &mut self,
        header: &mut ScopeHeader,
        token: &Token<'_>,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[header.schema];

        if let Some(number) = token.number() {
            self.validate_number(header, schema, &number)?;
        }
        if let Some(text) = token.text() {
            self.validate_string(header, schema, &text)?;
        }
        if let Some(value) = token.to_value() {
            self.check_value(header, schema, &value)?;
        }
        Ok(())
    }

    fn validate_number(
        &mut self,
        header: &mut ScopeHeader,
        schema: &Schema,
        number: &JsonNumber,
    ) -> Result<()> {
        let messages = if number.is_float() {
            &FLOAT_MESSAGES
        } else {
            &INTEGER_MESSAGES
        };
        let value = Some(number.to_value());

        let mut failures: Vec<(ErrorKind, &'static str, &JsonNumber)> = Vec::new();
        if let Some(maximum) = &schema.maximum {
            if number.compare(maximum) == Some(Ordering::Greater) {
                failures.push((ErrorKind::Maximum, messages.exceeds_maximum, maximum));
            }
        }
        if let Some(maximum) = &schema.exclusive_maximum {
            match number.compare(maximum) {
                Some(Ordering::Greater) => {
                    failures.push((ErrorKind::Maximum, messages.exceeds_maximum, maximum))
                }
                Some(Ordering::Equal) => {
                    failures.push((ErrorKind::Maximum, messages.equals_maximum, maximum))
                }
                _ => {}
            }
        }
        if let Some(minimum) = &schema.minimum {
            if number.compare(minimum) == Some(Ordering::Less) {
                failures.push((ErrorKind::Minimum, messages.below_minimum, minimum));
            }
        }
        if let Some(minimum) = &schema.exclusive_minimum {
            match number.compare(minimum) {
                Some(Ordering::Less) => {
                    failures.push((ErrorKind::Minimum, messages.below_minimum, minimum))
                }
                Some(Ordering::Equal) => {
                    failures.push((ErrorKind::Minimum, messages.equals_minimum, minimum))
                }
                _ => {}
            }
        }
        if let Some(divisor) = &schema.multiple_of {
            if !number.is_multiple_of(divisor) {
                failures.push((ErrorKind::MultipleOf, messages.not_multiple, divisor));
            }
        }

        for (kind, template, limit) in failures {
            let error = self
                .error(
                    kind,
                    template,
                    vec![number.clone().into(), limit.clone().into()],
                    header.schema,
                )
                .with_value(value.clone());
            self.raise(header, error)?;
        }
        Ok(())
    }

    fn validate_string(&mut self, header: &mut ScopeHeader, schema: &Schema, text: &str) -> Result<()> {
        let value = Some(serde_json::Value::String(text.to_string()));

        if schema.max_length.is_some() || schema.min_length.is_some() {
            let length = text.graphemes(true).count() as u64;
            if let Some(maximum) = schema.max_length.filter(|max| length > *max) {
                let error = self
                    .error(
                        ErrorKind::MaximumLength,
                        "String '{0}' exceeds maximum length of {1}.",
                        vec![text.into(), maximum.into()],
                        header.schema,
                    )
                    .with_value(value.clone());
                self.raise(header, error)?;
            }
            if let Some(minimum) = schema.min_length.filter(|min| length < *min) {
                let error = self
                    .error(
                        ErrorKind::MinimumLength,
                        "String '{0}' is less than minimum length of {1}.",
                        vec![text.into(), minimum.into()],
                        header.schema,
                    )
                    .with_value(value.clone());
                self.raise(header, error)?;
            }
        }

        if let Some(pattern) = &schema.pattern {
            let error = match pattern.is_match(text, self.settings.regex_timeout)? {
                Some(true) => None,
                Some(false) => Some(self.error(
                    ErrorKind::Pattern,
                    "String '{0}' does not match regex pattern '{1}'.",
                    vec![text.into(), pattern.as_str().into()],
                    header.schema,
                )),
                None => Some(self.error(
                    ErrorKind::Pattern,
                    "Could not test string '{0}' against regex pattern '{1}'. Regex error: {2}",
                    vec![
                        text.into(),
                        pattern.as_str().into(),
                        MessageArg::from(pattern.error().unwrap_or_default()),
                    ],
                    header.schema,
                )),
            };
            if let Some(error) = error {
                self.raise(header, error.with_value(value.clone()))?;
            }
        }

        if let Some(format) = &schema.format {
            if self.settings.validate_formats && !validate_format(format, text) {
                let error = self
                    .error(
                        ErrorKind::Format,
                        "String '{0}' does not validate against format '{1}'.",
                        vec![text.into(), format.as_str().into()],
                        header.schema,
                    )
                    .with_value(value);
                self.raise(header, error)?;
            }
        }
        Ok(())
    }
}
