//! Token events consumed by the validation engine
//!
//! A token source (pull parser, push writer, or tree walker) hands the engine
//! one `Token` at a time together with the nesting depth of its container.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::number::JsonNumber;
use chrono::{DateTime, FixedOffset};
use num_bigint::BigInt;
use serde_json::Value;
use std::fmt;

/// Kind of a token event, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Bytes,
    Date,
    Undefined,
    Comment,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::StartObject => "StartObject",
            TokenKind::EndObject => "EndObject",
            TokenKind::StartArray => "StartArray",
            TokenKind::EndArray => "EndArray",
            TokenKind::PropertyName => "PropertyName",
            TokenKind::String => "String",
            TokenKind::Integer => "Integer",
            TokenKind::Float => "Float",
            TokenKind::Boolean => "Boolean",
            TokenKind::Null => "Null",
            TokenKind::Bytes => "Bytes",
            TokenKind::Date => "Date",
            TokenKind::Undefined => "Undefined",
            TokenKind::Comment => "Comment",
        };
        f.write_str(name)
    }
}

/// A single token event with its payload borrowed from the token source
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName(&'a str),
    String(&'a str),
    Integer(i64),
    /// Integer outside the machine-width range
    BigInteger(&'a BigInt),
    Float(f64),
    Boolean(bool),
    Null,
    Bytes(&'a [u8]),
    Date(DateTime<FixedOffset>),
    Undefined,
    Comment(&'a str),
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::StartObject => TokenKind::StartObject,
            Token::EndObject => TokenKind::EndObject,
            Token::StartArray => TokenKind::StartArray,
            Token::EndArray => TokenKind::EndArray,
            Token::PropertyName(_) => TokenKind::PropertyName,
            Token::String(_) => TokenKind::String,
            Token::Integer(_) | Token::BigInteger(_) => TokenKind::Integer,
            Token::Float(_) => TokenKind::Float,
            Token::Boolean(_) => TokenKind::Boolean,
            Token::Null => TokenKind::Null,
            Token::Bytes(_) => TokenKind::Bytes,
            Token::Date(_) => TokenKind::Date,
            Token::Undefined => TokenKind::Undefined,
            Token::Comment(_) => TokenKind::Comment,
        }
    }

    /// Opening token of a container value
    pub fn is_start(&self) -> bool {
        matches!(self, Token::StartObject | Token::StartArray)
    }

    /// Closing token of a container value
    pub fn is_end(&self) -> bool {
        matches!(self, Token::EndObject | Token::EndArray)
    }

    /// A complete value carried by a single token
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Token::StartObject
                | Token::EndObject
                | Token::StartArray
                | Token::EndArray
                | Token::PropertyName(_)
                | Token::Comment(_)
        )
    }

    /// Token that begins a new value (container start or scalar)
    pub fn begins_value(&self) -> bool {
        self.is_start() || self.is_scalar()
    }

    /// Numeric payload, if any
    pub fn number(&self) -> Option<JsonNumber> {
        match self {
            Token::Integer(i) => Some(JsonNumber::Integer(*i)),
            Token::BigInteger(b) => Some(JsonNumber::BigInteger((*b).clone())),
            Token::Float(f) => Some(JsonNumber::Float(*f)),
            _ => None,
        }
    }

    /// Textual payload validated by string keywords
    pub fn text(&self) -> Option<std::borrow::Cow<'a, str>> {
        match self {
            Token::String(s) => Some(std::borrow::Cow::Borrowed(*s)),
            Token::Date(d) => Some(std::borrow::Cow::Owned(d.to_rfc3339())),
            _ => None,
        }
    }

    /// Owned JSON value of a scalar token
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Token::String(s) => Some(Value::String((*s).to_string())),
            Token::Integer(i) => Some(Value::from(*i)),
            Token::BigInteger(b) => Some(JsonNumber::BigInteger((*b).clone()).to_value()),
            Token::Float(f) => Some(JsonNumber::Float(*f).to_value()),
            Token::Boolean(b) => Some(Value::Bool(*b)),
            Token::Null | Token::Undefined => Some(Value::Null),
            Token::Bytes(bytes) => Some(Value::String(
                bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            )),
            Token::Date(d) => Some(Value::String(d.to_rfc3339())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_classification() {
        assert!(Token::StartObject.is_start());
        assert!(Token::EndArray.is_end());
        assert!(Token::Integer(3).is_scalar());
        assert!(!Token::PropertyName("a").is_scalar());
        assert!(!Token::Comment("note").begins_value());
        assert_eq!(Token::BigInteger(&BigInt::from(7)).kind(), TokenKind::Integer);
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(Token::String("x").to_value(), Some(Value::from("x")));
        assert_eq!(Token::Undefined.to_value(), Some(Value::Null));
        assert_eq!(Token::Bytes(&[0xab, 0x01]).to_value(), Some(Value::from("ab01")));
        assert_eq!(Token::StartObject.to_value(), None);
    }
}
