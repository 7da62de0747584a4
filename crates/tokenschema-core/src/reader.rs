//! Token sources
//!
//! [`walk_value`] replays a materialized `serde_json::Value` as the token
//! stream a streaming reader would produce, with the validator's depth
//! convention. Big integers stay exact when `serde_json` parses with
//! arbitrary precision.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::error::Result;
use crate::number::JsonNumber;
use crate::token::Token;
use serde_json::Value;

/// Consumer of a token stream
pub trait TokenSink {
    fn feed(&mut self, token: Token<'_>, depth: usize) -> Result<()>;
}

/// Feed every token of `value` to `sink`, starting at depth 0
pub fn walk_value<S: TokenSink + ?Sized>(value: &Value, sink: &mut S) -> Result<()> {
    walk(value, 0, sink)
}

fn walk<S: TokenSink + ?Sized>(value: &Value, depth: usize, sink: &mut S) -> Result<()> {
    match value {
        Value::Null => sink.feed(Token::Null, depth),
        Value::Bool(b) => sink.feed(Token::Boolean(*b), depth),
        Value::String(s) => sink.feed(Token::String(s), depth),
        Value::Number(n) => match JsonNumber::from_json(n) {
            Some(JsonNumber::Integer(i)) => sink.feed(Token::Integer(i), depth),
            Some(JsonNumber::BigInteger(big)) => sink.feed(Token::BigInteger(&big), depth),
            Some(JsonNumber::Float(f)) => sink.feed(Token::Float(f), depth),
            None => sink.feed(Token::Float(f64::NAN), depth),
        },
        Value::Array(items) => {
            sink.feed(Token::StartArray, depth)?;
            for item in items {
                walk(item, depth + 1, sink)?;
            }
            sink.feed(Token::EndArray, depth)
        }
        Value::Object(map) => {
            sink.feed(Token::StartObject, depth)?;
            for (key, item) in map {
                sink.feed(Token::PropertyName(key), depth + 1)?;
                walk(item, depth + 1, sink)?;
            }
            sink.feed(Token::EndObject, depth)
        }
    }
}
