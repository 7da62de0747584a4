//! Whole-value buffer for keywords that need deep equality
//!
//! One buffer is shared by every scope of a validator. It is opened by the
//! first scope that needs its value, records every token until the value it
//! was opened for is complete, and is closed once it is idle again. Nested
//! values that complete while the buffer is open are readable through
//! [`ValueBuffer::completed`] during the token that completed them.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::token::Token;
use serde_json::{Map, Value};

enum Frame {
    Object {
        map: Map<String, Value>,
        key: Option<String>,
    },
    Array(Vec<Value>),
}

#[derive(Default)]
pub(crate) struct ValueBuffer {
    open: bool,
    stack: Vec<Frame>,
    /// Value completed by the most recent token, not yet attached to its parent
    completed: Option<Value>,
}

impl ValueBuffer {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the buffer at a value's first token, recording that token
    pub fn ensure_open(&mut self, token: &Token<'_>) {
        if self.open {
            return;
        }
        self.open = true;
        self.stack.clear();
        self.completed = None;
        self.write(token);
    }

    /// Record a token if the buffer is open
    pub fn write(&mut self, token: &Token<'_>) {
        if !self.open {
            return;
        }
        self.attach_completed();

        match token {
            Token::StartObject => self.stack.push(Frame::Object {
                map: Map::new(),
                key: None,
            }),
            Token::StartArray => self.stack.push(Frame::Array(Vec::new())),
            Token::PropertyName(name) => {
                if let Some(Frame::Object { key, .. }) = self.stack.last_mut() {
                    *key = Some((*name).to_string());
                }
            }
            Token::EndObject | Token::EndArray => {
                self.completed = match self.stack.pop() {
                    Some(Frame::Object { map, .. }) => Some(Value::Object(map)),
                    Some(Frame::Array(items)) => Some(Value::Array(items)),
                    None => None,
                };
            }
            Token::Comment(_) => {}
            scalar => self.completed = scalar.to_value(),
        }
    }

    /// The value completed by the current token, if any
    pub fn completed(&self) -> Option<&Value> {
        self.completed.as_ref()
    }

    /// Close the buffer once the outermost buffered value is complete
    pub fn close_if_idle(&mut self) {
        if self.open && self.stack.is_empty() {
            self.open = false;
            self.completed = None;
        }
    }

    fn attach_completed(&mut self) {
        let Some(value) = self.completed.take() else {
            return;
        };
        match self.stack.last_mut() {
            Some(Frame::Object { map, key }) => {
                if let Some(key) = key.take() {
                    map.insert(key, value);
                }
            }
            Some(Frame::Array(items)) => items.push(value),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_buffers_nested_values() {
        let mut buffer = ValueBuffer::default();
        buffer.ensure_open(&Token::StartObject);
        buffer.write(&Token::PropertyName("a"));
        buffer.write(&Token::StartArray);
        buffer.write(&Token::Integer(1));
        assert_eq!(buffer.completed(), Some(&json!(1)));
        buffer.write(&Token::Null);
        buffer.write(&Token::EndArray);
        assert_eq!(buffer.completed(), Some(&json!([1, null])));
        buffer.write(&Token::EndObject);
        assert_eq!(buffer.completed(), Some(&json!({ "a": [1, null] })));

        buffer.close_if_idle();
        assert!(!buffer.is_open());
    }

    #[test]
    fn test_closed_buffer_ignores_tokens() {
        let mut buffer = ValueBuffer::default();
        buffer.write(&Token::String("x"));
        assert_eq!(buffer.completed(), None);
        assert!(!buffer.is_open());
    }

    #[test]
    fn test_scalar_value() {
        let mut buffer = ValueBuffer::default();
        buffer.ensure_open(&Token::Boolean(true));
        assert_eq!(buffer.completed(), Some(&json!(true)));
        buffer.close_if_idle();
        assert!(!buffer.is_open());
    }
}
