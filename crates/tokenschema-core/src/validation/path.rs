//! JSON path of the current token, e.g. `orders[3].lines[0].sku`
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::token::Token;

enum Position {
    Property(Option<String>),
    Index(Option<usize>),
}

#[derive(Default)]
pub(crate) struct PathTracker {
    containers: Vec<Position>,
}

impl PathTracker {
    /// Update for a token before scopes evaluate it
    pub fn before(&mut self, token: &Token<'_>) {
        match token {
            Token::PropertyName(name) => {
                if let Some(Position::Property(current)) = self.containers.last_mut() {
                    *current = Some((*name).to_string());
                }
            }
            Token::EndObject | Token::EndArray => {
                self.containers.pop();
            }
            token if token.begins_value() => {
                if let Some(Position::Index(current)) = self.containers.last_mut() {
                    *current = Some(current.map_or(0, |i| i + 1));
                }
            }
            _ => {}
        }
    }

    /// Update for a token after scopes evaluated it
    pub fn after(&mut self, token: &Token<'_>) {
        match token {
            Token::StartObject => self.containers.push(Position::Property(None)),
            Token::StartArray => self.containers.push(Position::Index(None)),
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.containers.clear();
    }

    /// Render the current path
    pub fn current(&self) -> String {
        let mut path = String::new();
        for position in &self.containers {
            match position {
                Position::Property(Some(name)) => {
                    if is_plain(name) {
                        if !path.is_empty() {
                            path.push('.');
                        }
                        path.push_str(name);
                    } else {
                        path.push_str("['");
                        path.push_str(&name.replace('\'', "\\'"));
                        path.push_str("']");
                    }
                }
                Position::Index(Some(index)) => {
                    path.push('[');
                    path.push_str(&index.to_string());
                    path.push(']');
                }
                _ => {}
            }
        }
        path
    }
}

fn is_plain(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| matches!(c, '.' | ' ' | '\'' | '/' | '"' | '[' | ']' | '(' | ')' | '\t' | '\n' | '\r'))
}
