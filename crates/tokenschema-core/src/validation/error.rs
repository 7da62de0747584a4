//! Validation error nodes
//!
//! An error node is created once at the point of failure. Its message is kept
//! as a template plus typed arguments and rendered on first read. The schema
//! URI is filled in from the known-schemas cache when the error is emitted,
//! recursively over its children.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::number::JsonNumber;
use crate::schema::{KnownSchemas, SchemaId};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Keyword family that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The schema is `false`
    Valid,
    Type,
    Enum,
    Const,
    Maximum,
    Minimum,
    MultipleOf,
    MaximumLength,
    MinimumLength,
    Pattern,
    Format,
    MaximumItems,
    MinimumItems,
    UniqueItems,
    AdditionalItems,
    Contains,
    MinimumContains,
    MaximumContains,
    Required,
    AdditionalProperties,
    MaximumProperties,
    MinimumProperties,
    PatternProperties,
    PropertyNames,
    Dependencies,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    Then,
    Else,
    Ref,
    UnevaluatedProperties,
    UnevaluatedItems,
    /// A self-referential schema was short-circuited
    CircularDependency,
    /// Raised by a custom validator
    Validator,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Typed argument substituted into a message template
#[derive(Debug, Clone, PartialEq)]
pub enum MessageArg {
    Text(String),
    Number(JsonNumber),
    Count(u64),
    Value(Value),
    List(Vec<String>),
}

impl fmt::Display for MessageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number),
            Self::Count(count) => write!(f, "{}", count),
            Self::Value(value) => write!(f, "{}", value),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for MessageArg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageArg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<u64> for MessageArg {
    fn from(count: u64) -> Self {
        Self::Count(count)
    }
}

impl From<usize> for MessageArg {
    fn from(count: usize) -> Self {
        Self::Count(count as u64)
    }
}

impl From<JsonNumber> for MessageArg {
    fn from(number: JsonNumber) -> Self {
        Self::Number(number)
    }
}

impl From<Vec<String>> for MessageArg {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Position of the offending token in its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub line_number: usize,
    pub line_position: usize,
}

/// One validation failure, possibly with nested branch failures
#[derive(Debug, Clone)]
pub struct ValidationError {
    kind: ErrorKind,
    template: &'static str,
    args: Vec<MessageArg>,
    message: OnceLock<String>,
    path: String,
    schema: SchemaId,
    schema_uri: OnceLock<String>,
    value: Option<Value>,
    line_info: Option<LineInfo>,
    children: Vec<ValidationError>,
}

impl ValidationError {
    /// Create an error from a `{0}`-style template and its arguments
    pub fn new(
        kind: ErrorKind,
        template: &'static str,
        args: Vec<MessageArg>,
        path: impl Into<String>,
        schema: SchemaId,
    ) -> Self {
        Self {
            kind,
            template,
            args,
            message: OnceLock::new(),
            path: path.into(),
            schema,
            schema_uri: OnceLock::new(),
            value: None,
            line_info: None,
            children: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }

    pub fn with_line_info(mut self, line_info: Option<LineInfo>) -> Self {
        self.line_info = line_info;
        self
    }

    pub fn with_children(mut self, children: Vec<ValidationError>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Rendered message, formatted on first access
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| render(self.template, &self.args))
    }

    pub fn args(&self) -> &[MessageArg] {
        &self.args
    }

    /// Path of the offending value, e.g. `items[2].name`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Resolved URI of the failing schema, once the error has been emitted
    pub fn schema_uri(&self) -> Option<&str> {
        self.schema_uri.get().map(String::as_str)
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn line_info(&self) -> Option<LineInfo> {
        self.line_info
    }

    pub fn children(&self) -> &[ValidationError] {
        &self.children
    }

    /// Fill in schema URIs for this error and its descendants
    pub(crate) fn resolve_schema_uris(&self, known: &KnownSchemas) {
        if self.schema_uri.get().is_none() {
            if let Some(uri) = known.uri(self.schema) {
                let _ = self.schema_uri.set(uri);
            }
        }
        for child in &self.children {
            child.resolve_schema_uris(known);
        }
    }

    /// Number of errors in this tree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ValidationError::count).sum::<usize>()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message();
        f.write_str(message)?;
        if !message.ends_with('.') {
            f.write_str(".")?;
        }
        if self.path.is_empty() && self.line_info.is_none() {
            return Ok(());
        }
        f.write_str(" ")?;
        if !self.path.is_empty() {
            write!(f, "Path '{}'", self.path)?;
        }
        if let Some(info) = self.line_info {
            if !self.path.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "line {}, position {}", info.line_number, info.line_position)?;
        }
        f.write_str(".")
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 7)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("schema", &self.schema_uri())?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("line", &self.line_info)?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}

/// Substitute `{n}` placeholders with the matching argument
fn render(template: &str, args: &[MessageArg]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let close = tail.find('}');
        let arg = close
            .and_then(|close| tail[..close].parse::<usize>().ok())
            .and_then(|index| args.get(index));
        match (arg, close) {
            (Some(arg), Some(close)) => {
                out.push_str(&arg.to_string());
                rest = &tail[close + 1..];
            }
            _ => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
