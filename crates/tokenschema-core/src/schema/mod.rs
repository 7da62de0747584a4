//! Compiled JSON Schema model
//!
//! Schemas are compiled once into an arena of [`Schema`] nodes addressed by
//! [`SchemaId`]. The arena, its root and the known-schemas cache live in a
//! [`SchemaRoot`], which is shared between validators as `Arc<SchemaRoot>`.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

pub mod compiler;
pub mod error;
pub mod known;
pub mod loader;

pub use compiler::{ReferenceResolver, SchemaCompiler, DEFAULT_BASE_URI};
pub use error::{SchemaError, SchemaResult};
pub use known::KnownSchemas;
pub use loader::{load_document, FileResolver, Format, SchemaLoader};

use crate::error::{Error, Result};
use crate::number::JsonNumber;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;
use std::time::{Duration, Instant};

/// Identity of a schema node within its [`SchemaRoot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) u32);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// JSON value types as named by the `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    const ALL: [JsonType; 7] = [
        JsonType::String,
        JsonType::Number,
        JsonType::Integer,
        JsonType::Boolean,
        JsonType::Object,
        JsonType::Array,
        JsonType::Null,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::String => 1,
            Self::Number => 2,
            Self::Integer => 4,
            Self::Boolean => 8,
            Self::Object => 16,
            Self::Array => 32,
            Self::Null => 64,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::Object => "Object",
            Self::Array => "Array",
            Self::Null => "Null",
        };
        f.write_str(name)
    }
}

/// Set of allowed types; empty means any type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeSet(u8);

impl TypeSet {
    pub fn insert(&mut self, ty: JsonType) {
        self.0 |= ty.bit();
    }

    pub fn contains(self, ty: JsonType) -> bool {
        self.0 & ty.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = JsonType> {
        JsonType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }

    /// Whether a value of `actual` type is accepted; `integral` marks floats
    /// with no fractional part, which also satisfy `integer`
    pub fn accepts(self, actual: JsonType, integral: bool) -> bool {
        if self.is_empty() || self.contains(actual) {
            return true;
        }
        match actual {
            JsonType::Integer => self.contains(JsonType::Number),
            JsonType::Number => integral && self.contains(JsonType::Integer),
            _ => false,
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|ty| ty.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

/// A user-supplied regular expression; invalid patterns are kept so the
/// failure can be reported when the pattern is first needed
#[derive(Debug, Clone)]
pub struct SchemaRegex {
    source: String,
    compiled: std::result::Result<Regex, String>,
}

impl SchemaRegex {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source).map_err(|e| e.to_string());
        Self { source, compiled }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parse failure message, if the pattern is invalid
    pub fn error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }

    /// Match `text`, returning `None` for an invalid pattern; a match that
    /// exceeds `timeout` is fatal
    pub fn is_match(&self, text: &str, timeout: Option<Duration>) -> Result<Option<bool>> {
        let Ok(regex) = &self.compiled else {
            return Ok(None);
        };
        let started = Instant::now();
        let matched = regex.is_match(text);
        if let Some(limit) = timeout {
            let elapsed = started.elapsed();
            if elapsed > limit {
                tracing::warn!(pattern = %self.source, ?elapsed, "regex match timed out");
                return Err(Error::RegexTimeout {
                    pattern: self.source.clone(),
                    elapsed,
                    limit,
                });
            }
        }
        Ok(Some(matched))
    }
}

/// The `items` keyword
#[derive(Debug, Clone)]
pub enum Items {
    /// One schema applied to every item
    Single(SchemaId),
    /// One schema per position (`items` array or `prefixItems`)
    Positional(Vec<SchemaId>),
}

/// A `dependencies`, `dependentRequired` or `dependentSchemas` entry
#[derive(Debug, Clone)]
pub enum Dependency {
    Required(Vec<String>),
    Schema(SchemaId),
}

/// One compiled schema node
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) location: String,
    /// `Some` for the boolean schemas `true` and `false`
    pub boolean: Option<bool>,
    pub types: TypeSet,
    pub enumeration: Option<Vec<Value>>,
    pub constant: Option<Value>,

    pub minimum: Option<JsonNumber>,
    pub maximum: Option<JsonNumber>,
    pub exclusive_minimum: Option<JsonNumber>,
    pub exclusive_maximum: Option<JsonNumber>,
    pub multiple_of: Option<JsonNumber>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<SchemaRegex>,
    pub format: Option<String>,

    pub items: Option<Items>,
    pub additional_items: Option<SchemaId>,
    pub contains: Option<SchemaId>,
    pub min_contains: Option<u64>,
    pub max_contains: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,

    pub properties: Vec<(String, SchemaId)>,
    pub pattern_properties: Vec<(SchemaRegex, SchemaId)>,
    pub additional_properties: Option<SchemaId>,
    pub property_names: Option<SchemaId>,
    pub required: Vec<String>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub dependencies: Vec<(String, Dependency)>,

    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub not: Option<SchemaId>,
    pub if_schema: Option<SchemaId>,
    pub then_schema: Option<SchemaId>,
    pub else_schema: Option<SchemaId>,

    /// Target of `$ref`, `$recursiveRef` or `$dynamicRef`
    pub reference: Option<SchemaId>,
    pub reference_uri: Option<String>,

    pub unevaluated_properties: Option<SchemaId>,
    pub unevaluated_items: Option<SchemaId>,

    /// Keywords outside the supported vocabulary
    pub extensions: Map<String, Value>,

    /// Schemas reachable through in-place applicators, for unevaluated tracking
    pub(crate) applicators: Vec<SchemaId>,
}

impl Schema {
    /// Resolved location of this node (`#/pointer` for anonymous documents)
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_false(&self) -> bool {
        self.boolean == Some(false)
    }

    /// Whether `keyword` was present as an unrecognized keyword
    pub fn extension(&self, keyword: &str) -> Option<&Value> {
        self.extensions.get(keyword)
    }

    /// Subschemas applied in place to the same value, excluding `not`
    pub fn in_place_applicators(&self) -> impl Iterator<Item = SchemaId> + '_ {
        self.all_of
            .iter()
            .chain(&self.any_of)
            .chain(&self.one_of)
            .copied()
            .chain(self.if_schema)
            .chain(self.then_schema)
            .chain(self.else_schema)
            .chain(self.reference)
            .chain(self.dependencies.iter().filter_map(|(_, dep)| match dep {
                Dependency::Schema(id) => Some(*id),
                Dependency::Required(_) => None,
            }))
    }

    /// Every directly referenced subschema
    pub fn subschemas(&self) -> Vec<SchemaId> {
        let mut out: Vec<SchemaId> = self.in_place_applicators().collect();
        out.extend(self.not);
        match &self.items {
            Some(Items::Single(id)) => out.push(*id),
            Some(Items::Positional(ids)) => out.extend(ids),
            None => {}
        }
        out.extend(self.additional_items);
        out.extend(self.contains);
        out.extend(self.properties.iter().map(|(_, id)| *id));
        out.extend(self.pattern_properties.iter().map(|(_, id)| *id));
        out.extend(self.additional_properties);
        out.extend(self.property_names);
        out.extend(self.unevaluated_properties);
        out.extend(self.unevaluated_items);
        out
    }

    /// Whether this schema, when it validates, evaluates the named property
    pub(crate) fn claims_property(
        &self,
        name: &str,
        ignore_case: bool,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        if self.additional_properties.is_some() || self.unevaluated_properties.is_some() {
            return Ok(true);
        }
        if self.property(name, ignore_case).is_some() {
            return Ok(true);
        }
        for (regex, _) in &self.pattern_properties {
            if regex.is_match(name, timeout)? == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether this schema, when it validates, evaluates the item at `index`
    pub(crate) fn claims_item(&self, index: usize) -> bool {
        match &self.items {
            Some(Items::Single(_)) => return true,
            Some(Items::Positional(ids)) if index < ids.len() => return true,
            _ => {}
        }
        self.additional_items.is_some() || self.unevaluated_items.is_some()
    }

    /// Look up a named property schema under the given comparison mode
    pub fn property(&self, name: &str, ignore_case: bool) -> Option<SchemaId> {
        self.properties
            .iter()
            .find(|(key, _)| names_match(key, name, ignore_case))
            .map(|(_, id)| *id)
    }
}

/// Property-name comparison shared by every keyword that looks names up
pub(crate) fn names_match(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// A compiled schema document
#[derive(Debug)]
pub struct SchemaRoot {
    nodes: Vec<Schema>,
    root: SchemaId,
    known: KnownSchemas,
    tracks_evaluation: bool,
}

impl SchemaRoot {
    /// Compile a schema document with the default compiler settings
    pub fn compile(document: &Value) -> SchemaResult<Self> {
        SchemaCompiler::new().compile(document)
    }

    pub(crate) fn new(mut nodes: Vec<Schema>, root: SchemaId) -> Self {
        let tracks_evaluation = nodes
            .iter()
            .any(|s| s.unevaluated_properties.is_some() || s.unevaluated_items.is_some());

        if tracks_evaluation {
            for index in 0..nodes.len() {
                let tracked = nodes[index].unevaluated_properties.is_some()
                    || nodes[index].unevaluated_items.is_some();
                if tracked {
                    nodes[index].applicators = applicator_closure(&nodes, SchemaId(index as u32));
                }
            }
        }

        Self {
            nodes,
            root,
            known: KnownSchemas::new(),
            tracks_evaluation,
        }
    }

    pub fn root_id(&self) -> SchemaId {
        self.root
    }

    pub fn root(&self) -> &Schema {
        &self[self.root]
    }

    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.nodes.get(id.index())
    }

    /// Number of compiled nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &Schema)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, schema)| (SchemaId(i as u32), schema))
    }

    pub fn known_schemas(&self) -> &KnownSchemas {
        &self.known
    }

    /// Whether any node uses `unevaluatedProperties` or `unevaluatedItems`
    pub fn tracks_evaluation(&self) -> bool {
        self.tracks_evaluation
    }
}

impl Index<SchemaId> for SchemaRoot {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.index()]
    }
}

/// All schemas reachable from `start` through in-place applicators
fn applicator_closure(nodes: &[Schema], start: SchemaId) -> Vec<SchemaId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<SchemaId> = nodes[start.index()].in_place_applicators().collect();
    let mut out = Vec::new();
    while let Some(id) = stack.pop() {
        if id == start || !seen.insert(id) {
            continue;
        }
        out.push(id);
        stack.extend(nodes[id.index()].in_place_applicators());
    }
    out
}
