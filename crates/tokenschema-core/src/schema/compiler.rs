//! Schema compiler: JSON documents to the [`SchemaRoot`] arena
//!
//! Nodes are allocated before their keywords are filled so that references
//! can point at nodes still being compiled. References are collected while
//! compiling and resolved afterwards, compiling pointer targets on demand and
//! fetching external documents through a [`ReferenceResolver`].
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::error::{SchemaError, SchemaResult};
use super::{Dependency, Items, JsonType, Schema, SchemaId, SchemaRegex, SchemaRoot, TypeSet};
use crate::number::JsonNumber;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Base URI given to documents that do not declare an `$id`
pub const DEFAULT_BASE_URI: &str = "tokenschema:///root.json";

/// Keywords consumed by the compiler; everything else becomes an extension
const KNOWN_KEYWORDS: &[&str] = &[
    "$id", "id", "$schema", "$anchor", "$dynamicAnchor", "$recursiveAnchor", "$ref",
    "$recursiveRef", "$dynamicRef", "$defs", "definitions", "$comment", "$vocabulary",
    "type", "enum", "const", "minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum",
    "multipleOf", "divisibleBy", "minLength", "maxLength", "pattern", "format", "items",
    "prefixItems", "additionalItems", "contains", "minContains", "maxContains", "minItems",
    "maxItems", "uniqueItems", "properties", "patternProperties", "additionalProperties",
    "propertyNames", "required", "minProperties", "maxProperties", "dependencies",
    "dependentRequired", "dependentSchemas", "allOf", "anyOf", "oneOf", "not", "if", "then",
    "else", "unevaluatedProperties", "unevaluatedItems", "title", "description", "default",
    "examples", "readOnly", "writeOnly", "deprecated",
];

/// Source of schema documents that are not embedded in the compiled document
pub trait ReferenceResolver {
    /// Fetch the document identified by `uri` (fragment already removed)
    fn resolve(&self, uri: &Url) -> SchemaResult<Value>;
}

/// Compiles schema documents
#[derive(Default)]
pub struct SchemaCompiler<'r> {
    resolver: Option<&'r dyn ReferenceResolver>,
    base_uri: Option<Url>,
}

impl<'r> SchemaCompiler<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve non-local references through `resolver`
    pub fn with_resolver(mut self, resolver: &'r dyn ReferenceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Base URI of the document being compiled
    pub fn with_base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    pub fn compile(&self, document: &Value) -> SchemaResult<SchemaRoot> {
        let base = match &self.base_uri {
            Some(uri) => strip_fragment(uri.clone()),
            None => Url::parse(DEFAULT_BASE_URI)
                .map_err(|e| SchemaError::invalid_keyword("$id", DEFAULT_BASE_URI, e.to_string()))?,
        };

        let mut state = CompileState {
            resolver: self.resolver,
            nodes: Vec::new(),
            locations: HashMap::new(),
            documents: HashMap::new(),
            pending: Vec::new(),
        };
        state
            .documents
            .insert(base.as_str().to_string(), Arc::new(document.clone()));

        let root = state.compile_node(document, Location::document(base))?;
        state.resolve_pending()?;

        tracing::debug!(nodes = state.nodes.len(), "compiled schema");
        Ok(SchemaRoot::new(state.nodes, root))
    }
}

/// Where a node sits: relative to its nearest resource and to its document
#[derive(Debug, Clone)]
struct Location {
    resource: Url,
    pointer: String,
    document: String,
    document_pointer: String,
}

impl Location {
    fn document(url: Url) -> Self {
        Self {
            document: url.as_str().to_string(),
            resource: url,
            pointer: String::new(),
            document_pointer: String::new(),
        }
    }

    fn child(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self {
            resource: self.resource.clone(),
            pointer: format!("{}/{}", self.pointer, escaped),
            document: self.document.clone(),
            document_pointer: format!("{}/{}", self.document_pointer, escaped),
        }
    }

    fn key(&self) -> String {
        format!("{}#{}", self.resource, self.pointer)
    }

    fn document_key(&self) -> String {
        format!("{}#{}", self.document, self.document_pointer)
    }
}

struct CompileState<'r> {
    resolver: Option<&'r dyn ReferenceResolver>,
    nodes: Vec<Schema>,
    /// `uri#fragment` keys (pointers, anchors and `$id`s) to nodes
    locations: HashMap<String, SchemaId>,
    /// Documents and embedded resources by URI without fragment
    documents: HashMap<String, Arc<Value>>,
    /// `(node, absolute target URI)` awaiting resolution
    pending: Vec<(SchemaId, String)>,
}

impl CompileState<'_> {
    fn compile_node(&mut self, value: &Value, mut location: Location) -> SchemaResult<SchemaId> {
        let mut anchor_keys = Vec::new();

        if let Value::Object(map) = value {
            let declared = map
                .get("$id")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str);
            if let Some(declared) = declared {
                let joined = location.resource.join(declared).map_err(|e| {
                    SchemaError::invalid_keyword("$id", location.key(), e.to_string())
                })?;
                if !declared.starts_with('#') {
                    let resource = strip_fragment(joined.clone());
                    self.documents
                        .entry(resource.as_str().to_string())
                        .or_insert_with(|| Arc::new(value.clone()));
                    location.resource = resource;
                    location.pointer = String::new();
                }
                if joined.fragment().is_some_and(|f| !f.is_empty()) {
                    anchor_keys.push(joined.to_string());
                }
            }
            for keyword in ["$anchor", "$dynamicAnchor"] {
                if let Some(anchor) = map.get(keyword).and_then(Value::as_str) {
                    anchor_keys.push(format!("{}#{}", location.resource, anchor));
                }
            }
        }

        let key = location.key();
        if let Some(id) = self.locations.get(&key) {
            return Ok(*id);
        }

        let id = SchemaId(self.nodes.len() as u32);
        self.nodes.push(Schema {
            location: display_location(&key),
            ..Schema::default()
        });
        self.locations.insert(key.clone(), id);
        self.locations.entry(location.document_key()).or_insert(id);
        for anchor in anchor_keys {
            self.locations.entry(anchor).or_insert(id);
        }

        let schema = match value {
            Value::Bool(b) => Schema {
                location: display_location(&key),
                boolean: Some(*b),
                ..Schema::default()
            },
            Value::Object(map) => self.compile_keywords(id, map, &location)?,
            _ => {
                return Err(SchemaError::invalid_keyword(
                    "schema",
                    display_location(&key),
                    "expected an object or a boolean",
                ))
            }
        };
        self.nodes[id.index()] = schema;
        Ok(id)
    }

    fn compile_keywords(
        &mut self,
        id: SchemaId,
        map: &Map<String, Value>,
        location: &Location,
    ) -> SchemaResult<Schema> {
        let display = display_location(&location.key());
        let mut schema = Schema {
            location: display.clone(),
            ..Schema::default()
        };

        match map.get("type") {
            Some(Value::String(name)) => insert_type(&mut schema.types, name),
            Some(Value::Array(names)) => {
                for name in names.iter().filter_map(Value::as_str) {
                    insert_type(&mut schema.types, name);
                }
            }
            _ => {}
        }

        if let Some(value) = map.get("enum") {
            let values = value.as_array().ok_or_else(|| {
                SchemaError::invalid_keyword("enum", &display, "expected an array")
            })?;
            schema.enumeration = Some(values.clone());
        }
        schema.constant = map.get("const").cloned();

        schema.minimum = number(map, "minimum", &display)?;
        schema.maximum = number(map, "maximum", &display)?;
        match map.get("exclusiveMinimum") {
            Some(Value::Bool(true)) => schema.exclusive_minimum = schema.minimum.take(),
            Some(Value::Bool(false)) | None => {}
            Some(_) => schema.exclusive_minimum = number(map, "exclusiveMinimum", &display)?,
        }
        match map.get("exclusiveMaximum") {
            Some(Value::Bool(true)) => schema.exclusive_maximum = schema.maximum.take(),
            Some(Value::Bool(false)) | None => {}
            Some(_) => schema.exclusive_maximum = number(map, "exclusiveMaximum", &display)?,
        }
        schema.multiple_of = match number(map, "multipleOf", &display)? {
            Some(n) => Some(n),
            None => number(map, "divisibleBy", &display)?,
        };

        schema.min_length = count(map, "minLength", &display)?;
        schema.max_length = count(map, "maxLength", &display)?;
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            schema.pattern = Some(SchemaRegex::new(pattern));
        }
        schema.format = map.get("format").and_then(Value::as_str).map(str::to_string);

        self.compile_array_keywords(&mut schema, map, location)?;
        self.compile_object_keywords(&mut schema, map, location)?;

        schema.all_of = self.compile_list(map, "allOf", location)?;
        schema.any_of = self.compile_list(map, "anyOf", location)?;
        schema.one_of = self.compile_list(map, "oneOf", location)?;
        schema.not = self.compile_child(map, "not", location)?;
        schema.if_schema = self.compile_child(map, "if", location)?;
        schema.then_schema = self.compile_child(map, "then", location)?;
        schema.else_schema = self.compile_child(map, "else", location)?;
        schema.unevaluated_properties = self.compile_child(map, "unevaluatedProperties", location)?;
        schema.unevaluated_items = self.compile_child(map, "unevaluatedItems", location)?;

        for keyword in ["$ref", "$dynamicRef", "$recursiveRef"] {
            let Some(reference) = map.get(keyword).and_then(Value::as_str) else {
                continue;
            };
            let target = location.resource.join(reference).map_err(|e| {
                SchemaError::unresolved_reference(reference, e.to_string())
            })?;
            schema.reference_uri = Some(reference.to_string());
            self.pending.push((id, target.to_string()));
            break;
        }

        for keyword in ["definitions", "$defs"] {
            if let Some(Value::Object(defs)) = map.get(keyword) {
                let parent = location.child(keyword);
                for (name, def) in defs {
                    self.compile_node(def, parent.child(name))?;
                }
            }
        }

        for (key, value) in map {
            if !KNOWN_KEYWORDS.contains(&key.as_str()) {
                schema.extensions.insert(key.clone(), value.clone());
            }
        }

        Ok(schema)
    }

    fn compile_array_keywords(
        &mut self,
        schema: &mut Schema,
        map: &Map<String, Value>,
        location: &Location,
    ) -> SchemaResult<()> {
        let display = schema.location.clone();

        if map.contains_key("prefixItems") {
            let prefix = self.compile_list(map, "prefixItems", location)?;
            schema.items = Some(Items::Positional(prefix));
            schema.additional_items = self.compile_child(map, "items", location)?;
        } else {
            match map.get("items") {
                Some(Value::Array(_)) => {
                    let positional = self.compile_list(map, "items", location)?;
                    schema.items = Some(Items::Positional(positional));
                    schema.additional_items = self.compile_child(map, "additionalItems", location)?;
                }
                Some(_) => {
                    schema.items = self.compile_child(map, "items", location)?.map(Items::Single);
                }
                None => {}
            }
        }

        schema.contains = self.compile_child(map, "contains", location)?;
        schema.min_contains = count(map, "minContains", &display)?;
        schema.max_contains = count(map, "maxContains", &display)?;
        schema.min_items = count(map, "minItems", &display)?;
        schema.max_items = count(map, "maxItems", &display)?;
        schema.unique_items = map.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);
        Ok(())
    }

    fn compile_object_keywords(
        &mut self,
        schema: &mut Schema,
        map: &Map<String, Value>,
        location: &Location,
    ) -> SchemaResult<()> {
        let display = schema.location.clone();

        if let Some(Value::Object(properties)) = map.get("properties") {
            let parent = location.child("properties");
            for (name, value) in properties {
                let id = self.compile_node(value, parent.child(name))?;
                // Draft 3 marks required properties inside the property schema
                if value.get("required") == Some(&Value::Bool(true)) {
                    schema.required.push(name.clone());
                }
                schema.properties.push((name.clone(), id));
            }
        }

        if let Some(Value::Object(patterns)) = map.get("patternProperties") {
            let parent = location.child("patternProperties");
            for (pattern, value) in patterns {
                let id = self.compile_node(value, parent.child(pattern))?;
                schema.pattern_properties.push((SchemaRegex::new(pattern.as_str()), id));
            }
        }

        schema.additional_properties = self.compile_child(map, "additionalProperties", location)?;
        schema.property_names = self.compile_child(map, "propertyNames", location)?;

        if let Some(Value::Array(names)) = map.get("required") {
            for name in names {
                let name = name.as_str().ok_or_else(|| {
                    SchemaError::invalid_keyword("required", &display, "expected an array of strings")
                })?;
                if !schema.required.iter().any(|existing| existing == name) {
                    schema.required.push(name.to_string());
                }
            }
        }

        schema.min_properties = count(map, "minProperties", &display)?;
        schema.max_properties = count(map, "maxProperties", &display)?;

        if let Some(Value::Object(dependencies)) = map.get("dependencies") {
            let parent = location.child("dependencies");
            for (name, value) in dependencies {
                let dependency = match value {
                    Value::Array(_) => Dependency::Required(string_list(value, "dependencies", &display)?),
                    Value::String(single) => Dependency::Required(vec![single.clone()]),
                    _ => Dependency::Schema(self.compile_node(value, parent.child(name))?),
                };
                upsert_dependency(&mut schema.dependencies, name, dependency);
            }
        }
        if let Some(Value::Object(required)) = map.get("dependentRequired") {
            for (name, value) in required {
                let names = string_list(value, "dependentRequired", &display)?;
                upsert_dependency(&mut schema.dependencies, name, Dependency::Required(names));
            }
        }
        if let Some(Value::Object(schemas)) = map.get("dependentSchemas") {
            let parent = location.child("dependentSchemas");
            for (name, value) in schemas {
                let id = self.compile_node(value, parent.child(name))?;
                upsert_dependency(&mut schema.dependencies, name, Dependency::Schema(id));
            }
        }

        Ok(())
    }

    fn compile_child(
        &mut self,
        map: &Map<String, Value>,
        keyword: &str,
        location: &Location,
    ) -> SchemaResult<Option<SchemaId>> {
        match map.get(keyword) {
            Some(value) => self.compile_node(value, location.child(keyword)).map(Some),
            None => Ok(None),
        }
    }

    fn compile_list(
        &mut self,
        map: &Map<String, Value>,
        keyword: &str,
        location: &Location,
    ) -> SchemaResult<Vec<SchemaId>> {
        let Some(value) = map.get(keyword) else {
            return Ok(Vec::new());
        };
        let items = value.as_array().ok_or_else(|| {
            SchemaError::invalid_keyword(keyword, display_location(&location.key()), "expected an array")
        })?;
        let parent = location.child(keyword);
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.compile_node(item, parent.child(&i.to_string())))
            .collect()
    }

    fn resolve_pending(&mut self) -> SchemaResult<()> {
        while let Some((from, target)) = self.pending.pop() {
            let resolved = self.resolve(&target)?;
            self.nodes[from.index()].reference = Some(resolved);
        }
        Ok(())
    }

    fn resolve(&mut self, target: &str) -> SchemaResult<SchemaId> {
        let url = Url::parse(target)
            .map_err(|e| SchemaError::unresolved_reference(target, e.to_string()))?;
        let fragment = percent_decode(url.fragment().unwrap_or(""));
        let document = strip_fragment(url);
        let document_key = document.as_str().to_string();
        let key = format!("{}#{}", document_key, fragment);

        if let Some(id) = self.locations.get(&key) {
            return Ok(*id);
        }

        if !self.documents.contains_key(&document_key) {
            let resolver = self.resolver.ok_or_else(|| {
                SchemaError::unresolved_reference(target, "no resolver configured for external documents")
            })?;
            tracing::debug!(uri = %document, "fetching referenced schema document");
            let fetched = Arc::new(resolver.resolve(&document)?);
            self.documents.insert(document_key.clone(), Arc::clone(&fetched));
            self.compile_node(&fetched, Location::document(document.clone()))?;
            if let Some(id) = self.locations.get(&key) {
                return Ok(*id);
            }
        }

        if fragment.is_empty() || fragment.starts_with('/') {
            let source = self
                .documents
                .get(&document_key)
                .cloned()
                .ok_or_else(|| SchemaError::unresolved_reference(target, "document not loaded"))?;
            let node = source
                .pointer(&fragment)
                .ok_or_else(|| SchemaError::unresolved_reference(target, "pointer does not exist"))?;
            let location = Location {
                resource: document,
                pointer: fragment.clone(),
                document: document_key,
                document_pointer: fragment,
            };
            return self.compile_node(node, location);
        }

        Err(SchemaError::unresolved_reference(target, "anchor not found"))
    }
}

fn insert_type(types: &mut TypeSet, name: &str) {
    if name == "any" {
        return;
    }
    if let Some(ty) = JsonType::from_name(name) {
        types.insert(ty);
    }
}

fn number(map: &Map<String, Value>, keyword: &str, location: &str) -> SchemaResult<Option<JsonNumber>> {
    match map.get(keyword) {
        None => Ok(None),
        Some(value) => JsonNumber::from_value(value)
            .map(Some)
            .ok_or_else(|| SchemaError::invalid_keyword(keyword, location, "expected a number")),
    }
}

fn count(map: &Map<String, Value>, keyword: &str, location: &str) -> SchemaResult<Option<u64>> {
    let Some(value) = map.get(keyword) else {
        return Ok(None);
    };
    if let Some(n) = value.as_u64() {
        return Ok(Some(n));
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(SchemaError::invalid_keyword(
            keyword,
            location,
            "expected a non-negative integer",
        )),
    }
}

fn string_list(value: &Value, keyword: &str, location: &str) -> SchemaResult<Vec<String>> {
    value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| SchemaError::invalid_keyword(keyword, location, "expected an array of strings"))
}

/// Later declarations of the same property and kind replace earlier ones
fn upsert_dependency(dependencies: &mut Vec<(String, Dependency)>, name: &str, dependency: Dependency) {
    let same_kind = |existing: &Dependency| {
        matches!(
            (existing, &dependency),
            (Dependency::Required(_), Dependency::Required(_))
                | (Dependency::Schema(_), Dependency::Schema(_))
        )
    };
    match dependencies
        .iter()
        .position(|(existing, dep)| existing == name && same_kind(dep))
    {
        Some(index) => dependencies[index].1 = dependency,
        None => dependencies.push((name.to_string(), dependency)),
    }
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Display form of a location key; anonymous documents show only the fragment
fn display_location(key: &str) -> String {
    match key.strip_prefix(DEFAULT_BASE_URI) {
        Some(fragment) => fragment.to_string(),
        None => key.trim_end_matches('#').to_string(),
    }
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MapResolver(HashMap<String, Value>);

    impl ReferenceResolver for MapResolver {
        fn resolve(&self, uri: &Url) -> SchemaResult<Value> {
            self.0
                .get(uri.as_str())
                .cloned()
                .ok_or_else(|| SchemaError::unresolved_reference(uri.as_str(), "unknown document"))
        }
    }

    #[test]
    fn test_locations_are_pointer_fragments() {
        let root = SchemaRoot::compile(&json!({
            "properties": { "a/b": { "items": [ { "type": "string" } ] } }
        }))
        .unwrap();

        let property = root.root().properties[0].1;
        assert_eq!(root[property].location(), "#/properties/a~1b");
        match &root[property].items {
            Some(Items::Positional(ids)) => assert_eq!(root[ids[0]].location(), "#/properties/a~1b/items/0"),
            other => panic!("unexpected items {:?}", other),
        }
    }

    #[test]
    fn test_local_references_resolve() {
        let root = SchemaRoot::compile(&json!({
            "$defs": { "name": { "$anchor": "name", "type": "string" } },
            "properties": {
                "byPointer": { "$ref": "#/$defs/name" },
                "byAnchor": { "$ref": "#name" },
                "self": { "$ref": "#" }
            }
        }))
        .unwrap();

        let target = |name: &str| root[root.root().property(name, false).unwrap()].reference.unwrap();
        assert_eq!(target("byPointer"), target("byAnchor"));
        assert_eq!(target("self"), root.root_id());
    }

    #[test]
    fn test_reference_into_unknown_keyword_compiles_on_demand() {
        let root = SchemaRoot::compile(&json!({
            "x-shared": { "positive": { "minimum": 0 } },
            "$ref": "#/x-shared/positive"
        }))
        .unwrap();

        let target = root.root().reference.unwrap();
        assert_eq!(root[target].minimum, Some(JsonNumber::Integer(0)));
        assert!(root.root().extension("x-shared").is_some());
    }

    #[test]
    fn test_external_documents_use_resolver() {
        let mut documents = HashMap::new();
        documents.insert(
            "http://example.com/item.json".to_string(),
            json!({ "type": "integer" }),
        );
        let resolver = MapResolver(documents);
        let root = SchemaCompiler::new()
            .with_resolver(&resolver)
            .with_base_uri(Url::parse("http://example.com/root.json").unwrap())
            .compile(&json!({ "items": { "$ref": "item.json" } }))
            .unwrap();

        let Some(Items::Single(items)) = &root.root().items else {
            panic!("expected single items schema");
        };
        let target = root[*items].reference.unwrap();
        assert_eq!(root[target].location(), "http://example.com/item.json");
    }

    #[test]
    fn test_embedded_id_scopes_references() {
        let root = SchemaRoot::compile(&json!({
            "$id": "http://example.com/root.json",
            "$defs": {
                "inner": {
                    "$id": "inner.json",
                    "$defs": { "leaf": { "type": "boolean" } },
                    "$ref": "#/$defs/leaf"
                }
            },
            "$ref": "inner.json"
        }))
        .unwrap();

        let inner = root.root().reference.unwrap();
        assert_eq!(root[inner].location(), "http://example.com/inner.json");
        let leaf = root[inner].reference.unwrap();
        assert!(root[leaf].types.contains(JsonType::Boolean));
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let result = SchemaRoot::compile(&json!({ "$ref": "#/missing" }));
        assert!(matches!(result, Err(SchemaError::UnresolvedReference { .. })));

        let external = SchemaRoot::compile(&json!({ "$ref": "other.json" }));
        assert!(matches!(external, Err(SchemaError::UnresolvedReference { .. })));
    }

    #[test]
    fn test_draft4_exclusive_bounds_and_draft3_required() {
        let root = SchemaRoot::compile(&json!({
            "maximum": 5,
            "exclusiveMaximum": true,
            "properties": { "a": { "required": true } }
        }))
        .unwrap();

        assert_eq!(root.root().maximum, None);
        assert_eq!(root.root().exclusive_maximum, Some(JsonNumber::Integer(5)));
        assert_eq!(root.root().required, vec!["a".to_string()]);
    }

    #[test]
    fn test_duplicate_dependencies_collapse() {
        let root = SchemaRoot::compile(&json!({
            "dependencies": { "a": ["b"], "c": { "required": ["d"] } },
            "dependentRequired": { "a": ["e"] },
            "dependentSchemas": { "c": { "required": ["f"] } }
        }))
        .unwrap();

        assert_eq!(root.root().dependencies.len(), 2);
        match &root.root().dependencies[0] {
            (name, Dependency::Required(keys)) => {
                assert_eq!(name, "a");
                assert_eq!(keys, &vec!["e".to_string()]);
            }
            other => panic!("unexpected dependency {:?}", other),
        }
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(percent_decode("/a%25b/c%20d"), "/a%b/c d");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
