//! Loading schema and instance documents from disk
//!
//! Documents are JSON or YAML, detected by extension with a content-based
//! fallback. Schemas loaded from a file resolve relative `$ref`s against the
//! file's directory through [`FileResolver`], which refuses to leave it.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::compiler::{ReferenceResolver, SchemaCompiler};
use super::error::{SchemaError, SchemaResult};
use super::SchemaRoot;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> SchemaResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => Err(SchemaError::unsupported_format(path.to_path_buf())),
        }
    }

    /// Parse document content in this format
    pub fn parse(self, content: &str, path: &Path) -> SchemaResult<Value> {
        match self {
            Format::Json => serde_json::from_str(content)
                .map_err(|e| SchemaError::json_parse_error(path.to_path_buf(), e)),
            Format::Yaml => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(content)
                    .map_err(|e| SchemaError::yaml_parse_error(path.to_path_buf(), e))?;
                serde_json::to_value(yaml)
                    .map_err(|e| SchemaError::json_parse_error(path.to_path_buf(), e))
            }
        }
    }

    /// Parse using the extension's format, falling back to JSON then YAML
    pub fn parse_with_fallback(content: &str, path: &Path) -> SchemaResult<(Value, Format)> {
        if let Ok(format) = Format::from_path(path) {
            return format.parse(content, path).map(|value| (value, format));
        }

        match Format::Json.parse(content, path) {
            Ok(value) => Ok((value, Format::Json)),
            Err(_) => Format::Yaml
                .parse(content, path)
                .map(|value| (value, Format::Yaml)),
        }
    }
}

/// Read and parse a JSON or YAML document
pub fn load_document(path: &Path) -> SchemaResult<Value> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SchemaError::io_error(path.to_path_buf(), e))?;
    Format::parse_with_fallback(&content, path).map(|(value, _)| value)
}

/// Resolves `file:` references inside one base directory
#[derive(Debug, Clone)]
pub struct FileResolver {
    base_dir: PathBuf,
}

impl FileResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check that a path stays within the base directory
    pub fn is_safe_path(&self, path: &Path) -> bool {
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        match (full_path.canonicalize(), self.base_dir.canonicalize()) {
            (Ok(path), Ok(base)) => path.starts_with(base),
            _ => normalize(&full_path).starts_with(normalize(&self.base_dir)),
        }
    }
}

impl ReferenceResolver for FileResolver {
    fn resolve(&self, uri: &Url) -> SchemaResult<Value> {
        if uri.scheme() != "file" {
            return Err(SchemaError::unresolved_reference(
                uri.as_str(),
                format!("unsupported scheme '{}'", uri.scheme()),
            ));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| SchemaError::unresolved_reference(uri.as_str(), "not a local file path"))?;
        if !self.is_safe_path(&path) {
            return Err(SchemaError::path_traversal(uri.as_str(), self.base_dir.clone()));
        }
        load_document(&path)
    }
}

/// Lexical normalization for paths that do not exist yet
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Loads and compiles schema files
#[derive(Debug, Default)]
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a schema file, resolving relative references next to it
    pub fn load(&self, path: &Path) -> SchemaResult<SchemaRoot> {
        let document = load_document(path)?;
        let absolute = std::path::absolute(path)
            .map_err(|e| SchemaError::io_error(path.to_path_buf(), e))?;
        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let base_uri = Url::from_file_path(&absolute)
            .map_err(|_| SchemaError::unresolved_reference(absolute.display().to_string(), "not an absolute path"))?;

        tracing::debug!(path = %absolute.display(), "loading schema");
        let resolver = FileResolver::new(base_dir);
        SchemaCompiler::new()
            .with_resolver(&resolver)
            .with_base_uri(base_uri)
            .compile(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a.JSON")).unwrap(), Format::Json);
        assert!(Format::from_path(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_content_fallback() {
        let (value, format) = Format::parse_with_fallback("a: 1", Path::new("doc")).unwrap();
        assert_eq!(format, Format::Yaml);
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_load_resolves_sibling_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("item.yaml"), "type: integer\n").unwrap();
        fs::write(
            dir.path().join("root.json"),
            r#"{ "items": { "$ref": "item.yaml" } }"#,
        )
        .unwrap();

        let root = SchemaLoader::new().load(&dir.path().join("root.json")).unwrap();
        assert_eq!(root.len(), 3);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("schemas");
        fs::create_dir(&inner).unwrap();
        fs::write(outer.path().join("secret.json"), "{}").unwrap();
        fs::write(inner.join("root.json"), r#"{ "$ref": "../secret.json" }"#).unwrap();

        let result = SchemaLoader::new().load(&inner.join("root.json"));
        assert!(matches!(result, Err(SchemaError::PathTraversal { .. })));
    }
}
