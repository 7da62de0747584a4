//! Token-level tests for the streaming validator
//!
//! These feed tokens directly instead of going through `walk_value`, to cover
//! error delivery modes, line information, extended token kinds and the
//! handling of malformed streams.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokenschema_core::schema::{Schema, SchemaLoader, SchemaRoot};
use tokenschema_core::validation::{CustomValidator, CustomValidatorContext};
use tokenschema_core::{
    Error, ErrorKind, Token, ValidationError, Validator, ValidatorSettings,
};

fn compile(schema: Value) -> Arc<SchemaRoot> {
    Arc::new(SchemaRoot::compile(&schema).expect("schema should compile"))
}

fn collecting(schema: Value) -> Validator {
    let mut validator = Validator::for_schema(compile(schema));
    validator.collect_errors();
    validator
}

#[cfg(test)]
mod delivery {
    use super::*;

    #[test]
    fn test_schema_not_set() {
        let mut validator = Validator::new(ValidatorSettings::new());
        let result = validator.feed(Token::Integer(1), 0);
        assert!(matches!(result, Err(Error::SchemaNotSet)));
    }

    #[test]
    fn test_raise_without_handler() {
        let mut validator = Validator::for_schema(compile(json!({ "type": "string" })));
        let result = validator.feed(Token::Integer(1), 0);
        match result {
            Err(Error::Validation(error)) => {
                assert_eq!(error.kind(), ErrorKind::Type);
                assert_eq!(error.message(), "Invalid type. Expected String but got Integer.");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_handler_receives_errors() {
        let seen: Arc<Mutex<Vec<ValidationError>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut validator = Validator::for_schema(compile(json!({ "items": { "type": "integer" } })));
        validator.on_error(move |error| sink.lock().unwrap().push(error));
        validator.validate_value(&json!([1, "a", "b"])).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].path(), "[1]");
        assert_eq!(seen[1].path(), "[2]");
    }

    #[test]
    fn test_schema_uri_is_resolved() {
        let mut validator = collecting(json!({ "properties": { "a": { "type": "string" } } }));
        validator.validate_value(&json!({ "a": 1 })).unwrap();
        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].schema_uri(), Some("#/properties/a"));
    }
}

#[cfg(test)]
mod tokens {
    use super::*;

    #[test]
    fn test_line_info_in_display() {
        let mut validator = collecting(json!({ "properties": { "a": { "type": "string" } } }));
        validator.set_line_info(1, 1);
        validator.feed(Token::StartObject, 0).unwrap();
        validator.set_line_info(3, 3);
        validator.feed(Token::PropertyName("a"), 1).unwrap();
        validator.set_line_info(3, 7);
        validator.feed(Token::Integer(1), 1).unwrap();
        validator.set_line_info(4, 1);
        validator.feed(Token::EndObject, 0).unwrap();

        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "Invalid type. Expected String but got Integer. Path 'a', line 3, position 7."
        );
    }

    #[test]
    fn test_comments_are_ignored() {
        let mut validator = collecting(json!({ "type": "array", "maxItems": 1 }));
        validator.feed(Token::Comment("leading"), 0).unwrap();
        validator.feed(Token::StartArray, 0).unwrap();
        validator.feed(Token::Comment("inside"), 1).unwrap();
        validator.feed(Token::Integer(1), 1).unwrap();
        validator.feed(Token::EndArray, 0).unwrap();

        assert!(validator.take_errors().is_empty());
        assert!(validator.is_idle());
    }

    #[test]
    fn test_end_token_without_value() {
        let mut validator = collecting(json!({}));
        let result = validator.feed(Token::EndObject, 0);
        assert!(matches!(result, Err(Error::InvalidToken { .. })));
    }

    #[test]
    fn test_consecutive_root_values() {
        let mut validator = collecting(json!({ "type": "integer" }));
        validator.feed(Token::Integer(1), 0).unwrap();
        validator.feed(Token::String("x"), 0).unwrap();
        validator.feed(Token::Integer(2), 0).unwrap();

        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Invalid type. Expected Integer but got String.");
    }

    #[test]
    fn test_dates_and_bytes_are_strings() {
        let mut validator = collecting(json!({ "type": "string", "format": "date-time" }));
        let date = chrono::DateTime::parse_from_rfc3339("2024-02-29T12:00:00+01:00").unwrap();
        validator.feed(Token::Date(date), 0).unwrap();
        assert!(validator.take_errors().is_empty());

        let mut validator = collecting(json!({ "type": "integer" }));
        validator.feed(Token::Bytes(&[0xab, 0x01]), 0).unwrap();
        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Invalid type. Expected Integer but got String.");
    }

    #[test]
    fn test_reuse_is_deterministic() {
        let schema = json!({
            "properties": { "a": { "anyOf": [{ "type": "string" }, { "maximum": 1 }] } },
            "required": ["b"]
        });
        let document = json!({ "a": 5 });
        let mut validator = collecting(schema);

        validator.validate_value(&document).unwrap();
        let first: Vec<String> = validator.take_errors().iter().map(|e| e.to_string()).collect();
        validator.validate_value(&document).unwrap();
        let second: Vec<String> = validator.take_errors().iter().map(|e| e.to_string()).collect();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_regex_timeout_is_fatal() {
        let settings = ValidatorSettings::new()
            .with_schema(compile(json!({ "pattern": "^(a|b)*c$" })))
            .with_regex_timeout(Duration::from_nanos(1));
        let mut validator = Validator::new(settings);
        validator.collect_errors();

        let input = "ab".repeat(50_000);
        let result = validator.validate_value(&json!(input));
        match result {
            Err(error @ Error::RegexTimeout { .. }) => assert!(error.is_fatal()),
            other => panic!("expected a regex timeout, got {other:?}"),
        }
        assert!(validator.take_errors().is_empty());
    }

    #[test]
    fn test_large_arrays_stay_linear() {
        let items: Vec<Value> = (0..20_000).map(|i| json!(i)).collect();
        let document = Value::Array(items);
        let schemas = [
            json!({ "items": { "type": "integer" } }),
            json!({ "contains": { "const": 19_999 } }),
            json!({ "prefixItems": [{ "type": "integer" }], "unevaluatedItems": { "type": "integer" } }),
        ];

        for schema in schemas {
            let mut validator = collecting(schema.clone());
            let started = Instant::now();
            validator.validate_value(&document).unwrap();
            let elapsed = started.elapsed();

            assert!(validator.take_errors().is_empty());
            assert!(
                elapsed < Duration::from_secs(5),
                "{schema} took {elapsed:?} over 20000 items"
            );
        }
    }

    #[test]
    fn test_reset_abandons_value() {
        let mut validator = collecting(json!({ "required": ["a"] }));
        validator.feed(Token::StartObject, 0).unwrap();
        assert!(!validator.is_idle());
        validator.reset();
        assert!(validator.is_idle());

        validator.validate_value(&json!({ "a": 1 })).unwrap();
        assert!(validator.take_errors().is_empty());
    }
}

#[cfg(test)]
mod extensions {
    use super::*;

    struct EvenValidator;

    impl CustomValidator for EvenValidator {
        fn can_validate(&self, schema: &Schema) -> bool {
            schema.extension("even") == Some(&Value::Bool(true))
        }

        fn validate(&self, value: &Value, context: &mut CustomValidatorContext<'_>) {
            if value.as_i64().is_some_and(|n| n % 2 != 0) {
                context.raise_error(format!("Value {value} is not even."));
            }
        }
    }

    #[test]
    fn test_custom_validator() {
        let settings = ValidatorSettings::new()
            .with_schema(compile(json!({ "items": { "even": true } })))
            .with_validator(Arc::new(EvenValidator));
        let mut validator = Validator::new(settings);
        validator.collect_errors();
        validator.validate_value(&json!([2, 3, 4])).unwrap();

        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Validator);
        assert_eq!(errors[0].message(), "Value 3 is not even.");
        assert_eq!(errors[0].path(), "[1]");
    }
}

#[cfg(test)]
mod files {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_against_loaded_schema() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("person.yaml"),
            "type: object\nrequired: [name]\nproperties:\n  name:\n    $ref: defs.json#/$defs/name\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("defs.json"),
            r#"{ "$defs": { "name": { "type": "string", "minLength": 1 } } }"#,
        )
        .unwrap();

        let schema = Arc::new(SchemaLoader::new().load(&dir.path().join("person.yaml")).unwrap());
        let mut validator = Validator::for_schema(schema);
        validator.collect_errors();
        validator.validate_value(&json!({ "name": "" })).unwrap();

        let errors = validator.take_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Ref);
        assert_eq!(errors[0].children()[0].kind(), ErrorKind::MinimumLength);
    }
}
