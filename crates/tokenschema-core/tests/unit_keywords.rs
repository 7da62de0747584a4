//! Keyword-level validation tests
//!
//! Each module covers one keyword family and checks the exact messages and
//! paths of the reported errors.

use serde_json::{json, Value};
use std::sync::Arc;
use tokenschema_core::schema::SchemaRoot;
use tokenschema_core::{
    collect_errors, collect_errors_with, ErrorKind, PropertyNameComparison, ValidationError,
    ValidatorSettings,
};

fn compile(schema: Value) -> Arc<SchemaRoot> {
    Arc::new(SchemaRoot::compile(&schema).expect("schema should compile"))
}

fn errors(schema: Value, instance: Value) -> Vec<ValidationError> {
    collect_errors(&compile(schema), &instance).expect("validation should run")
}

fn messages(schema: Value, instance: Value) -> Vec<String> {
    errors(schema, instance)
        .iter()
        .map(|e| e.message().to_string())
        .collect()
}

#[cfg(test)]
mod type_and_value {
    use super::*;

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            messages(json!({ "type": "integer" }), json!("x")),
            vec!["Invalid type. Expected Integer but got String."]
        );
    }

    #[test]
    fn test_type_list_names_every_type() {
        assert_eq!(
            messages(json!({ "type": ["string", "null"] }), json!(1)),
            vec!["Invalid type. Expected String, Null but got Integer."]
        );
    }

    #[test]
    fn test_integer_satisfies_number() {
        assert!(errors(json!({ "type": "number" }), json!(3)).is_empty());
    }

    #[test]
    fn test_enum() {
        let schema = json!({ "enum": [1, "a", { "b": [true] }] });
        assert!(errors(schema.clone(), json!("a")).is_empty());
        assert!(errors(schema.clone(), json!({ "b": [true] })).is_empty());
        assert_eq!(
            messages(schema, json!("b")),
            vec![r#"Value "b" is not defined in enum."#]
        );
    }

    #[test]
    fn test_const_on_object() {
        let found = errors(json!({ "const": { "a": 1 } }), json!({ "a": 2 }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Const);
        assert_eq!(found[0].message(), r#"Value {"a":2} does not match const."#);
        assert_eq!(found[0].value(), Some(&json!({ "a": 2 })));
    }

    #[test]
    fn test_false_schema() {
        let found = errors(json!(false), json!(1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Valid);
        assert_eq!(found[0].message(), "Schema always fails validation.");
    }

    #[test]
    fn test_true_schema() {
        assert!(errors(json!(true), json!({ "anything": [1, 2] })).is_empty());
    }
}

#[cfg(test)]
mod numeric {
    use super::*;

    #[test]
    fn test_maximum_reports_once() {
        let found = errors(json!({ "type": "integer", "maximum": 5 }), json!(10));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Maximum);
        assert_eq!(found[0].message(), "Integer 10 exceeds maximum value of 5.");
    }

    #[test]
    fn test_exclusive_maximum_equal() {
        assert_eq!(
            messages(json!({ "exclusiveMaximum": 5 }), json!(5)),
            vec!["Integer 5 equals maximum value of 5 and exclusive maximum is true."]
        );
    }

    #[test]
    fn test_draft4_exclusive_minimum() {
        assert_eq!(
            messages(json!({ "minimum": 2, "exclusiveMinimum": true }), json!(2)),
            vec!["Integer 2 equals minimum value of 2 and exclusive minimum is true."]
        );
    }

    #[test]
    fn test_float_minimum() {
        assert_eq!(
            messages(json!({ "minimum": 2.5 }), json!(1)),
            vec!["Integer 1 is less than minimum value of 2.5."]
        );
    }

    #[test]
    fn test_multiple_of_float() {
        let schema = json!({ "multipleOf": 0.1 });
        assert!(errors(schema.clone(), json!(0.3)).is_empty());
        assert_eq!(
            messages(schema, json!(4.001)),
            vec!["Float 4.001 is not a multiple of 0.1."]
        );
    }

    #[test]
    fn test_big_integers() {
        let big: Value = serde_json::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(
            messages(json!({ "maximum": 10 }), big.clone()),
            vec!["Integer 123456789012345678901234567890 exceeds maximum value of 10."]
        );
        assert!(errors(json!({ "multipleOf": 10 }), big.clone()).is_empty());
        assert!(errors(json!({ "type": "integer" }), big).is_empty());
    }
}

#[cfg(test)]
mod strings {
    use super::*;

    #[test]
    fn test_lengths() {
        assert_eq!(
            messages(json!({ "maxLength": 3 }), json!("abcd")),
            vec!["String 'abcd' exceeds maximum length of 3."]
        );
        assert_eq!(
            messages(json!({ "minLength": 2 }), json!("a")),
            vec!["String 'a' is less than minimum length of 2."]
        );
    }

    #[test]
    fn test_length_counts_graphemes() {
        assert!(errors(json!({ "maxLength": 1 }), json!("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}")).is_empty());
    }

    #[test]
    fn test_pattern() {
        assert_eq!(
            messages(json!({ "pattern": "^a+$" }), json!("b")),
            vec!["String 'b' does not match regex pattern '^a+$'."]
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let found = errors(json!({ "pattern": "(" }), json!("x"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Pattern);
        assert!(found[0]
            .message()
            .starts_with("Could not test string 'x' against regex pattern '('. Regex error: "));
    }

    #[test]
    fn test_format() {
        assert_eq!(
            messages(json!({ "format": "email" }), json!("nope")),
            vec!["String 'nope' does not validate against format 'email'."]
        );
    }

    #[test]
    fn test_format_can_be_disabled() {
        let settings = ValidatorSettings::new().with_format_validation(false);
        let found = collect_errors_with(&compile(json!({ "format": "email" })), &json!("nope"), settings)
            .unwrap();
        assert!(found.is_empty());
    }
}

#[cfg(test)]
mod arrays {
    use super::*;

    #[test]
    fn test_item_counts() {
        assert_eq!(
            messages(json!({ "maxItems": 1 }), json!([1, 2])),
            vec!["Array item count 2 exceeds maximum count of 1."]
        );
        assert_eq!(
            messages(json!({ "minItems": 3 }), json!([1, 2])),
            vec!["Array item count 2 is less than minimum count of 3."]
        );
    }

    #[test]
    fn test_unique_items() {
        assert_eq!(
            messages(json!({ "uniqueItems": true }), json!([1, 2, 1])),
            vec!["Non-unique array item at index 2."]
        );
        assert_eq!(
            messages(json!({ "uniqueItems": true }), json!([{ "a": 1 }, { "a": 1 }])),
            vec!["Non-unique array item at index 1."]
        );
        assert!(errors(json!({ "uniqueItems": true }), json!([[1], [2]])).is_empty());
    }

    #[test]
    fn test_items_and_paths() {
        let found = errors(
            json!({ "properties": { "tags": { "items": { "type": "string" } } } }),
            json!({ "tags": ["a", 1] }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), "tags[1]");
    }

    #[test]
    fn test_additional_items() {
        let found = errors(
            json!({ "items": [{ "type": "integer" }], "additionalItems": false }),
            json!([1, "x", "y"]),
        );
        let messages: Vec<&str> = found.iter().map(|e| e.message()).collect();
        assert_eq!(
            messages,
            vec![
                "Index 1 has not been defined and the schema does not allow additional items.",
                "Index 2 has not been defined and the schema does not allow additional items.",
            ]
        );
        assert_eq!(found[0].path(), "[1]");
    }

    #[test]
    fn test_contains() {
        let found = errors(json!({ "contains": { "type": "string" } }), json!([1, 2]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message(), "No items match contains.");
        assert_eq!(found[0].children().len(), 2);

        assert!(errors(json!({ "contains": { "type": "string" } }), json!([1, "a"])).is_empty());
    }

    #[test]
    fn test_contains_bounds() {
        assert_eq!(
            messages(
                json!({ "contains": { "type": "string" }, "minContains": 2 }),
                json!(["a", 1])
            ),
            vec!["Contains match count 1 is less than minimum contains count of 2."]
        );
        assert_eq!(
            messages(
                json!({ "contains": { "type": "string" }, "maxContains": 1 }),
                json!(["a", "b"])
            ),
            vec!["Contains match count 2 exceeds maximum contains count of 1."]
        );
    }
}

#[cfg(test)]
mod objects {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(
            messages(json!({ "required": ["a", "b", "c"] }), json!({ "a": 1 })),
            vec!["Required properties are missing from object: b, c."]
        );
    }

    #[test]
    fn test_additional_properties() {
        let found = errors(
            json!({ "properties": { "a": {} }, "additionalProperties": false }),
            json!({ "a": 1, "b": 2 }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].message(),
            "Property 'b' has not been defined and the schema does not allow additional properties."
        );
        assert_eq!(found[0].path(), "b");
    }

    #[test]
    fn test_additional_properties_schema() {
        let found = errors(
            json!({ "properties": { "a": {} }, "additionalProperties": { "type": "integer" } }),
            json!({ "a": "x", "b": "y" }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), "b");
    }

    #[test]
    fn test_property_counts() {
        assert_eq!(
            messages(json!({ "maxProperties": 1 }), json!({ "a": 1, "b": 2 })),
            vec!["Object property count 2 exceeds maximum count of 1."]
        );
        assert_eq!(
            messages(json!({ "minProperties": 1 }), json!({})),
            vec!["Object property count 0 is less than minimum count of 1."]
        );
    }

    #[test]
    fn test_pattern_properties() {
        let found = errors(
            json!({ "patternProperties": { "^x": { "type": "integer" } } }),
            json!({ "xa": "s", "ya": "s" }),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), "xa");
    }

    #[test]
    fn test_invalid_pattern_property_regex() {
        let found = errors(json!({ "patternProperties": { "(": {} } }), json!({ "a": 1 }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::PatternProperties);
        assert!(found[0].message().starts_with(
            "Could not test property names with regex pattern '('. There was an error parsing the regex: "
        ));
    }

    #[test]
    fn test_property_names() {
        let found = errors(json!({ "propertyNames": { "maxLength": 2 } }), json!({ "ab": 1, "abc": 2 }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::PropertyNames);
        assert_eq!(
            found[0].message(),
            "Property name 'abc' does not match the property names schema."
        );
        assert_eq!(found[0].children().len(), 1);
        assert_eq!(
            found[0].children()[0].message(),
            "String 'abc' exceeds maximum length of 2."
        );
    }

    #[test]
    fn test_ignore_case_properties() {
        let settings = ValidatorSettings::new()
            .with_property_name_comparison(PropertyNameComparison::IgnoreCase);
        let found = collect_errors_with(
            &compile(json!({ "properties": { "name": { "type": "string" } }, "required": ["NAME"] })),
            &json!({ "Name": 1 }),
            settings,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Type);
    }
}

#[cfg(test)]
mod dependencies {
    use super::*;

    #[test]
    fn test_property_dependency() {
        assert_eq!(
            messages(json!({ "dependencies": { "a": ["b", "c"] } }), json!({ "a": 1, "c": 2 })),
            vec!["Dependencies for property 'a' failed. Missing required keys: b."]
        );
        assert!(errors(json!({ "dependencies": { "a": ["b"] } }), json!({ "c": 1 })).is_empty());
    }

    #[test]
    fn test_ignore_case_names_literal_property() {
        let settings = ValidatorSettings::new()
            .with_property_name_comparison(PropertyNameComparison::IgnoreCase);
        let found = collect_errors_with(
            &compile(json!({ "dependencies": { "bar": ["foo"] } })),
            &json!({ "Bar": 1 }),
            settings,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].message(),
            "Dependencies for property 'Bar' failed. Missing required keys: foo."
        );
    }

    #[test]
    fn test_schema_dependency() {
        let schema = json!({ "dependentSchemas": { "a": { "required": ["b"] } } });
        let found = errors(schema.clone(), json!({ "a": 1 }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind(), ErrorKind::Dependencies);
        assert_eq!(found[0].message(), "Dependencies for property 'a' failed.");
        assert_eq!(
            found[0].children()[0].message(),
            "Required properties are missing from object: b."
        );

        assert!(errors(schema.clone(), json!({ "c": 1 })).is_empty());
        assert!(errors(schema, json!({ "a": 1, "b": 2 })).is_empty());
    }
}
