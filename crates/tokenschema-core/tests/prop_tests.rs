//! Property-based tests for the streaming validator
//!
//! These tests check that composition results agree with their branches and
//! that validation is deterministic and never fails outright across a wide
//! range of generated documents.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokenschema_core::schema::SchemaRoot;
use tokenschema_core::{collect_errors, is_valid, ErrorKind, Validator};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        16, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map("[a-d]{1,2}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// A schema that exercises most of the keyword families at once
fn kitchen_sink_schema() -> Arc<SchemaRoot> {
    Arc::new(
        SchemaRoot::compile(&json!({
            "$defs": {
                "node": {
                    "anyOf": [
                        { "type": ["null", "boolean", "string"], "maxLength": 10 },
                        { "type": "number", "minimum": -1000, "multipleOf": 0.5 },
                        { "type": "array", "items": { "$ref": "#/$defs/node" }, "uniqueItems": true },
                        {
                            "type": "object",
                            "patternProperties": { "^a": { "$ref": "#/$defs/node" } },
                            "propertyNames": { "maxLength": 1 },
                            "unevaluatedProperties": { "not": { "type": "object" } }
                        }
                    ]
                }
            },
            "oneOf": [{ "$ref": "#/$defs/node" }, { "type": "object", "required": ["b"] }],
            "if": { "type": "array" },
            "then": { "contains": { "type": "string" }, "unevaluatedItems": false },
            "dependentSchemas": { "c": { "required": ["d"] } }
        }))
        .expect("schema should compile"),
    )
}

proptest! {
    #[test]
    fn prop_all_of_reports_each_failing_index(flags in proptest::collection::vec(any::<bool>(), 1..6)) {
        let branches: Vec<Value> = flags
            .iter()
            .map(|valid| if *valid { json!({ "type": "integer" }) } else { json!({ "type": "string" }) })
            .collect();
        let schema = Arc::new(SchemaRoot::compile(&json!({ "allOf": branches })).unwrap());
        let errors = collect_errors(&schema, &json!(7)).unwrap();

        let expected: Vec<String> = flags
            .iter()
            .enumerate()
            .filter(|(_, valid)| !**valid)
            .map(|(index, _)| index.to_string())
            .collect();
        if expected.is_empty() {
            prop_assert!(errors.is_empty());
        } else {
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors[0].kind(), ErrorKind::AllOf);
            prop_assert_eq!(
                errors[0].message(),
                format!(
                    "JSON does not match all schemas from 'allOf'. Invalid schema indexes: {}.",
                    expected.join(", ")
                )
            );
            prop_assert_eq!(errors[0].children().len(), expected.len());
        }
    }

    #[test]
    fn prop_one_of_agrees_with_branches(value in json_value_strategy()) {
        let branches = [
            json!({ "type": "object" }),
            json!({ "type": "array", "maxItems": 2 }),
            json!({ "type": ["string", "integer"] }),
        ];
        let passing = branches
            .iter()
            .filter(|branch| {
                let schema = Arc::new(SchemaRoot::compile(branch).unwrap());
                is_valid(&schema, &value).unwrap()
            })
            .count();

        let schema = Arc::new(SchemaRoot::compile(&json!({ "oneOf": branches })).unwrap());
        prop_assert_eq!(is_valid(&schema, &value).unwrap(), passing == 1);
    }

    #[test]
    fn prop_not_inverts(value in json_value_strategy()) {
        let inner = json!({ "type": "object", "maxProperties": 2 });
        let plain = Arc::new(SchemaRoot::compile(&inner).unwrap());
        let negated = Arc::new(SchemaRoot::compile(&json!({ "not": inner })).unwrap());
        prop_assert_ne!(is_valid(&plain, &value).unwrap(), is_valid(&negated, &value).unwrap());
    }

    #[test]
    fn prop_validation_never_fails_and_is_deterministic(value in json_value_strategy()) {
        let schema = kitchen_sink_schema();
        let mut validator = Validator::for_schema(Arc::clone(&schema));
        validator.collect_errors();

        validator.validate_value(&value).unwrap();
        let first: Vec<String> = validator.take_errors().iter().map(|e| e.to_string()).collect();
        prop_assert!(validator.is_idle());

        validator.validate_value(&value).unwrap();
        let second: Vec<String> = validator.take_errors().iter().map(|e| e.to_string()).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_unconstrained_schema_accepts_everything(value in json_value_strategy()) {
        let schema = Arc::new(SchemaRoot::compile(&json!({})).unwrap());
        prop_assert!(collect_errors(&schema, &value).unwrap().is_empty());
    }
}
