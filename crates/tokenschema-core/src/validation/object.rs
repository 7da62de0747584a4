//! Keywords for object values
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::driver::Validator;
use super::error::{ErrorKind, MessageArg};
use super::scope::{ObjectState, Record, RecordKey, Role, Scope, ScopeHeader, ScopeId, ScopeState};
use crate::error::Result;
use crate::schema::{names_match, Dependency, SchemaId};
use crate::token::Token;

impl Validator {
    /// A property name or the start of a property value
    pub(super) fn evaluate_object_child(
        &mut self,
        id: ScopeId,
        scope: &mut Scope,
        token: &Token<'_>,
        depth: usize,
    ) -> Result<()> {
        let Scope { header, state } = scope;
        let ScopeState::Object(object) = state else {
            return Ok(());
        };

        match token {
            Token::PropertyName(name) => self.read_property_name(id, header, object, name, depth),
            token if token.begins_value() => {
                let Some(name) = object.current.take() else {
                    return Ok(());
                };
                self.start_property_value(id, header, object, name, token, depth)
            }
            _ => Ok(()),
        }
    }

    fn read_property_name(
        &mut self,
        id: ScopeId,
        header: &mut ScopeHeader,
        object: &mut ObjectState,
        name: &str,
        depth: usize,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[header.schema];
        let ignore_case = self.settings.ignore_case();

        object.property_count += 1;
        object.names.push(name.to_string());
        object.current = Some(name.to_string());

        if let Some(names_schema) = schema.property_names {
            let context = self.contexts.alloc_conditional();
            let probe = self.create_and_evaluate(
                &Token::String(name),
                depth,
                names_schema,
                id,
                context,
                Role::Detached,
            )?;
            self.detach(probe);
            header.open_children += 1;
            object.name_probes.push((name.to_string(), probe));
        }

        let rejects_additional = schema
            .additional_properties
            .is_some_and(|additional| root[additional].is_false());
        if rejects_additional && !self.matches_declared_property(schema, name, ignore_case)? {
            let error = self.error(
                ErrorKind::AdditionalProperties,
                "Property '{0}' has not been defined and the schema does not allow additional properties.",
                vec![name.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }
        Ok(())
    }

    fn matches_declared_property(
        &self,
        schema: &crate::schema::Schema,
        name: &str,
        ignore_case: bool,
    ) -> Result<bool> {
        if schema.property(name, ignore_case).is_some() {
            return Ok(true);
        }
        for (regex, _) in &schema.pattern_properties {
            if regex.is_match(name, self.settings.regex_timeout)? == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn start_property_value(
        &mut self,
        id: ScopeId,
        header: &mut ScopeHeader,
        object: &mut ObjectState,
        name: String,
        token: &Token<'_>,
        depth: usize,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[header.schema];
        let ignore_case = self.settings.ignore_case();
        let timeout = self.settings.regex_timeout;

        let mut targets: Vec<SchemaId> = Vec::new();
        targets.extend(schema.property(&name, ignore_case));
        for (regex, target) in &schema.pattern_properties {
            if regex.is_match(&name, timeout)? == Some(true) {
                targets.push(*target);
            }
        }
        let claimed = !targets.is_empty();
        if !claimed {
            if let Some(additional) = schema.additional_properties {
                if !root[additional].is_false() {
                    targets.push(additional);
                }
            }
        }

        for target in targets {
            self.create_and_evaluate(token, depth, target, id, header.context, Role::Property)?;
            header.open_children += 1;
        }

        if claimed || !object.tracks_unevaluated {
            return Ok(());
        }
        let Some(unevaluated) = schema.unevaluated_properties else {
            return Ok(());
        };

        let record_scope = if root[unevaluated].is_false() {
            self.create_sentinel(token, depth, unevaluated, id)?
        } else {
            let context = self.contexts.alloc_conditional();
            self.create_and_evaluate(token, depth, unevaluated, id, context, Role::Detached)?
        };
        self.detach(record_scope);
        header.open_children += 1;

        let mut candidates = Vec::new();
        for &applicator in &schema.applicators {
            if root[applicator].claims_property(&name, ignore_case, timeout)? {
                candidates.push(applicator);
            }
        }
        let evaluated = candidates.iter().any(|c| header.evaluated.contains(c));
        object.records.push(Record {
            key: RecordKey::Property(name),
            scope: record_scope,
            evaluated,
            candidates,
        });
        Ok(())
    }

    /// Checks made once the whole object has been read
    pub(super) fn close_object(&mut self, scope: &mut Scope) -> Result<()> {
        let Scope { header, state } = scope;
        let ScopeState::Object(object) = state else {
            return Ok(());
        };
        header.complete = true;

        let root = self.root()?;
        let schema = &root[header.schema];
        let ignore_case = self.settings.ignore_case();
        let is_read = |name: &str| object.names.iter().any(|read| names_match(name, read, ignore_case));

        let missing: Vec<String> = schema
            .required
            .iter()
            .filter(|name| !is_read(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            let error = self.error(
                ErrorKind::Required,
                "Required properties are missing from object: {0}.",
                vec![missing.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }

        if let Some(maximum) = schema.max_properties.filter(|max| object.property_count > *max) {
            let error = self.error(
                ErrorKind::MaximumProperties,
                "Object property count {0} exceeds maximum count of {1}.",
                vec![object.property_count.into(), maximum.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }
        if let Some(minimum) = schema.min_properties.filter(|min| object.property_count < *min) {
            let error = self.error(
                ErrorKind::MinimumProperties,
                "Object property count {0} is less than minimum count of {1}.",
                vec![object.property_count.into(), minimum.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }

        for (property, dependency) in &schema.dependencies {
            let Dependency::Required(keys) = dependency else {
                continue;
            };
            let Some(literal) = object
                .names
                .iter()
                .find(|read| names_match(property, read, ignore_case))
            else {
                continue;
            };
            let missing: Vec<String> = keys.iter().filter(|key| !is_read(key.as_str())).cloned().collect();
            if !missing.is_empty() {
                let error = self.error(
                    ErrorKind::Dependencies,
                    "Dependencies for property '{0}' failed. Missing required keys: {1}.",
                    vec![literal.as_str().into(), missing.into()],
                    header.schema,
                );
                self.raise(header, error)?;
            }
        }

        for (regex, _) in &schema.pattern_properties {
            if let Some(reason) = regex.error() {
                let error = self.error(
                    ErrorKind::PatternProperties,
                    "Could not test property names with regex pattern '{0}'. There was an error parsing the regex: {1}",
                    vec![regex.as_str().into(), reason.into()],
                    header.schema,
                );
                self.raise(header, error)?;
            }
        }

        if self.buffer.is_open() {
            if let Some(value) = self.buffer.completed().cloned() {
                self.check_value(header, schema, &value)?;
            }
        }
        Ok(())
    }

    /// Checks that wait for the object's detached scopes to finish
    pub(super) fn finalize_object(
        &mut self,
        header: &mut ScopeHeader,
        object: &mut ObjectState,
    ) -> Result<()> {
        for (name, probe) in std::mem::take(&mut object.name_probes) {
            let (valid, context) = match self.scopes.header(probe) {
                Some(probe) => (probe.is_valid, probe.context),
                None => continue,
            };
            if !valid {
                let children = self.contexts.take_errors(context);
                let error = self
                    .error(
                        ErrorKind::PropertyNames,
                        "Property name '{0}' does not match the property names schema.",
                        vec![MessageArg::from(name.as_str())],
                        header.schema,
                    )
                    .with_value(Some(serde_json::Value::String(name)))
                    .with_children(children);
                self.raise(header, error)?;
            }
            self.release_hold(probe);
        }

        for record in std::mem::take(&mut object.records) {
            let (valid, context, owns_context) = match self.scopes.header(record.scope) {
                Some(scope) => (scope.is_valid, scope.context, scope.owns_context),
                None => continue,
            };
            if let (false, false, RecordKey::Property(name)) = (record.evaluated, valid, record.key) {
                let children = if owns_context {
                    self.contexts.take_errors(context)
                } else {
                    Vec::new()
                };
                let error = self
                    .error(
                        ErrorKind::UnevaluatedProperties,
                        "Property '{0}' has not been successfully evaluated and the schema does not allow unevaluated properties.",
                        vec![name.into()],
                        header.schema,
                    )
                    .with_children(children);
                self.raise(header, error)?;
            }
            self.release_hold(record.scope);
        }
        Ok(())
    }
}
