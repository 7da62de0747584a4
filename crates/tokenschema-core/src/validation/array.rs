//! Keywords for array values
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::driver::Validator;
use super::error::ErrorKind;
use super::scope::{ArrayState, Record, RecordKey, Role, Scope, ScopeHeader, ScopeId, ScopeState};
use crate::error::Result;
use crate::number::values_equal;
use crate::schema::{Items, SchemaId};
use crate::token::Token;

impl Validator {
    /// The start or end of an item
    pub(super) fn evaluate_array_child(
        &mut self,
        id: ScopeId,
        scope: &mut Scope,
        token: &Token<'_>,
        depth: usize,
    ) -> Result<()> {
        let Scope { header, state } = scope;
        let ScopeState::Array(array) = state else {
            return Ok(());
        };

        if token.begins_value() {
            self.start_item(id, header, array, token, depth)?;
        }
        if token.is_end() || token.is_scalar() {
            self.end_item(header, array)?;
        }
        Ok(())
    }

    fn start_item(
        &mut self,
        id: ScopeId,
        header: &mut ScopeHeader,
        array: &mut ArrayState,
        token: &Token<'_>,
        depth: usize,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[header.schema];
        let index = array.count;
        array.count += 1;

        let (target, claimed): (Option<SchemaId>, bool) = match &schema.items {
            Some(Items::Single(item)) => (Some(*item), true),
            Some(Items::Positional(items)) => match items.get(index) {
                Some(item) => (Some(*item), true),
                None => match schema.additional_items {
                    Some(additional) if root[additional].is_false() => {
                        let error = self.error(
                            ErrorKind::AdditionalItems,
                            "Index {0} has not been defined and the schema does not allow additional items.",
                            vec![index.into()],
                            header.schema,
                        );
                        self.raise(header, error)?;
                        (None, true)
                    }
                    Some(additional) => (Some(additional), true),
                    None => (None, false),
                },
            },
            None => (None, false),
        };

        if let Some(target) = target {
            self.create_and_evaluate(token, depth, target, id, header.context, Role::Property)?;
            header.open_children += 1;
        }

        if let Some(contains) = schema.contains {
            let context = self.contexts.alloc_conditional();
            let probe = self.create_and_evaluate(token, depth, contains, id, context, Role::Detached)?;
            self.detach(probe);
            header.open_children += 1;
            array.contains.push((index, probe));
        }

        if claimed || !array.tracks_unevaluated {
            return Ok(());
        }
        let Some(unevaluated) = schema.unevaluated_items else {
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

        let candidates: Vec<SchemaId> = schema
            .applicators
            .iter()
            .copied()
            .filter(|applicator| root[*applicator].claims_item(index))
            .collect();
        let evaluated = candidates.iter().any(|c| header.evaluated.contains(c));
        array.records.push(Record {
            key: RecordKey::Item(index),
            scope: record_scope,
            evaluated,
            candidates,
        });
        Ok(())
    }

    /// `uniqueItems`, checked as each item completes
    fn end_item(&mut self, header: &mut ScopeHeader, array: &mut ArrayState) -> Result<()> {
        let root = self.root()?;
        if !root[header.schema].unique_items {
            return Ok(());
        }
        let Some(item) = self.buffer.completed().cloned() else {
            return Ok(());
        };
        if array.items.iter().any(|seen| values_equal(seen, &item)) {
            let error = self
                .error(
                    ErrorKind::UniqueItems,
                    "Non-unique array item at index {0}.",
                    vec![(array.count - 1).into()],
                    header.schema,
                )
                .with_value(Some(item.clone()));
            self.raise(header, error)?;
        }
        array.items.push(item);
        Ok(())
    }

    /// Checks made once the whole array has been read
    pub(super) fn close_array(&mut self, scope: &mut Scope) -> Result<()> {
        let Scope { header, state } = scope;
        let ScopeState::Array(array) = state else {
            return Ok(());
        };
        header.complete = true;

        let root = self.root()?;
        let schema = &root[header.schema];
        let count = array.count as u64;

        if let Some(maximum) = schema.max_items.filter(|max| count > *max) {
            let error = self.error(
                ErrorKind::MaximumItems,
                "Array item count {0} exceeds maximum count of {1}.",
                vec![count.into(), maximum.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }
        if let Some(minimum) = schema.min_items.filter(|min| count < *min) {
            let error = self.error(
                ErrorKind::MinimumItems,
                "Array item count {0} is less than minimum count of {1}.",
                vec![count.into(), minimum.into()],
                header.schema,
            );
            self.raise(header, error)?;
        }

        if self.buffer.is_open() {
            if let Some(value) = self.buffer.completed().cloned() {
                self.check_value(header, schema, &value)?;
            }
        }
        Ok(())
    }

    /// Checks that wait for the array's detached scopes to finish
    pub(super) fn finalize_array(
        &mut self,
        header: &mut ScopeHeader,
        array: &mut ArrayState,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[header.schema];

        let mut matched = Vec::new();
        let mut failures = Vec::new();
        for (index, probe) in std::mem::take(&mut array.contains) {
            if let Some(scope) = self.scopes.header(probe) {
                if scope.is_valid {
                    matched.push(index);
                } else {
                    let context = scope.context;
                    failures.extend(self.contexts.take_errors(context));
                }
            }
            self.release_hold(probe);
        }

        if schema.contains.is_some() {
            let count = matched.len() as u64;
            match schema.min_contains {
                Some(minimum) if count < minimum => {
                    let error = self
                        .error(
                            ErrorKind::MinimumContains,
                            "Contains match count {0} is less than minimum contains count of {1}.",
                            vec![count.into(), minimum.into()],
                            header.schema,
                        )
                        .with_children(failures);
                    self.raise(header, error)?;
                }
                None if count == 0 => {
                    let error = self
                        .error(ErrorKind::Contains, "No items match contains.", Vec::new(), header.schema)
                        .with_children(failures);
                    self.raise(header, error)?;
                }
                _ => {}
            }
            if let Some(maximum) = schema.max_contains.filter(|max| count > *max) {
                let error = self.error(
                    ErrorKind::MaximumContains,
                    "Contains match count {0} exceeds maximum contains count of {1}.",
                    vec![count.into(), maximum.into()],
                    header.schema,
                );
                self.raise(header, error)?;
            }
        }

        for record in std::mem::take(&mut array.records) {
            let (valid, context, owns_context) = match self.scopes.header(record.scope) {
                Some(scope) => (scope.is_valid, scope.context, scope.owns_context),
                None => continue,
            };
            let RecordKey::Item(index) = record.key else {
                self.release_hold(record.scope);
                continue;
            };
            if !record.evaluated && !valid && !matched.contains(&index) {
                let children = if owns_context {
                    self.contexts.take_errors(context)
                } else {
                    Vec::new()
                };
                let error = self
                    .error(
                        ErrorKind::UnevaluatedItems,
                        "Item at index {0} has not been successfully evaluated and the schema does not allow unevaluated items.",
                        vec![index.into()],
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
