//! The streaming validator
//!
//! [`Validator::feed`] takes one token at a time, together with its nesting
//! depth, and drives every scope that is still interested in it. Each value
//! in the document gets one scope per schema that applies to it. Composition
//! keywords (`allOf`, `anyOf`, `oneOf`, `not`, `$ref`, `if`, schema
//! dependencies) get a conditional scope that owns one branch scope per
//! subschema and resolves once all of them have finished.
//!
//! Depth convention: a value's start token, end token and scalar token all
//! carry the value's depth; property names and child values carry depth + 1.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::buffer::ValueBuffer;
use super::context::{ContextId, Contexts};
use super::error::{ErrorKind, LineInfo, MessageArg, ValidationError};
use super::path::PathTracker;
use super::scope::{Role, Scope, ScopeArena, ScopeHeader, ScopeId, ScopeInit, ScopeKind, ScopeState};
use super::settings::{CustomValidatorContext, ValidatorSettings};
use crate::error::{Error, Result};
use crate::number::values_equal;
use crate::reader::{walk_value, TokenSink};
use crate::schema::{JsonType, Schema, SchemaId, SchemaRoot};
use crate::token::Token;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where emitted errors go
enum ErrorSink {
    /// Fail the current `feed` call with [`Error::Validation`]
    Raise,
    Handler(Box<dyn FnMut(ValidationError) + Send>),
    Collect(Vec<ValidationError>),
}

/// Streaming JSON Schema validator
pub struct Validator {
    pub(super) settings: ValidatorSettings,
    pub(super) scopes: ScopeArena,
    pub(super) active: Vec<ScopeId>,
    pub(super) contexts: Contexts,
    pub(super) buffer: ValueBuffer,
    pub(super) path: PathTracker,
    line_info: Option<LineInfo>,
    sink: ErrorSink,
}

impl Validator {
    pub fn new(settings: ValidatorSettings) -> Self {
        Self {
            settings,
            scopes: ScopeArena::default(),
            active: Vec::new(),
            contexts: Contexts::default(),
            buffer: ValueBuffer::default(),
            path: PathTracker::default(),
            line_info: None,
            sink: ErrorSink::Raise,
        }
    }

    /// Validator for `schema` with default settings
    pub fn for_schema(schema: Arc<SchemaRoot>) -> Self {
        Self::new(ValidatorSettings::new().with_schema(schema))
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Deliver each error to `handler` instead of failing `feed`
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(ValidationError) + Send + 'static,
    {
        self.sink = ErrorSink::Handler(Box::new(handler));
        self
    }

    /// Keep errors for [`Validator::take_errors`] instead of failing `feed`
    pub fn collect_errors(&mut self) -> &mut Self {
        if !matches!(self.sink, ErrorSink::Collect(_)) {
            self.sink = ErrorSink::Collect(Vec::new());
        }
        self
    }

    /// Errors collected so far, in emission order
    pub fn take_errors(&mut self) -> Vec<ValidationError> {
        match &mut self.sink {
            ErrorSink::Collect(errors) => std::mem::take(errors),
            _ => Vec::new(),
        }
    }

    /// Source position attached to errors raised by the following tokens
    pub fn set_line_info(&mut self, line_number: usize, line_position: usize) {
        self.line_info = Some(LineInfo {
            line_number,
            line_position,
        });
    }

    pub fn clear_line_info(&mut self) {
        self.line_info = None;
    }

    /// No value is in progress
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Abandon the value in progress
    pub fn reset(&mut self) {
        self.active.clear();
        self.scopes.clear();
        self.contexts.clear();
        self.buffer = ValueBuffer::default();
        self.path.reset();
    }

    /// Validate an in-memory document by replaying it as tokens
    pub fn validate_value(&mut self, value: &Value) -> Result<()> {
        walk_value(value, self)
    }

    /// Validate the next token of the document
    pub fn feed(&mut self, token: Token<'_>, depth: usize) -> Result<()> {
        if let Token::Comment(_) = token {
            return Ok(());
        }
        if depth == 0 {
            self.retire_finished();
        }
        if self.active.is_empty() {
            let root = self.root()?;
            if !token.begins_value() {
                return Err(Error::invalid_token(
                    token.kind(),
                    depth,
                    "expected the start of a value",
                ));
            }
            tracing::trace!(depth, kind = %token.kind(), "starting root value");
            self.path.reset();
            let context = self.contexts.root();
            self.create_token_scope(&token, depth, root.root_id(), None, context, Role::Root)?;
        }

        self.path.before(&token);
        self.buffer.write(&token);

        let result = self.evaluate_active(&token, depth).and_then(|()| self.settle());

        self.buffer.close_if_idle();
        self.path.after(&token);
        self.retire_finished();
        result
    }

    pub(super) fn root(&self) -> Result<Arc<SchemaRoot>> {
        self.settings.schema.clone().ok_or(Error::SchemaNotSet)
    }

    fn evaluate_active(&mut self, token: &Token<'_>, depth: usize) -> Result<()> {
        let mut index = self.active.len();
        while index > 0 {
            index -= 1;
            let id = self.active[index];
            self.evaluate(id, token, depth)?;
        }
        Ok(())
    }

    /// Evaluate the scopes created since `start`, newest first
    fn evaluate_created(&mut self, start: usize, token: &Token<'_>, depth: usize) -> Result<()> {
        let mut index = self.active.len();
        while index > start {
            index -= 1;
            let id = self.active[index];
            self.evaluate(id, token, depth)?;
        }
        Ok(())
    }

    fn evaluate(&mut self, id: ScopeId, token: &Token<'_>, depth: usize) -> Result<()> {
        let Some(mut scope) = self.scopes.take(id) else {
            return Ok(());
        };
        let result = if scope.header.complete {
            Ok(())
        } else {
            self.evaluate_scope(id, &mut scope, token, depth)
        };
        self.scopes.restore(id, scope);
        result
    }

    fn evaluate_scope(
        &mut self,
        id: ScopeId,
        scope: &mut Scope,
        token: &Token<'_>,
        depth: usize,
    ) -> Result<()> {
        let Some(relative) = depth.checked_sub(scope.header.initial_depth) else {
            return Ok(());
        };
        let first = !scope.header.started;
        scope.header.started = true;
        let closes = relative == 0 && (token.is_end() || token.is_scalar());

        match scope.header.kind {
            ScopeKind::Primitive => {
                if relative == 0 {
                    self.start_value(scope, token)?;
                    self.validate_primitive(&mut scope.header, token)?;
                    scope.header.complete = true;
                }
                Ok(())
            }
            ScopeKind::Object => match relative {
                0 if first => self.start_value(scope, token),
                0 if closes => self.close_object(scope),
                1 => self.evaluate_object_child(id, scope, token, depth),
                _ => Ok(()),
            },
            ScopeKind::Array => match relative {
                0 if first => self.start_value(scope, token),
                0 if closes => self.close_array(scope),
                1 => self.evaluate_array_child(id, scope, token, depth),
                _ => Ok(()),
            },
            _ => {
                if closes {
                    scope.header.complete = true;
                }
                Ok(())
            }
        }
    }

    /// Checks made at a value's first token
    fn start_value(&mut self, scope: &mut Scope, token: &Token<'_>) -> Result<()> {
        let root = self.root()?;
        let schema = &root[scope.header.schema];
        let header = &mut scope.header;

        if schema.is_false() {
            let error = self
                .error(ErrorKind::Valid, "Schema always fails validation.", Vec::new(), header.schema)
                .with_value(token.to_value());
            self.raise(header, error)?;
        }

        if let Some((actual, integral)) = value_type(token) {
            if !schema.types.accepts(actual, integral) {
                let error = self
                    .error(
                        ErrorKind::Type,
                        "Invalid type. Expected {0} but got {1}.",
                        vec![schema.types.to_string().into(), actual.to_string().into()],
                        header.schema,
                    )
                    .with_value(token.to_value());
                self.raise(header, error)?;
            }
        }

        header.validators.clear();
        for (index, validator) in self.settings.validators.iter().enumerate() {
            if validator.can_validate(schema) {
                header.validators.push(index);
            }
        }

        let buffered = schema.enumeration.is_some()
            || schema.constant.is_some()
            || !header.validators.is_empty();
        match &mut scope.state {
            ScopeState::Object(object) => {
                object.tracks_unevaluated = root.tracks_evaluation()
                    && schema.unevaluated_properties.is_some()
                    && schema.additional_properties.is_none();
                if buffered {
                    self.buffer.ensure_open(token);
                }
            }
            ScopeState::Array(array) => {
                array.tracks_unevaluated = root.tracks_evaluation()
                    && schema.unevaluated_items.is_some()
                    && !matches!(schema.items, Some(crate::schema::Items::Single(_)))
                    && schema.additional_items.is_none();
                if buffered || schema.unique_items {
                    self.buffer.ensure_open(token);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// `enum`, `const` and custom validators over a complete value
    pub(super) fn check_value(
        &mut self,
        header: &mut ScopeHeader,
        schema: &Schema,
        value: &Value,
    ) -> Result<()> {
        if let Some(options) = &schema.enumeration {
            if !options.iter().any(|option| values_equal(option, value)) {
                let error = self
                    .error(
                        ErrorKind::Enum,
                        "Value {0} is not defined in enum.",
                        vec![MessageArg::Value(value.clone())],
                        header.schema,
                    )
                    .with_value(Some(value.clone()));
                self.raise(header, error)?;
            }
        }

        if let Some(expected) = &schema.constant {
            if !values_equal(expected, value) {
                let error = self
                    .error(
                        ErrorKind::Const,
                        "Value {0} does not match const.",
                        vec![MessageArg::Value(value.clone())],
                        header.schema,
                    )
                    .with_value(Some(value.clone()));
                self.raise(header, error)?;
            }
        }

        for position in 0..header.validators.len() {
            let Some(validator) = self.settings.validators.get(header.validators[position]).cloned()
            else {
                continue;
            };
            let mut context = CustomValidatorContext::new(schema);
            validator.validate(value, &mut context);
            for message in context.into_messages() {
                let error = self
                    .error(ErrorKind::Validator, "{0}", vec![message.into()], header.schema)
                    .with_value(Some(value.clone()));
                self.raise(header, error)?;
            }
        }
        Ok(())
    }

    /// Create the scope for a value and the conditionals of its schema
    pub(super) fn create_token_scope(
        &mut self,
        token: &Token<'_>,
        depth: usize,
        schema: SchemaId,
        parent: Option<ScopeId>,
        context: ContextId,
        role: Role,
    ) -> Result<ScopeId> {
        let kind = match token {
            Token::StartObject => ScopeKind::Object,
            Token::StartArray => ScopeKind::Array,
            _ => ScopeKind::Primitive,
        };
        let id = self.scopes.alloc(ScopeInit {
            kind,
            role,
            depth,
            context,
            parent,
            schema,
        });
        self.active.push(id);
        self.create_conditionals(id, token, depth, schema)?;
        Ok(id)
    }

    /// Create a scope for a child value and evaluate it, along with its
    /// conditional branches, against the token that started it
    pub(super) fn create_and_evaluate(
        &mut self,
        token: &Token<'_>,
        depth: usize,
        schema: SchemaId,
        parent: ScopeId,
        context: ContextId,
        role: Role,
    ) -> Result<ScopeId> {
        let start = self.active.len();
        let id = self.create_token_scope(token, depth, schema, Some(parent), context, role)?;
        self.evaluate_created(start, token, depth)?;
        Ok(id)
    }

    /// Placeholder scope for a value rejected by a `false` schema
    pub(super) fn create_sentinel(
        &mut self,
        token: &Token<'_>,
        depth: usize,
        schema: SchemaId,
        parent: ScopeId,
    ) -> Result<ScopeId> {
        let start = self.active.len();
        let context = self.contexts.root();
        let id = self.scopes.alloc(ScopeInit {
            kind: ScopeKind::AlwaysInvalid,
            role: Role::Detached,
            depth,
            context,
            parent: Some(parent),
            schema,
        });
        self.active.push(id);
        self.evaluate_created(start, token, depth)?;
        Ok(id)
    }

    /// Give a detached scope a private context and hold it for its parent
    pub(super) fn detach(&mut self, id: ScopeId) {
        if let Some(header) = self.scopes.header_mut(id) {
            header.owns_context = true;
            header.holds += 1;
        }
    }

    /// Drop one hold; a parked scope retires with its last hold
    pub(super) fn release_hold(&mut self, id: ScopeId) {
        let Some(header) = self.scopes.header_mut(id) else {
            return;
        };
        header.holds = header.holds.saturating_sub(1);
        if header.holds > 0 || !header.parked {
            return;
        }
        if header.owns_context {
            let context = header.context;
            self.contexts.release(context);
        }
        self.scopes.retire(id);
    }

    /// Finalize completed scopes and resolve conditionals until nothing changes
    fn settle(&mut self) -> Result<()> {
        loop {
            let mut progressed = false;
            let mut index = self.active.len();
            while index > 0 {
                index -= 1;
                let id = self.active[index];
                let Some(header) = self.scopes.header(id) else {
                    continue;
                };
                if header.finalized || !header.complete {
                    continue;
                }
                let conditional = header.kind.is_conditional();
                let waiting = header.open_conditionals > 0 || header.open_children > 0;
                if conditional {
                    if self.branches_finalized(id) {
                        self.resolve_conditional(id)?;
                        progressed = true;
                    }
                } else if !waiting {
                    self.finalize(id)?;
                    progressed = true;
                }
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    fn finalize(&mut self, id: ScopeId) -> Result<()> {
        let Some(mut scope) = self.scopes.take(id) else {
            return Ok(());
        };
        let result = match &mut scope.state {
            ScopeState::Object(object) => self.finalize_object(&mut scope.header, object),
            ScopeState::Array(array) => self.finalize_array(&mut scope.header, array),
            _ => Ok(()),
        };
        scope.header.finalized = true;

        let role = scope.header.role;
        let parent = scope.header.parent;
        let valid = scope.header.is_valid;
        let context = scope.header.context;
        let evaluated = if role == Role::Branch && valid && self.tracks_evaluation() {
            let mut schemas = Vec::with_capacity(scope.header.evaluated.len() + 1);
            schemas.push(scope.header.schema);
            schemas.extend_from_slice(&scope.header.evaluated);
            Some(schemas)
        } else {
            None
        };
        self.scopes.restore(id, scope);
        result?;

        if let Some(parent) = parent.and_then(|parent| self.scopes.header_mut(parent)) {
            if matches!(role, Role::Property | Role::Detached) {
                parent.open_children = parent.open_children.saturating_sub(1);
            }
            if role == Role::Property && !valid {
                parent.is_valid = false;
            }
        }
        if let Some(schemas) = evaluated {
            self.contexts.push_evaluated(context, &schemas);
        }
        Ok(())
    }

    /// Return finished scopes to their pools; finished scopes still held by
    /// a parent are parked until `release_hold` retires them
    fn retire_finished(&mut self) {
        let scopes = &mut self.scopes;
        let contexts = &mut self.contexts;
        self.active.retain(|&id| {
            let Some(header) = scopes.header_mut(id) else {
                return false;
            };
            if !header.finalized {
                return true;
            }
            if header.holds > 0 {
                header.parked = true;
                return false;
            }
            if header.owns_context {
                contexts.release(header.context);
            }
            scopes.retire(id);
            false
        });
    }

    pub(super) fn tracks_evaluation(&self) -> bool {
        self.settings
            .schema
            .as_ref()
            .is_some_and(|root| root.tracks_evaluation())
    }

    /// Build an error at the current path
    pub(super) fn error(
        &self,
        kind: ErrorKind,
        template: &'static str,
        args: Vec<MessageArg>,
        schema: SchemaId,
    ) -> ValidationError {
        ValidationError::new(kind, template, args, self.path.current(), schema)
            .with_line_info(self.line_info)
    }

    /// Mark a scope invalid and report the error to its context
    pub(super) fn raise(&mut self, header: &mut ScopeHeader, error: ValidationError) -> Result<()> {
        header.is_valid = false;
        self.deliver(header.context, error)
    }

    pub(super) fn deliver(&mut self, context: ContextId, error: ValidationError) -> Result<()> {
        match self.contexts.deliver(context, error) {
            Some(error) => self.emit(error),
            None => Ok(()),
        }
    }

    fn emit(&mut self, error: ValidationError) -> Result<()> {
        if let Some(root) = &self.settings.schema {
            root.known_schemas().ensure(root);
            error.resolve_schema_uris(root.known_schemas());
        }
        tracing::debug!(kind = %error.kind(), path = error.path(), "validation error");

        match &mut self.sink {
            ErrorSink::Raise => Err(Error::from(error)),
            ErrorSink::Handler(handler) => {
                handler(error);
                Ok(())
            }
            ErrorSink::Collect(errors) => {
                errors.push(error);
                Ok(())
            }
        }
    }
}

impl TokenSink for Validator {
    fn feed(&mut self, token: Token<'_>, depth: usize) -> Result<()> {
        Validator::feed(self, token, depth)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("settings", &self.settings)
            .field("active", &self.active.len())
            .field("line_info", &self.line_info)
            .finish()
    }
}

/// JSON type of the value a token begins, and whether a float is integral
fn value_type(token: &Token<'_>) -> Option<(JsonType, bool)> {
    let ty = match token {
        Token::StartObject => (JsonType::Object, false),
        Token::StartArray => (JsonType::Array, false),
        Token::String(_) | Token::Date(_) | Token::Bytes(_) => (JsonType::String, false),
        Token::Integer(_) | Token::BigInteger(_) => (JsonType::Integer, true),
        Token::Float(f) => (JsonType::Number, f.is_finite() && f.fract() == 0.0),
        Token::Boolean(_) => (JsonType::Boolean, false),
        Token::Null | Token::Undefined => (JsonType::Null, false),
        _ => return None,
    };
    Some(ty)
}
