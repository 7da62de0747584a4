//! Composition keywords
//!
//! Each `allOf`, `anyOf`, `oneOf`, `not`, `$ref`, `if` and schema dependency
//! of a value's schema becomes a conditional scope. Its branch scopes report
//! into the conditional's own contexts, and the conditional decides once
//! every branch has finished whether to pass, and which buffered errors to
//! surface as children of its aggregate error.
//!
//! Branches that would re-enter an evaluation already in progress for the
//! same value are not created; they count as valid.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::context::ContextId;
use super::driver::Validator;
use super::error::{ErrorKind, MessageArg, ValidationError};
use super::scope::{Branch, Role, ScopeId, ScopeInit, ScopeKind, ScopeState};
use crate::error::Result;
use crate::schema::{names_match, Dependency, SchemaId};
use crate::token::Token;

/// Branch layout of a conditional about to be created
struct Plan {
    kind: ScopeKind,
    /// Branch schemas with the index of the context each reports to
    branches: Vec<(SchemaId, usize)>,
    contexts: usize,
    then_branch: Option<usize>,
    else_branch: Option<usize>,
    property: Option<String>,
}

impl Plan {
    fn shared(kind: ScopeKind, schemas: impl IntoIterator<Item = SchemaId>) -> Self {
        Self {
            kind,
            branches: schemas.into_iter().map(|schema| (schema, 0)).collect(),
            contexts: 1,
            then_branch: None,
            else_branch: None,
            property: None,
        }
    }
}

/// Outcome of a resolved conditional
struct Verdict {
    error: Option<ValidationError>,
    evaluated: Vec<SchemaId>,
}

impl Validator {
    /// Create the conditionals a schema needs for the value starting at `token`
    pub(super) fn create_conditionals(
        &mut self,
        owner: ScopeId,
        token: &Token<'_>,
        depth: usize,
        schema_id: SchemaId,
    ) -> Result<()> {
        let root = self.root()?;
        let schema = &root[schema_id];

        let mut plans = Vec::new();
        if !schema.all_of.is_empty() {
            plans.push(Plan::shared(ScopeKind::AllOf, schema.all_of.iter().copied()));
        }
        if !schema.any_of.is_empty() {
            plans.push(Plan::shared(ScopeKind::AnyOf, schema.any_of.iter().copied()));
        }
        if !schema.one_of.is_empty() {
            plans.push(Plan::shared(ScopeKind::OneOf, schema.one_of.iter().copied()));
        }
        if let Some(not) = schema.not {
            plans.push(Plan::shared(ScopeKind::Not, [not]));
        }
        if let Some(reference) = schema.reference {
            plans.push(Plan::shared(ScopeKind::Ref, [reference]));
        }
        if let Some(condition) = schema.if_schema {
            let mut plan = Plan::shared(ScopeKind::IfThenElse, [condition]);
            plan.contexts = 3;
            if let Some(then_schema) = schema.then_schema {
                plan.then_branch = Some(plan.branches.len());
                plan.branches.push((then_schema, 1));
            }
            if let Some(else_schema) = schema.else_schema {
                plan.else_branch = Some(plan.branches.len());
                plan.branches.push((else_schema, 2));
            }
            plans.push(plan);
        }
        if matches!(token, Token::StartObject) {
            for (property, dependency) in &schema.dependencies {
                if let Dependency::Schema(dependent) = dependency {
                    let mut plan = Plan::shared(ScopeKind::DependentSchema, [*dependent]);
                    plan.property = Some(property.clone());
                    plans.push(plan);
                }
            }
        }

        for plan in plans {
            self.create_conditional(owner, token, depth, schema_id, plan)?;
        }
        Ok(())
    }

    fn create_conditional(
        &mut self,
        owner: ScopeId,
        token: &Token<'_>,
        depth: usize,
        schema: SchemaId,
        plan: Plan,
    ) -> Result<()> {
        let Some(owner_context) = self.scopes.header(owner).map(|header| header.context) else {
            return Ok(());
        };
        let conditional = self.scopes.alloc(ScopeInit {
            kind: plan.kind,
            role: Role::Keyword,
            depth,
            context: owner_context,
            parent: Some(owner),
            schema,
        });
        self.active.push(conditional);
        if let Some(header) = self.scopes.header_mut(owner) {
            header.open_conditionals += 1;
        }

        let contexts: Vec<ContextId> = (0..plan.contexts)
            .map(|_| self.contexts.alloc_conditional())
            .collect();
        let mut branches: Vec<Branch> = Vec::with_capacity(plan.branches.len());

        for (branch_schema, slot) in plan.branches {
            let context = contexts[slot];
            let scope = if self.is_reentrant(conditional, branch_schema, depth) {
                tracing::debug!(
                    schema = branch_schema.index(),
                    depth,
                    "skipping reentrant branch"
                );
                None
            } else if let Some(existing) = branches
                .iter()
                .find(|b| b.schema == branch_schema && b.context == context)
            {
                existing.scope
            } else if let Some(shared) = self.find_shared(owner, conditional, branch_schema, depth) {
                self.share_scope(shared, context);
                Some(shared)
            } else {
                Some(self.create_token_scope(
                    token,
                    depth,
                    branch_schema,
                    Some(conditional),
                    context,
                    Role::Branch,
                )?)
            };

            if let Some(header) = scope.and_then(|id| self.scopes.header_mut(id)) {
                header.holds += 1;
            }
            branches.push(Branch {
                schema: branch_schema,
                scope,
                context,
            });
        }

        if let Some(ScopeState::Conditional(state)) =
            self.scopes.get_mut(conditional).map(|scope| &mut scope.state)
        {
            state.branches = branches;
            state.contexts = contexts;
            state.then_branch = plan.then_branch;
            state.else_branch = plan.else_branch;
            state.property = plan.property;
        }
        Ok(())
    }

    /// Whether evaluating `schema` at `depth` is already in progress above
    /// this conditional
    fn is_reentrant(&self, conditional: ScopeId, schema: SchemaId, depth: usize) -> bool {
        let mut current = self.scopes.header(conditional).and_then(|header| header.parent);
        while let Some(id) = current {
            let Some(header) = self.scopes.header(id) else {
                break;
            };
            if header.initial_depth != depth {
                break;
            }
            if !header.kind.is_conditional() && header.schema == schema {
                return true;
            }
            current = header.parent;
        }
        false
    }

    /// An unstarted branch scope for the same schema and value created by a
    /// sibling conditional of the same owner
    fn find_shared(
        &self,
        owner: ScopeId,
        conditional: ScopeId,
        schema: SchemaId,
        depth: usize,
    ) -> Option<ScopeId> {
        for &id in self.active.iter().rev() {
            if id == owner {
                break;
            }
            let Some(header) = self.scopes.header(id) else {
                continue;
            };
            if header.role != Role::Branch
                || header.started
                || header.schema != schema
                || header.initial_depth != depth
            {
                continue;
            }
            let sibling = header.parent.filter(|parent| *parent != conditional).and_then(|parent| {
                self.scopes
                    .header(parent)
                    .filter(|p| p.kind.is_conditional() && p.parent == Some(owner))
            });
            if sibling.is_some() {
                return Some(id);
            }
        }
        None
    }

    /// Make a branch scope also report to `context`
    fn share_scope(&mut self, id: ScopeId, context: ContextId) {
        let Some(header) = self.scopes.header_mut(id) else {
            return;
        };
        if header.owns_context {
            let composite = header.context;
            self.contexts.add_member(composite, context);
        } else {
            let composite = self.contexts.alloc_composite(vec![header.context, context]);
            header.context = composite;
            header.owns_context = true;
        }
    }

    pub(super) fn branches_finalized(&self, conditional: ScopeId) -> bool {
        match self.scopes.get(conditional).map(|scope| &scope.state) {
            Some(ScopeState::Conditional(state)) => state.branches.iter().all(|branch| {
                branch.scope.map_or(true, |id| {
                    self.scopes.header(id).map_or(true, |header| header.finalized)
                })
            }),
            _ => true,
        }
    }

    fn branch_valid(&self, branch: &Branch) -> bool {
        branch
            .scope
            .and_then(|id| self.scopes.header(id))
            .map_or(true, |header| header.is_valid)
    }

    /// Decide a conditional whose branches have all finished
    pub(super) fn resolve_conditional(&mut self, id: ScopeId) -> Result<()> {
        let Some(mut scope) = self.scopes.take(id) else {
            return Ok(());
        };
        let kind = scope.header.kind;
        let owner = scope.header.parent;
        let schema = scope.header.schema;
        let (branches, contexts, then_branch, else_branch, property) = match &mut scope.state {
            ScopeState::Conditional(state) => (
                std::mem::take(&mut state.branches),
                std::mem::take(&mut state.contexts),
                state.then_branch,
                state.else_branch,
                state.property.take(),
            ),
            _ => (Vec::new(), Vec::new(), None, None, None),
        };
        scope.header.finalized = true;
        self.scopes.restore(id, scope);

        let verdict = match (kind, contexts.first().copied()) {
            (_, None) => Verdict {
                error: None,
                evaluated: Vec::new(),
            },
            (ScopeKind::AllOf, Some(context)) => self.resolve_all_of(&branches, context, schema),
            (ScopeKind::AnyOf, Some(context)) => self.resolve_any_of(&branches, context, schema),
            (ScopeKind::OneOf, Some(context)) => self.resolve_one_of(&branches, context, schema),
            (ScopeKind::Not, Some(_)) => self.resolve_not(&branches, schema),
            (ScopeKind::Ref, Some(context)) => self.resolve_single(
                &branches,
                context,
                schema,
                ErrorKind::Ref,
                "JSON does not match schema from '$ref'.",
            ),
            (ScopeKind::IfThenElse, Some(_)) => {
                self.resolve_if(&branches, &contexts, then_branch, else_branch, schema)
            }
            (ScopeKind::DependentSchema, Some(context)) => {
                self.resolve_dependency(owner, property, &branches, context, schema)
            }
            _ => Verdict {
                error: None,
                evaluated: Vec::new(),
            },
        };

        for branch in &branches {
            if let Some(scope) = branch.scope {
                self.release_hold(scope);
            }
        }
        for context in contexts {
            self.contexts.release(context);
        }

        let Some(owner) = owner else {
            return Ok(());
        };
        let result = match verdict.error {
            Some(error) => {
                let context = match self.scopes.header_mut(owner) {
                    Some(header) => {
                        header.is_valid = false;
                        header.context
                    }
                    None => return Ok(()),
                };
                self.deliver(context, error)
            }
            None => {
                if self.tracks_evaluation() && !verdict.evaluated.is_empty() {
                    self.child_validated(owner, &verdict.evaluated);
                }
                Ok(())
            }
        };

        if let Some(header) = self.scopes.header_mut(owner) {
            header.open_conditionals = header.open_conditionals.saturating_sub(1);
        }
        result
    }

    fn resolve_all_of(&mut self, branches: &[Branch], context: ContextId, schema: SchemaId) -> Verdict {
        let invalid: Vec<String> = branches
            .iter()
            .enumerate()
            .filter(|(_, branch)| !self.branch_valid(branch))
            .map(|(index, _)| index.to_string())
            .collect();
        if invalid.is_empty() {
            return self.passed(context);
        }
        let children = self.contexts.take_errors(context);
        Verdict {
            error: Some(
                self.error(
                    ErrorKind::AllOf,
                    "JSON does not match all schemas from 'allOf'. Invalid schema indexes: {0}.",
                    vec![invalid.into()],
                    schema,
                )
                .with_children(children),
            ),
            evaluated: Vec::new(),
        }
    }

    fn resolve_any_of(&mut self, branches: &[Branch], context: ContextId, schema: SchemaId) -> Verdict {
        if branches.iter().any(|branch| self.branch_valid(branch)) {
            return self.passed(context);
        }
        let children = self.contexts.take_errors(context);
        Verdict {
            error: Some(
                self.error(
                    ErrorKind::AnyOf,
                    "JSON does not match any schemas from 'anyOf'.",
                    Vec::new(),
                    schema,
                )
                .with_children(children),
            ),
            evaluated: Vec::new(),
        }
    }

    fn resolve_one_of(&mut self, branches: &[Branch], context: ContextId, schema: SchemaId) -> Verdict {
        let valid: Vec<String> = branches
            .iter()
            .enumerate()
            .filter(|(_, branch)| self.branch_valid(branch))
            .map(|(index, _)| index.to_string())
            .collect();
        let error = match valid.len() {
            1 => return self.passed(context),
            0 => {
                let children = self.contexts.take_errors(context);
                self.error(
                    ErrorKind::OneOf,
                    "JSON is valid against no schemas from 'oneOf'.",
                    Vec::new(),
                    schema,
                )
                .with_children(children)
            }
            _ => self.error(
                ErrorKind::OneOf,
                "JSON is valid against more than one schema from 'oneOf'. Valid schema indexes: {0}.",
                vec![valid.into()],
                schema,
            ),
        };
        Verdict {
            error: Some(error),
            evaluated: Vec::new(),
        }
    }

    fn resolve_not(&mut self, branches: &[Branch], schema: SchemaId) -> Verdict {
        let Some(branch) = branches.first() else {
            return Verdict {
                error: None,
                evaluated: Vec::new(),
            };
        };
        if !self.branch_valid(branch) {
            return Verdict {
                error: None,
                evaluated: Vec::new(),
            };
        }
        let mut error = self.error(
            ErrorKind::Not,
            "JSON is valid against schema from 'not'.",
            Vec::new(),
            schema,
        );
        if branch.scope.is_none() {
            error = error.with_children(vec![self.error(
                ErrorKind::CircularDependency,
                "Schema {0} is evaluated recursively against the same value.",
                vec![MessageArg::from(branch.schema.index())],
                branch.schema,
            )]);
        }
        Verdict {
            error: Some(error),
            evaluated: Vec::new(),
        }
    }

    fn resolve_single(
        &mut self,
        branches: &[Branch],
        context: ContextId,
        schema: SchemaId,
        kind: ErrorKind,
        template: &'static str,
    ) -> Verdict {
        if branches.iter().all(|branch| self.branch_valid(branch)) {
            return self.passed(context);
        }
        let children = self.contexts.take_errors(context);
        Verdict {
            error: Some(self.error(kind, template, Vec::new(), schema).with_children(children)),
            evaluated: Vec::new(),
        }
    }

    fn resolve_if(
        &mut self,
        branches: &[Branch],
        contexts: &[ContextId],
        then_branch: Option<usize>,
        else_branch: Option<usize>,
        schema: SchemaId,
    ) -> Verdict {
        let condition_holds = branches.first().is_some_and(|branch| self.branch_valid(branch));
        let (chosen, context, kind, template) = if condition_holds {
            (then_branch, 1, ErrorKind::Then, "JSON does not match schema from 'then'.")
        } else {
            (else_branch, 2, ErrorKind::Else, "JSON does not match schema from 'else'.")
        };
        let Some(context) = contexts.get(context).copied() else {
            return Verdict {
                error: None,
                evaluated: Vec::new(),
            };
        };

        let chosen_valid = chosen
            .and_then(|index| branches.get(index))
            .map_or(true, |branch| self.branch_valid(branch));
        if !chosen_valid {
            let children = self.contexts.take_errors(context);
            return Verdict {
                error: Some(self.error(kind, template, Vec::new(), schema).with_children(children)),
                evaluated: Vec::new(),
            };
        }

        let mut evaluated = Vec::new();
        if let (true, Some(condition)) = (condition_holds, contexts.first()) {
            evaluated.extend_from_slice(self.contexts.evaluated(*condition));
        }
        evaluated.extend_from_slice(self.contexts.evaluated(context));
        Verdict {
            error: None,
            evaluated,
        }
    }

    fn resolve_dependency(
        &mut self,
        owner: Option<ScopeId>,
        property: Option<String>,
        branches: &[Branch],
        context: ContextId,
        schema: SchemaId,
    ) -> Verdict {
        let ignore_case = self.settings.ignore_case();
        let literal = property.and_then(|property| {
            let scope = owner.and_then(|owner| self.scopes.get(owner))?;
            let ScopeState::Object(object) = &scope.state else {
                return None;
            };
            object
                .names
                .iter()
                .find(|name| names_match(&property, name, ignore_case))
                .cloned()
        });
        let Some(literal) = literal else {
            return Verdict {
                error: None,
                evaluated: Vec::new(),
            };
        };

        if branches.iter().all(|branch| self.branch_valid(branch)) {
            return self.passed(context);
        }
        let children = self.contexts.take_errors(context);
        Verdict {
            error: Some(
                self.error(
                    ErrorKind::Dependencies,
                    "Dependencies for property '{0}' failed.",
                    vec![literal.into()],
                    schema,
                )
                .with_children(children),
            ),
            evaluated: Vec::new(),
        }
    }

    fn passed(&self, context: ContextId) -> Verdict {
        Verdict {
            error: None,
            evaluated: self.contexts.evaluated(context).to_vec(),
        }
    }

    /// Record schemas that evaluated the owner's value successfully and mark
    /// the unevaluated records they account for
    fn child_validated(&mut self, owner: ScopeId, evaluated: &[SchemaId]) {
        let Some(scope) = self.scopes.get_mut(owner) else {
            return;
        };
        scope.header.evaluated.extend_from_slice(evaluated);
        let records = match &mut scope.state {
            ScopeState::Object(object) => &mut object.records,
            ScopeState::Array(array) => &mut array.records,
            _ => return,
        };
        for record in records.iter_mut().filter(|record| !record.evaluated) {
            if record.candidates.iter().any(|c| evaluated.contains(c)) {
                record.evaluated = true;
            }
        }
    }
}
