//! Evaluation contexts: where a scope's errors and successes go
//!
//! - The root context forwards errors to the validator's error sink.
//! - A conditional context buffers errors and evaluated schemas for the
//!   conditional scope that owns it.
//! - A composite context fans out to several contexts, for a scope shared by
//!   sibling conditionals.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::error::ValidationError;
use crate::schema::SchemaId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextId(u32);

enum Context {
    Root,
    Conditional {
        errors: Vec<ValidationError>,
        evaluated: Vec<SchemaId>,
    },
    Composite(Vec<ContextId>),
    Free,
}

/// Arena of contexts; slot 0 is always the root context
pub(crate) struct Contexts {
    slots: Vec<Context>,
    free: Vec<u32>,
}

impl Default for Contexts {
    fn default() -> Self {
        Self {
            slots: vec![Context::Root],
            free: Vec::new(),
        }
    }
}

impl Contexts {
    pub fn root(&self) -> ContextId {
        ContextId(0)
    }

    pub fn alloc_conditional(&mut self) -> ContextId {
        self.alloc(Context::Conditional {
            errors: Vec::new(),
            evaluated: Vec::new(),
        })
    }

    pub fn alloc_composite(&mut self, members: Vec<ContextId>) -> ContextId {
        self.alloc(Context::Composite(members))
    }

    fn alloc(&mut self, context: Context) -> ContextId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = context;
                ContextId(index)
            }
            None => {
                self.slots.push(context);
                ContextId(self.slots.len() as u32 - 1)
            }
        }
    }

    pub fn release(&mut self, id: ContextId) {
        if id.0 == 0 {
            return;
        }
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            if !matches!(slot, Context::Free) {
                *slot = Context::Free;
                self.free.push(id.0);
            }
        }
    }

    /// Add a member to a composite context
    pub fn add_member(&mut self, composite: ContextId, member: ContextId) {
        if let Some(Context::Composite(members)) = self.slots.get_mut(composite.0 as usize) {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }

    /// Deliver an error; returns it back when it reaches the root context
    pub fn deliver(&mut self, id: ContextId, error: ValidationError) -> Option<ValidationError> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Context::Root) => Some(error),
            Some(Context::Conditional { errors, .. }) => {
                errors.push(error);
                None
            }
            Some(Context::Composite(members)) => {
                let members = members.clone();
                let mut escaped = None;
                for member in members {
                    if let Some(error) = self.deliver(member, error.clone()) {
                        escaped.get_or_insert(error);
                    }
                }
                escaped
            }
            Some(Context::Free) | None => None,
        }
    }

    /// Record schemas that validated successfully
    pub fn push_evaluated(&mut self, id: ContextId, schemas: &[SchemaId]) {
        match self.slots.get_mut(id.0 as usize) {
            Some(Context::Conditional { evaluated, .. }) => evaluated.extend_from_slice(schemas),
            Some(Context::Composite(members)) => {
                let members = members.clone();
                for member in members {
                    self.push_evaluated(member, schemas);
                }
            }
            _ => {}
        }
    }

    pub fn take_errors(&mut self, id: ContextId) -> Vec<ValidationError> {
        match self.slots.get_mut(id.0 as usize) {
            Some(Context::Conditional { errors, .. }) => std::mem::take(errors),
            _ => Vec::new(),
        }
    }

    pub fn evaluated(&self, id: ContextId) -> &[SchemaId] {
        match self.slots.get(id.0 as usize) {
            Some(Context::Conditional { evaluated, .. }) => evaluated,
            _ => &[],
        }
    }

    #[cfg(test)]
    pub fn has_errors(&self, id: ContextId) -> bool {
        matches!(
            self.slots.get(id.0 as usize),
            Some(Context::Conditional { errors, .. }) if !errors.is_empty()
        )
    }

    /// Drop every context except the root
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.free.clear();
    }
}
