//! Scopes: the per-value, per-schema evaluation units
//!
//! Scopes live in a generational arena owned by the validator. A retired
//! scope goes back to the free pool of its kind and keeps its allocations,
//! so validating many similar values reuses the same buffers. A stale
//! [`ScopeId`] whose slot has been rebound never resolves.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::context::ContextId;
use crate::schema::SchemaId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Object,
    Array,
    Primitive,
    /// Placeholder for a value a `false` schema rejects
    AlwaysInvalid,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    Ref,
    IfThenElse,
    DependentSchema,
}

impl ScopeKind {
    const COUNT: usize = 11;

    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            Self::AllOf
                | Self::AnyOf
                | Self::OneOf
                | Self::Not
                | Self::Ref
                | Self::IfThenElse
                | Self::DependentSchema
        )
    }

    fn pool(self) -> usize {
        self as usize
    }
}

/// How a scope relates to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// The document's top-level value
    Root,
    /// A property value or array item; failures invalidate the parent
    Property,
    /// A branch of a conditional
    Branch,
    /// A conditional itself
    Keyword,
    /// An unevaluated record, `contains` probe or property-name probe
    Detached,
}

/// State common to every scope kind
pub(crate) struct ScopeHeader {
    pub kind: ScopeKind,
    pub role: Role,
    pub initial_depth: usize,
    pub context: ContextId,
    pub owns_context: bool,
    pub parent: Option<ScopeId>,
    pub schema: SchemaId,
    pub started: bool,
    pub complete: bool,
    pub finalized: bool,
    pub is_valid: bool,
    pub holds: u32,
    /// Finalized but still held; off the active list until released
    pub parked: bool,
    pub open_conditionals: u32,
    pub open_children: u32,
    /// Schemas that evaluated this value successfully through in-place applicators
    pub evaluated: Vec<SchemaId>,
    /// Indexes of custom validators that apply to this scope's schema
    pub validators: Vec<usize>,
}

/// Key of an unevaluated record
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordKey {
    Property(String),
    Item(usize),
}

/// A property or item not claimed by the owning schema's own keywords
pub(crate) struct Record {
    pub key: RecordKey,
    pub scope: ScopeId,
    pub evaluated: bool,
    /// In-place applicators that would evaluate this entry if they validate
    pub candidates: Vec<SchemaId>,
}

#[derive(Default)]
pub(crate) struct ObjectState {
    pub property_count: u64,
    /// Property names in document order, with their literal casing
    pub names: Vec<String>,
    pub current: Option<String>,
    pub name_probes: Vec<(String, ScopeId)>,
    pub tracks_unevaluated: bool,
    pub records: Vec<Record>,
}

#[derive(Default)]
pub(crate) struct ArrayState {
    pub count: usize,
    /// Completed items, kept for `uniqueItems`
    pub items: Vec<serde_json::Value>,
    pub contains: Vec<(usize, ScopeId)>,
    pub tracks_unevaluated: bool,
    pub records: Vec<Record>,
}

pub(crate) struct Branch {
    pub schema: SchemaId,
    /// `None` when the branch would re-enter an enclosing evaluation
    pub scope: Option<ScopeId>,
    pub context: ContextId,
}

#[derive(Default)]
pub(crate) struct ConditionalState {
    pub branches: Vec<Branch>,
    pub contexts: Vec<ContextId>,
    /// Positions of the `then` and `else` branches
    pub then_branch: Option<usize>,
    pub else_branch: Option<usize>,
    /// Trigger property of a schema dependency
    pub property: Option<String>,
}

pub(crate) enum ScopeState {
    Object(ObjectState),
    Array(ArrayState),
    Primitive,
    Conditional(ConditionalState),
}

impl ScopeState {
    fn for_kind(kind: ScopeKind) -> Self {
        match kind {
            ScopeKind::Object => Self::Object(ObjectState::default()),
            ScopeKind::Array => Self::Array(ArrayState::default()),
            ScopeKind::Primitive | ScopeKind::AlwaysInvalid => Self::Primitive,
            _ => Self::Conditional(ConditionalState::default()),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Object(object) => {
                object.property_count = 0;
                object.names.clear();
                object.current = None;
                object.name_probes.clear();
                object.tracks_unevaluated = false;
                object.records.clear();
            }
            Self::Array(array) => {
                array.count = 0;
                array.items.clear();
                array.contains.clear();
                array.tracks_unevaluated = false;
                array.records.clear();
            }
            Self::Primitive => {}
            Self::Conditional(conditional) => {
                conditional.branches.clear();
                conditional.contexts.clear();
                conditional.then_branch = None;
                conditional.else_branch = None;
                conditional.property = None;
            }
        }
    }
}

pub(crate) struct Scope {
    pub header: ScopeHeader,
    pub state: ScopeState,
}

/// Binding for a newly allocated scope
pub(crate) struct ScopeInit {
    pub kind: ScopeKind,
    pub role: Role,
    pub depth: usize,
    pub context: ContextId,
    pub parent: Option<ScopeId>,
    pub schema: SchemaId,
}

impl Scope {
    fn new(init: ScopeInit) -> Self {
        Self {
            header: ScopeHeader {
                kind: init.kind,
                role: init.role,
                initial_depth: init.depth,
                context: init.context,
                owns_context: false,
                parent: init.parent,
                schema: init.schema,
                started: false,
                complete: false,
                finalized: false,
                is_valid: init.kind != ScopeKind::AlwaysInvalid,
                holds: 0,
                parked: false,
                open_conditionals: 0,
                open_children: 0,
                evaluated: Vec::new(),
                validators: Vec::new(),
            },
            state: ScopeState::for_kind(init.kind),
        }
    }

    /// Rebind a pooled scope, keeping its allocations
    fn rebind(&mut self, init: ScopeInit) {
        let header = &mut self.header;
        header.kind = init.kind;
        header.role = init.role;
        header.initial_depth = init.depth;
        header.context = init.context;
        header.owns_context = false;
        header.parent = init.parent;
        header.schema = init.schema;
        header.started = false;
        header.complete = false;
        header.finalized = false;
        header.is_valid = init.kind != ScopeKind::AlwaysInvalid;
        header.holds = 0;
        header.parked = false;
        header.open_conditionals = 0;
        header.open_children = 0;
        header.evaluated.clear();
        header.validators.clear();
        self.state.reset();
    }
}

struct Slot {
    generation: u32,
    live: bool,
    scope: Option<Scope>,
}

/// Generational arena of scopes with a free pool per kind
#[derive(Default)]
pub(crate) struct ScopeArena {
    slots: Vec<Slot>,
    pools: [Vec<u32>; ScopeKind::COUNT],
}

impl ScopeArena {
    pub fn alloc(&mut self, init: ScopeInit) -> ScopeId {
        if let Some(index) = self.pools[init.kind.pool()].pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            match &mut slot.scope {
                Some(scope) => scope.rebind(init),
                None => slot.scope = Some(Scope::new(init)),
            }
            return ScopeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            live: true,
            scope: Some(Scope::new(init)),
        });
        ScopeId {
            index: self.slots.len() as u32 - 1,
            generation: 0,
        }
    }

    fn slot(&self, id: ScopeId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ScopeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.slot(id).and_then(|slot| slot.scope.as_ref())
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.slot_mut(id).and_then(|slot| slot.scope.as_mut())
    }

    pub fn header(&self, id: ScopeId) -> Option<&ScopeHeader> {
        self.get(id).map(|scope| &scope.header)
    }

    pub fn header_mut(&mut self, id: ScopeId) -> Option<&mut ScopeHeader> {
        self.get_mut(id).map(|scope| &mut scope.header)
    }

    /// Move a scope out of its slot while it is being evaluated
    pub fn take(&mut self, id: ScopeId) -> Option<Scope> {
        self.slot_mut(id).and_then(|slot| slot.scope.take())
    }

    pub fn restore(&mut self, id: ScopeId, scope: Scope) {
        if let Some(slot) = self.slot_mut(id) {
            slot.scope = Some(scope);
        }
    }

    /// Return a scope to its pool; outstanding ids to it go stale
    pub fn retire(&mut self, id: ScopeId) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        let Some(kind) = slot.scope.as_ref().map(|scope| scope.header.kind) else {
            return;
        };
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.pools[kind.pool()].push(id.index);
    }

    /// Number of slots ever allocated
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.live {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                if let Some(scope) = &slot.scope {
                    self.pools[scope.header.kind.pool()].push(index as u32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::context::Contexts;

    fn init(kind: ScopeKind) -> ScopeInit {
        ScopeInit {
            kind,
            role: Role::Root,
            depth: 0,
            context: Contexts::default().root(),
            parent: None,
            schema: SchemaId(0),
        }
    }

    #[test]
    fn test_retired_ids_go_stale() {
        let mut arena = ScopeArena::default();
        let first = arena.alloc(init(ScopeKind::Object));
        arena.retire(first);
        assert!(arena.get(first).is_none());

        let second = arena.alloc(init(ScopeKind::Object));
        assert_ne!(first, second);
        assert!(arena.get(second).is_some());
        assert_eq!(arena.capacity(), 1);
    }

    #[test]
    fn test_pools_are_per_kind() {
        let mut arena = ScopeArena::default();
        let object = arena.alloc(init(ScopeKind::Object));
        arena.retire(object);

        let array = arena.alloc(init(ScopeKind::Array));
        assert_eq!(arena.capacity(), 2);
        assert!(matches!(
            arena.get(array).map(|scope| &scope.state),
            Some(ScopeState::Array(_))
        ));
    }

    #[test]
    fn test_rebind_resets_state() {
        let mut arena = ScopeArena::default();
        let id = arena.alloc(init(ScopeKind::Object));
        if let Some(scope) = arena.get_mut(id) {
            scope.header.is_valid = false;
            scope.header.complete = true;
            if let ScopeState::Object(object) = &mut scope.state {
                object.names.push("a".to_string());
            }
        }
        arena.retire(id);

        let id = arena.alloc(init(ScopeKind::Object));
        let scope = arena.get(id).expect("scope");
        assert!(scope.header.is_valid);
        assert!(!scope.header.complete);
        assert!(matches!(&scope.state, ScopeState::Object(object) if object.names.is_empty()));
    }

    #[test]
    fn test_taken_scope_is_hidden() {
        let mut arena = ScopeArena::default();
        let id = arena.alloc(init(ScopeKind::Primitive));
        let scope = arena.take(id).expect("scope");
        assert!(arena.get(id).is_none());
        arena.restore(id, scope);
        assert!(arena.get(id).is_some());
    }
}
