//! Known-schemas cache: schema node identity to resolved URI
//!
//! The cache is filled by a one-time discovery traversal the first time a
//! validation error needs labelling. Validators sharing a root may race into
//! the lock; the second one finds the cache ready and leaves it untouched.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use super::{SchemaId, SchemaRoot};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lazily discovered `(schema, uri)` pairs for one [`SchemaRoot`]
#[derive(Debug, Default)]
pub struct KnownSchemas {
    ready: AtomicBool,
    entries: Mutex<Vec<(SchemaId, String)>>,
}

impl KnownSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether discovery has already run
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run discovery once; later calls return without taking the lock
    pub fn ensure(&self, root: &SchemaRoot) {
        if self.is_ready() {
            return;
        }

        let mut entries = self.entries.lock();
        if self.is_ready() {
            return;
        }

        *entries = discover(root);
        tracing::debug!(count = entries.len(), "discovered known schemas");
        self.ready.store(true, Ordering::Release);
    }

    /// Resolved URI of a discovered schema
    pub fn uri(&self, id: SchemaId) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, uri)| uri.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Depth-first walk from the root collecting every reachable node once
fn discover(root: &SchemaRoot) -> Vec<(SchemaId, String)> {
    let mut seen = HashSet::new();
    let mut stack = vec![root.root_id()];
    let mut entries = Vec::new();

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let schema = &root[id];
        entries.push((id, schema.location().to_string()));
        stack.extend(schema.subschemas().into_iter().rev());
    }

    entries
}
