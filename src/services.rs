//! Scope-private service registry.
//!
//! A scope's services are fixed when the scope is built and never mutated
//! afterwards, which is what makes lock-free concurrent reads sound.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{ScopeError, ScopeResult};

/// Type-erased shared service value.
pub(crate) type AnyService = Arc<dyn Any + Send + Sync>;

/// Immutable key→value registry backing [`Scope::get_service`](crate::Scope::get_service).
///
/// Keys are opaque strings; values are arbitrary `Send + Sync` objects stored
/// type-erased and recovered by downcast on lookup.
#[derive(Default)]
pub(crate) struct ServiceMap {
    entries: HashMap<String, AnyService>,
}

impl ServiceMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Associates `value` with `key`. Last write wins on duplicate keys.
    pub(crate) fn insert(&mut self, key: String, value: AnyService) {
        self.entries.insert(key, value);
    }

    /// Typed lookup. Scope-local by construction; the map never consults any
    /// other scope.
    pub(crate) fn get<T: Send + Sync + 'static>(&self, key: &str) -> ScopeResult<Arc<T>> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| ScopeError::ServiceNotFound(key.to_string()))?;
        entry
            .clone()
            .downcast::<T>()
            .map_err(|_| ScopeError::ServiceTypeMismatch {
                key: key.to_string(),
                requested: std::any::type_name::<T>(),
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
