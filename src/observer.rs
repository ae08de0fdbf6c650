//! Diagnostic observers for scope lifecycle traceability.
//!
//! This module provides hooks for observing structural lifecycle events,
//! enabling structured tracing and debugging of scope trees: which scopes
//! exist, when they were built, and when they were torn down.

use std::sync::Arc;

use crate::Scope;

/// Observer trait for scope lifecycle events.
///
/// Observers attach through [`ScopeBuilder::observe`](crate::ScopeBuilder::observe)
/// and are inherited by every child scope built underneath, so attaching one
/// to the root scope covers the whole tree.
///
/// All methods default to no-ops; implementers subscribe to the events they
/// care about.
///
/// # Performance
///
/// Observer calls run synchronously inside `build`/`register`/`destroy`.
/// Keep implementations lightweight; queue events elsewhere for expensive
/// processing.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Scope, ScopeBuilder, ScopeObserver};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Recorder {
///     events: Mutex<Vec<String>>,
/// }
///
/// impl ScopeObserver for Recorder {
///     fn scope_built(&self, scope: &Scope) {
///         self.events.lock().unwrap().push(format!("built {}", scope.path()));
///     }
///
///     fn scope_destroyed(&self, path: &str) {
///         self.events.lock().unwrap().push(format!("destroyed {}", path));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut builder = ScopeBuilder::new("app");
/// builder.observe(recorder.clone());
/// let app = builder.build();
///
/// let session = app.build_child("session").unwrap();
/// session.destroy();
/// app.destroy();
///
/// let events = recorder.events.lock().unwrap();
/// assert_eq!(
///     *events,
///     vec![
///         "built app",
///         "built app/session",
///         "destroyed app/session",
///         "destroyed app",
///     ]
/// );
/// ```
pub trait ScopeObserver: Send + Sync {
    /// Called after a scope becomes live (its initial listeners have entered).
    fn scope_built(&self, scope: &Scope) {
        let _ = scope;
    }

    /// Called after a listener registers with an already-live scope.
    fn listener_registered(&self, scope: &Scope) {
        let _ = scope;
    }

    /// Called after a scope finishes teardown. Receives the path the scope
    /// had in the tree, since the scope itself is no longer usable.
    fn scope_destroyed(&self, path: &str) {
        let _ = path;
    }
}

/// Container for registered observers.
///
/// Holds the observer set a scope inherits at construction and fans events
/// out to all of them. Designed to cost nothing when no observers are
/// registered.
#[derive(Clone)]
pub(crate) struct Observers {
    observers: Arc<[Arc<dyn ScopeObserver>]>,
}

impl Default for Observers {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Observers {
    pub(crate) fn new(observers: Vec<Arc<dyn ScopeObserver>>) -> Self {
        Self {
            observers: observers.into(),
        }
    }

    /// Extends an inherited observer set with additional observers, sharing
    /// the parent's allocation when nothing was added.
    pub(crate) fn extend_with(&self, extra: Vec<Arc<dyn ScopeObserver>>) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut merged: Vec<Arc<dyn ScopeObserver>> = self.observers.to_vec();
        merged.extend(extra);
        Self::new(merged)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn scope_built(&self, scope: &Scope) {
        for observer in self.observers.iter() {
            observer.scope_built(scope);
        }
    }

    #[inline]
    pub(crate) fn listener_registered(&self, scope: &Scope) {
        for observer in self.observers.iter() {
            observer.listener_registered(scope);
        }
    }

    #[inline]
    pub(crate) fn scope_destroyed(&self, path: &str) {
        for observer in self.observers.iter() {
            observer.scope_destroyed(path);
        }
    }
}

/// Built-in observer that logs lifecycle events to stdout.
///
/// A simple implementation useful for development and debugging. For
/// production use, implement a custom [`ScopeObserver`] that integrates with
/// your logging/tracing infrastructure.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{LoggingObserver, ScopeBuilder};
/// use std::sync::Arc;
///
/// let mut builder = ScopeBuilder::new("app");
/// builder.observe(Arc::new(LoggingObserver::new()));
///
/// // Scope builds, registrations, and destroys are logged from here on
/// let app = builder.build();
/// # app.destroy();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-scope]".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeObserver for LoggingObserver {
    fn scope_built(&self, scope: &Scope) {
        println!(
            "{} scope built: {} ({} services, {} listeners)",
            self.prefix,
            scope.path(),
            scope.service_count(),
            scope.listener_count(),
        );
    }

    fn listener_registered(&self, scope: &Scope) {
        println!(
            "{} listener registered on {} ({} total)",
            self.prefix,
            scope.path(),
            scope.listener_count(),
        );
    }

    fn scope_destroyed(&self, path: &str) {
        println!("{} scope destroyed: {}", self.prefix, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        built: AtomicUsize,
        registered: AtomicUsize,
        destroyed: AtomicUsize,
    }

    impl ScopeObserver for Counter {
        fn scope_built(&self, _scope: &Scope) {
            self.built.fetch_add(1, Ordering::SeqCst);
        }
        fn listener_registered(&self, _scope: &Scope) {
            self.registered.fetch_add(1, Ordering::SeqCst);
        }
        fn scope_destroyed(&self, _path: &str) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Noop;
    impl crate::Lifecycle for Noop {}

    #[test]
    fn children_inherit_root_observers() {
        let counter = Arc::new(Counter::default());

        let mut builder = ScopeBuilder::new("app");
        builder.observe(counter.clone());
        let app = builder.build();
        let session = app.build_child("session").unwrap();
        session.register(Arc::new(Noop)).unwrap();

        app.destroy();

        assert_eq!(counter.built.load(Ordering::SeqCst), 2);
        assert_eq!(counter.registered.load(Ordering::SeqCst), 1);
        assert_eq!(counter.destroyed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_observer_set_is_empty() {
        let observers = Observers::default();
        assert!(observers.is_empty());
        assert!(!Observers::new(vec![Arc::new(Counter::default())]).is_empty());
    }
}
