//! Scope tree nodes and the cascading teardown algorithm.
//!
//! A [`Scope`] is a bounded lifetime: it owns the services built for it, the
//! lifecycle listeners that reacted to its birth, and every child scope
//! created underneath it. Destroying a scope cascades through all of its
//! descendants and runs listener teardown in a fixed group order before the
//! scope itself reports destroyed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::builder::ScopeBuilder;
use crate::lifecycle::{partition_for_teardown, same_listener, Lifecycle};
use crate::observer::Observers;
use crate::services::ServiceMap;
use crate::{ScopeError, ScopeResult};

/// A node in the lifecycle tree.
///
/// `Scope` is a cheaply clonable handle; clones refer to the same node and
/// equality is node identity, not name. A root scope is produced by
/// [`ScopeBuilder::build`]; every other scope is produced by
/// [`build_child`](Scope::build_child) on a live parent and lives strictly
/// inside that parent's lifetime.
///
/// # Lifecycle
///
/// A scope is mutated only by [`register`](Scope::register) (adds a listener)
/// and [`build_child`](Scope::build_child) (adds a child) until
/// [`destroy`](Scope::destroy) is called, at which point it moves
/// irreversibly to destroyed. Once destroyed, every operation except
/// [`is_destroyed`](Scope::is_destroyed) and the pure diagnostics accessors
/// fails with [`ScopeError::Destroyed`].
///
/// # Thread discipline
///
/// All operations are synchronous and return only after their cascading
/// effects complete; the scope tree itself never spawns or awaits anything.
/// Internal locks keep the tree structurally consistent if handles are
/// shared across threads, but teardown determinism assumes the caller
/// funnels mutations of any one scope through a single writer at a time
/// (typically one designated thread per application).
///
/// # Examples
///
/// ```
/// use ferrous_scope::ScopeBuilder;
///
/// let mut builder = ScopeBuilder::new("app");
/// builder.add_service("greeting", String::from("hello"));
/// let app = builder.build();
///
/// let session = app.build_child("session").unwrap();
/// assert_eq!(session.path(), "app/session");
///
/// // Service lookup is scope-local: the session does not see app services.
/// assert!(session.get_service::<String>("greeting").is_err());
/// assert_eq!(*app.get_service::<String>("greeting").unwrap(), "hello");
///
/// session.destroy();
/// assert!(session.is_destroyed());
/// assert!(app.children().is_empty());
/// app.destroy();
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    name: String,
    parent: Option<Weak<ScopeInner>>,
    services: ServiceMap,
    listeners: Mutex<Vec<Arc<dyn Lifecycle>>>,
    children: Mutex<Vec<Scope>>,
    destroying: AtomicBool,
    destroyed: AtomicBool,
    observers: Observers,
}

impl Scope {
    /// Builds a live scope from accumulated builder state. `on_enter` fires
    /// for the initial listeners, in registration order, before this returns;
    /// attaching to the parent's child set is the caller's job.
    pub(crate) fn from_parts(
        name: String,
        parent: Option<&Scope>,
        services: ServiceMap,
        listeners: Vec<Arc<dyn Lifecycle>>,
        observers: Observers,
    ) -> Self {
        let scope = Scope {
            inner: Arc::new(ScopeInner {
                name,
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                services,
                listeners: Mutex::new(listeners),
                children: Mutex::new(Vec::new()),
                destroying: AtomicBool::new(false),
                destroyed: AtomicBool::new(false),
                observers,
            }),
        };

        let initial: Vec<Arc<dyn Lifecycle>> = scope.inner.listeners.lock().unwrap().clone();
        for listener in initial {
            listener.on_enter(&scope);
        }
        scope.inner.observers.scope_built(&scope);
        scope
    }

    /// The name this scope was built with. Not required to be unique.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The scope that created this one, or `None` for a root scope (or when
    /// the parent node has already been dropped).
    pub fn parent(&self) -> Option<Scope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    }

    /// Number of ancestors above this scope (0 for a root).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent();
        }
        depth
    }

    /// The slash-joined ancestor path, e.g. `"app/session/editor"`.
    ///
    /// Useful for logging and tracing; see [`LoggingObserver`](crate::LoggingObserver).
    pub fn path(&self) -> String {
        let mut names = vec![self.inner.name.clone()];
        let mut current = self.parent();
        while let Some(scope) = current {
            names.push(scope.inner.name.clone());
            current = scope.parent();
        }
        names.reverse();
        names.join("/")
    }

    /// Builds a child scope with no services or listeners of its own.
    ///
    /// Equivalent to [`build_child_with`](Scope::build_child_with) with an
    /// empty configure block.
    pub fn build_child(&self, name: impl Into<String>) -> ScopeResult<Scope> {
        self.build_child_with(name, |_| {})
    }

    /// Builds a child scope, running `configure` against a fresh
    /// [`ScopeBuilder`] first.
    ///
    /// The child's initial listeners observe `on_enter` before the child is
    /// added to this scope's child set. Fails with [`ScopeError::Destroyed`]
    /// if this scope is destroyed or its destruction has already begun.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_scope::ScopeBuilder;
    ///
    /// let app = ScopeBuilder::new("app").build();
    /// let session = app
    ///     .build_child_with("session", |b| {
    ///         b.add_service("user", String::from("alice"));
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(*session.get_service::<String>("user").unwrap(), "alice");
    /// # app.destroy();
    /// ```
    pub fn build_child_with<F>(&self, name: impl Into<String>, configure: F) -> ScopeResult<Scope>
    where
        F: FnOnce(&mut ScopeBuilder),
    {
        self.ensure_live()?;

        let mut builder = ScopeBuilder::new(name);
        configure(&mut builder);
        let child = builder.into_child_of(self);

        // Attach under the children lock, re-checking liveness: a destroy
        // that started in the meantime must never leave a live orphan behind.
        {
            let mut children = self.inner.children.lock().unwrap();
            if self.teardown_started() {
                drop(children);
                child.destroy();
                return Err(ScopeError::Destroyed(self.inner.name.clone()));
            }
            children.push(child.clone());
        }

        Ok(child)
    }

    /// Registers a lifecycle listener with this live scope.
    ///
    /// If the listener instance is already registered this is a no-op, which
    /// is what guarantees at-most-once `on_enter` per listener-per-scope
    /// pairing. Otherwise the listener is added and `on_enter` is invoked
    /// before this returns.
    ///
    /// # Errors
    ///
    /// [`ScopeError::Destroyed`] if the scope is destroyed. The listener is
    /// not entered in that case.
    pub fn register(&self, listener: Arc<dyn Lifecycle>) -> ScopeResult<()> {
        self.ensure_live()?;

        {
            let mut listeners = self.inner.listeners.lock().unwrap();
            if listeners.iter().any(|l| same_listener(l, &listener)) {
                return Ok(());
            }
            listeners.push(listener.clone());
        }

        // The callback runs outside the lock so it may call back into the
        // scope without deadlocking.
        listener.on_enter(self);
        self.inner.observers.listener_registered(self);
        Ok(())
    }

    /// Returns a snapshot of the current child set.
    ///
    /// The returned vector is a copy; structural changes after this call are
    /// not reflected in it.
    pub fn children(&self) -> Vec<Scope> {
        self.inner.children.lock().unwrap().clone()
    }

    /// Scope-local typed service lookup.
    ///
    /// Does not search ancestor scopes; walk [`parent`](Scope::parent) links
    /// for ancestor lookup.
    ///
    /// # Errors
    ///
    /// [`ScopeError::Destroyed`] on a destroyed scope,
    /// [`ScopeError::ServiceNotFound`] for an unknown key, and
    /// [`ScopeError::ServiceTypeMismatch`] when the key holds another type.
    pub fn get_service<T: Send + Sync + 'static>(&self, key: &str) -> ScopeResult<Arc<T>> {
        self.ensure_live()?;
        self.inner.services.get(key)
    }

    /// Like [`get_service`](Scope::get_service), but panics on failure.
    ///
    /// For composition-root code where a missing service is a programming
    /// defect rather than a condition to handle.
    ///
    /// # Panics
    ///
    /// Panics if the scope is destroyed, the key is unknown, or the stored
    /// type differs from `T`.
    pub fn get_required_service<T: Send + Sync + 'static>(&self, key: &str) -> Arc<T> {
        match self.get_service::<T>(key) {
            Ok(service) => service,
            Err(err) => panic!("required service lookup failed: {}", err),
        }
    }

    /// Whether this scope has been destroyed. Always safe to call.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Destroys this scope and, transitively, every scope below it.
    ///
    /// Idempotent and reentrancy-safe: a second call, including one made from
    /// inside a listener's `on_exit`, returns immediately. The teardown order
    /// is fixed:
    ///
    /// 1. every child scope is destroyed, repeatedly re-querying the child
    ///    set until no live child remains;
    /// 2. every task-scope listener exits (background work stops);
    /// 3. only then does every remaining listener exit;
    /// 4. the listener set is cleared and the scope detaches from its parent.
    ///
    /// Stopping all background work before releasing any other resource
    /// prevents still-running loops from reacting to state being torn down
    /// beside them.
    ///
    /// There is no timeout: an `on_exit` that blocks forever blocks teardown
    /// forever. A panicking listener unwinds out of this call and aborts the
    /// remainder of the pass.
    pub fn destroy(&self) {
        if self.inner.destroyed.load(Ordering::Acquire) {
            return;
        }
        if self.inner.destroying.swap(true, Ordering::AcqRel) {
            return;
        }

        let path = self.path();

        // Children shrink underneath this loop as each child detaches
        // itself, so drive from a fresh query every iteration instead of
        // iterating the live collection.
        loop {
            let next = {
                let children = self.inner.children.lock().unwrap();
                children.iter().find(|c| !c.teardown_started()).cloned()
            };
            match next {
                Some(child) => child.destroy(),
                None => break,
            }
        }

        let snapshot: Vec<Arc<dyn Lifecycle>> = self.inner.listeners.lock().unwrap().clone();
        let (tasks, plain) = partition_for_teardown(&snapshot);
        for listener in tasks {
            listener.on_exit();
        }
        for listener in plain {
            listener.on_exit();
        }

        self.inner.listeners.lock().unwrap().clear();

        if let Some(parent) = self.parent() {
            parent
                .inner
                .children
                .lock()
                .unwrap()
                .retain(|c| !Arc::ptr_eq(&c.inner, &self.inner));
        }

        self.inner.destroyed.store(true, Ordering::Release);
        self.inner.destroying.store(false, Ordering::Release);

        if !self.inner.observers.is_empty() {
            self.inner.observers.scope_destroyed(&path);
        }
    }

    /// Number of services fixed into this scope at construction.
    pub fn service_count(&self) -> usize {
        self.inner.services.len()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }

    pub(crate) fn observers(&self) -> &Observers {
        &self.inner.observers
    }

    fn ensure_live(&self) -> ScopeResult<()> {
        if self.is_destroyed() {
            Err(ScopeError::Destroyed(self.inner.name.clone()))
        } else {
            Ok(())
        }
    }

    /// True once destruction has begun, whether or not it has completed.
    fn teardown_started(&self) -> bool {
        self.inner.destroying.load(Ordering::Acquire) || self.is_destroyed()
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        // Dropping a live scope skips on_exit for everything registered in
        // it; surface that instead of losing teardown silently.
        let listeners = self.listeners.get_mut().unwrap();
        if !self.destroyed.load(Ordering::Acquire) && !listeners.is_empty() {
            eprintln!(
                "[ferrous-scope] scope '{}' dropped with {} listener(s) that never observed on_exit. Call destroy() first.",
                self.name,
                listeners.len()
            );
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.inner.name)
            .field("depth", &self.depth())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
