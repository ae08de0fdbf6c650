//! Accumulator for constructing scopes.

use std::sync::Arc;

use crate::lifecycle::{same_listener, Lifecycle};
use crate::observer::{Observers, ScopeObserver};
use crate::services::ServiceMap;
use crate::Scope;

/// Accumulates named services and lifecycle listeners for a scope that is
/// not live yet.
///
/// A builder is used in two places: directly, to construct a root scope, and
/// inside [`Scope::build_child_with`], where the parent hands a fresh builder
/// to the configure block. Either way, the scope produced by building fires
/// `on_enter` for every queued listener, in registration order, before it is
/// returned — so by the time any caller holds the scope, all of its initial
/// listeners have observed its birth.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Lifecycle, Scope, ScopeBuilder};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Telemetry {
///     sessions: AtomicUsize,
/// }
///
/// impl Lifecycle for Telemetry {
///     fn on_enter(&self, _scope: &Scope) {
///         self.sessions.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let telemetry = Arc::new(Telemetry::default());
///
/// let mut builder = ScopeBuilder::new("app");
/// builder
///     .add_service("api_base", String::from("https://api.example.com"))
///     .register(telemetry.clone());
/// let app = builder.build();
///
/// // on_enter already ran during build()
/// assert_eq!(telemetry.sessions.load(Ordering::SeqCst), 1);
/// assert_eq!(
///     *app.get_service::<String>("api_base").unwrap(),
///     "https://api.example.com"
/// );
/// # app.destroy();
/// ```
pub struct ScopeBuilder {
    name: String,
    services: ServiceMap,
    listeners: Vec<Arc<dyn Lifecycle>>,
    observers: Vec<Arc<dyn ScopeObserver>>,
}

impl ScopeBuilder {
    /// Creates an empty builder for a scope with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: ServiceMap::new(),
            listeners: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Associates a value with an opaque string key.
    ///
    /// Keys should be unique within one scope; duplicating a key is not an
    /// error, the last write wins. The registry is fixed once the scope is
    /// built — there is no post-construction mutation.
    pub fn add_service<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> &mut Self {
        self.add_service_arc(key, Arc::new(value))
    }

    /// Associates an already-shared instance with a key.
    ///
    /// Useful when the same object is registered under several scopes, or
    /// when the caller keeps a handle of its own.
    pub fn add_service_arc<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<String>,
        value: Arc<T>,
    ) -> &mut Self {
        self.services.insert(key.into(), value);
        self
    }

    /// Queues a listener to receive `on_enter` once the scope is built.
    ///
    /// Queuing the same instance twice collapses to a single registration,
    /// so `on_enter` still fires at most once for it.
    pub fn register(&mut self, listener: Arc<dyn Lifecycle>) -> &mut Self {
        if !self.listeners.iter().any(|l| same_listener(l, &listener)) {
            self.listeners.push(listener);
        }
        self
    }

    /// Attaches a diagnostics observer.
    ///
    /// Observers are inherited: every scope built below this one notifies
    /// them too. See [`ScopeObserver`].
    pub fn observe(&mut self, observer: Arc<dyn ScopeObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Builds a live root scope from the accumulated state.
    ///
    /// Fires `on_enter` for every queued listener, in registration order,
    /// before returning. Child scopes are built through
    /// [`Scope::build_child`] / [`Scope::build_child_with`] instead.
    pub fn build(self) -> Scope {
        let observers = Observers::new(self.observers);
        Scope::from_parts(self.name, None, self.services, self.listeners, observers)
    }

    /// Builds a live scope parented under `parent`, inheriting its observer
    /// set. The caller attaches the result to the parent's child set.
    pub(crate) fn into_child_of(self, parent: &Scope) -> Scope {
        let observers = parent.observers().extend_with(self.observers);
        Scope::from_parts(
            self.name,
            Some(parent),
            self.services,
            self.listeners,
            observers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Probe {
        enters: AtomicUsize,
    }

    impl Lifecycle for Probe {
        fn on_enter(&self, _scope: &Scope) {
            self.enters.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn duplicate_builder_registration_collapses() {
        let probe = Arc::new(Probe::default());

        let mut builder = ScopeBuilder::new("app");
        builder.register(probe.clone()).register(probe.clone());
        let app = builder.build();

        assert_eq!(probe.enters.load(Ordering::SeqCst), 1);
        assert_eq!(app.listener_count(), 1);
        app.destroy();
    }

    #[test]
    fn listeners_enter_in_registration_order() {
        struct Ordered {
            label: &'static str,
            order: Arc<Mutex<Vec<&'static str>>>,
        }

        impl Lifecycle for Ordered {
            fn on_enter(&self, _scope: &Scope) {
                self.order.lock().unwrap().push(self.label);
            }
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut builder = ScopeBuilder::new("app");
        builder
            .register(Arc::new(Ordered { label: "first", order: order.clone() }))
            .register(Arc::new(Ordered { label: "second", order: order.clone() }))
            .register(Arc::new(Ordered { label: "third", order: order.clone() }));
        let app = builder.build();

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        app.destroy();
    }

    #[test]
    fn listener_sees_a_live_scope_during_enter() {
        struct Inspector {
            seen_name: Mutex<Option<String>>,
        }

        impl Lifecycle for Inspector {
            fn on_enter(&self, scope: &Scope) {
                assert!(!scope.is_destroyed());
                *self.seen_name.lock().unwrap() = Some(scope.name().to_string());
            }
        }

        let inspector = Arc::new(Inspector { seen_name: Mutex::new(None) });
        let mut builder = ScopeBuilder::new("app");
        builder.register(inspector.clone());
        let app = builder.build();

        assert_eq!(inspector.seen_name.lock().unwrap().as_deref(), Some("app"));
        app.destroy();
    }
}
