//! The lifecycle listener contract.
//!
//! Service objects implement [`Lifecycle`] to hook into the birth and death
//! of the scope that owns them. The contract is a pure extension point: the
//! scope tree prescribes *when* the callbacks run (and in which order during
//! teardown), never *what* they do.

use std::sync::Arc;

use crate::Scope;

/// Listener kinds, used to order teardown within one scope.
///
/// During `destroy()`, every [`ListenerKind::Task`] listener is stopped
/// before any [`ListenerKind::Plain`] listener starts tearing down. Task
/// listeners hold running background work; stopping all of it first prevents
/// background loops from reacting to resources that sibling listeners are
/// releasing at the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Holds a cancellable background-execution context; exits first.
    Task,
    /// An ordinary resource-holding listener; exits after all task listeners.
    Plain,
}

/// Lifecycle callbacks for objects owned by a scope.
///
/// Both methods have no-op defaults, so implementers that care about only one
/// of the two events override just that one. Implementations must not assume
/// main-thread or background-thread execution for either callback.
///
/// A listener registers with a scope either through
/// [`ScopeBuilder::register`](crate::ScopeBuilder::register) (notified while
/// the scope is built) or [`Scope::register`] (notified immediately).
/// Re-registering the same instance is a no-op: `on_enter` is observed at
/// most once per listener-per-scope pairing.
///
/// `on_exit` runs exactly once, synchronously, inside the owning scope's
/// [`Scope::destroy`]. A panicking callback is not caught by the scope tree;
/// it unwinds through the `register`/`destroy` call and aborts the remainder
/// of that pass.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Lifecycle, ScopeBuilder};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct ConnectionPool {
///     draining: AtomicBool,
/// }
///
/// impl Lifecycle for ConnectionPool {
///     fn on_exit(&self) {
///         // Only teardown matters for this service; on_enter keeps its
///         // no-op default.
///         self.draining.store(true, Ordering::Release);
///     }
/// }
///
/// let pool = Arc::new(ConnectionPool { draining: AtomicBool::new(false) });
/// let mut builder = ScopeBuilder::new("app");
/// builder.register(pool.clone());
/// let app = builder.build();
///
/// app.destroy();
/// assert!(pool.draining.load(Ordering::Acquire));
/// ```
pub trait Lifecycle: Send + Sync + 'static {
    /// Called when the scope this listener registered with becomes live, or
    /// immediately if the scope already is.
    fn on_enter(&self, scope: &Scope) {
        let _ = scope;
    }

    /// Called once during the owning scope's `destroy()`.
    fn on_exit(&self) {}

    /// The teardown-ordering group this listener belongs to.
    ///
    /// Plain unless the listener wraps background work (see
    /// [`TaskScope`](crate::TaskScope)).
    fn kind(&self) -> ListenerKind {
        ListenerKind::Plain
    }
}

/// Identity comparison for listener instances.
///
/// Listeners have no intrinsic identity beyond the allocation they live in,
/// so the dedup rule compares the `Arc` data pointers. The vtable half of the
/// fat pointer is deliberately ignored.
pub(crate) fn same_listener(a: &Arc<dyn Lifecycle>, b: &Arc<dyn Lifecycle>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Splits a listener snapshot into the two teardown groups.
///
/// Task-scope listeners come back first and must all exit before any plain
/// listener does. Relative order within each group is registration order,
/// though `destroy()` guarantees nothing about ordering inside a group.
pub(crate) fn partition_for_teardown(
    listeners: &[Arc<dyn Lifecycle>],
) -> (Vec<Arc<dyn Lifecycle>>, Vec<Arc<dyn Lifecycle>>) {
    let mut tasks = Vec::new();
    let mut plain = Vec::new();
    for listener in listeners {
        match listener.kind() {
            ListenerKind::Task => tasks.push(listener.clone()),
            ListenerKind::Plain => plain.push(listener.clone()),
        }
    }
    (tasks, plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    impl Lifecycle for Plain {}

    struct Background;
    impl Lifecycle for Background {
        fn kind(&self) -> ListenerKind {
            ListenerKind::Task
        }
    }

    #[test]
    fn default_kind_is_plain() {
        assert_eq!(Plain.kind(), ListenerKind::Plain);
    }

    #[test]
    fn partition_preserves_group_order() {
        let a: Arc<dyn Lifecycle> = Arc::new(Plain);
        let b: Arc<dyn Lifecycle> = Arc::new(Background);
        let c: Arc<dyn Lifecycle> = Arc::new(Plain);
        let d: Arc<dyn Lifecycle> = Arc::new(Background);

        let (tasks, plain) =
            partition_for_teardown(&[a.clone(), b.clone(), c.clone(), d.clone()]);

        assert_eq!(tasks.len(), 2);
        assert_eq!(plain.len(), 2);
        assert!(same_listener(&tasks[0], &b));
        assert!(same_listener(&tasks[1], &d));
        assert!(same_listener(&plain[0], &a));
        assert!(same_listener(&plain[1], &c));
    }

    #[test]
    fn partition_of_empty_set_is_empty() {
        let (tasks, plain) = partition_for_teardown(&[]);
        assert!(tasks.is_empty());
        assert!(plain.is_empty());
    }

    #[test]
    fn identity_ignores_equal_payloads() {
        let a: Arc<dyn Lifecycle> = Arc::new(Plain);
        let b: Arc<dyn Lifecycle> = Arc::new(Plain);
        assert!(same_listener(&a, &a.clone()));
        assert!(!same_listener(&a, &b));
    }
}
