//! # ferrous-scope
//!
//! Hierarchical lifecycle scopes for Rust applications: nested service
//! lifetimes with ordered, cascading teardown.
//!
//! A [`Scope`] is a bounded lifetime — app-level, user-session-level,
//! feature-level — that owns the singletons built for it, the lifecycle
//! listeners watching it, and every child scope created underneath it.
//! Destroying a scope cascades through all of its descendants and runs
//! listener teardown in a fixed order, so background work always stops
//! before the resources it depends on are released.
//!
//! ## Features
//!
//! - **Strict scope trees**: children are created only from a live parent
//!   and never outlive it
//! - **Idempotent, reentrancy-safe destruction**: double destroys and cyclic
//!   destroys collapse to one teardown pass
//! - **Deterministic teardown ordering**: all [`TaskScope`] listeners stop
//!   their background work before any plain listener releases a resource
//! - **At-most-once notification**: a listener observes `on_enter` once per
//!   scope no matter how often it is registered
//! - **Immutable service registries**: scope-local key→value lookup, fixed
//!   at construction, readable without locks
//! - **Fail-fast use-after-destroy**: a destroyed scope rejects every
//!   operation except [`Scope::is_destroyed`] with a distinct error
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_scope::{Lifecycle, Scope, ScopeBuilder, TaskScope};
//! use std::sync::Arc;
//!
//! // App-level configuration, fixed for the process lifetime.
//! struct AppConfig {
//!     api_base: String,
//! }
//!
//! // A session service that reacts to its scope's birth and death.
//! struct SessionLog;
//!
//! impl Lifecycle for SessionLog {
//!     fn on_enter(&self, scope: &Scope) {
//!         println!("session opened: {}", scope.path());
//!     }
//!     fn on_exit(&self) {
//!         println!("session closed");
//!     }
//! }
//!
//! // Build the root scope at startup.
//! let mut builder = ScopeBuilder::new("app");
//! builder.add_service("config", AppConfig {
//!     api_base: "https://api.example.com".to_string(),
//! });
//! let app = builder.build();
//!
//! // A user session begins: build a child scope for it.
//! let tasks = Arc::new(TaskScope::new());
//! let worker_token = tasks.token(); // hand this to the session's background loops
//! let session = app
//!     .build_child_with("session", |b| {
//!         b.register(Arc::new(SessionLog));
//!         b.register(tasks);
//!     })
//!     .unwrap();
//!
//! // Services are scope-local; walk parents for app-level lookups.
//! let config = app.get_service::<AppConfig>("config").unwrap();
//! assert_eq!(config.api_base, "https://api.example.com");
//!
//! // The session ends: background work is cancelled before SessionLog exits.
//! session.destroy();
//! assert!(worker_token.is_cancelled());
//! assert!(session.is_destroyed());
//! assert!(!app.is_destroyed());
//! # app.destroy();
//! ```
//!
//! ## Teardown ordering
//!
//! [`Scope::destroy`] guarantees, in order: every descendant scope is
//! destroyed first; then every task-scope listener exits; only then does any
//! plain listener exit. Resource-holding listeners commonly run background
//! loops that, left running, would react to state being torn down next to
//! them (for example by re-creating a resource a sibling just released).
//! Stopping all background work first removes that race class entirely.
//!
//! ## Threading
//!
//! Every operation is synchronous; the scope tree spawns nothing and awaits
//! nothing. Handles are `Send + Sync` and internal locks keep the tree
//! consistent, but deterministic teardown assumes the caller mutates any one
//! scope from a single writer at a time — typically one designated thread.
//!
//! ## Cargo features
//!
//! - `async` — enables [`CancellationToken::cancelled`] and
//!   [`CancellationToken::with_timeout`] for tokio-hosted background work.

// Module declarations
pub mod builder;
pub mod error;
pub mod lifecycle;
pub mod observer;
pub mod provider;
pub mod scope;
pub mod task;

// Internal modules
mod services;

// Re-export core types
pub use builder::ScopeBuilder;
pub use error::{ScopeError, ScopeResult};
pub use lifecycle::{Lifecycle, ListenerKind};
pub use observer::{LoggingObserver, ScopeObserver};
pub use provider::RootScopeProvider;
pub use scope::Scope;
pub use task::{CancellationToken, TaskScope};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Probe {
        enters: AtomicUsize,
        exits: AtomicUsize,
    }

    impl Lifecycle for Probe {
        fn on_enter(&self, _scope: &Scope) {
            self.enters.fetch_add(1, Ordering::SeqCst);
        }
        fn on_exit(&self) {
            self.exits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn root_scope_round_trip() {
        let probe = Arc::new(Probe::default());

        let mut builder = ScopeBuilder::new("app");
        builder.register(probe.clone());
        let app = builder.build();

        assert_eq!(probe.enters.load(Ordering::SeqCst), 1);
        assert!(!app.is_destroyed());

        app.destroy();
        assert_eq!(probe.exits.load(Ordering::SeqCst), 1);
        assert!(app.is_destroyed());
    }

    #[test]
    fn child_scope_services_are_isolated() {
        let app = ScopeBuilder::new("app").build();
        let session = app
            .build_child_with("session", |b| {
                b.add_service("user", String::from("alice"));
            })
            .unwrap();

        assert_eq!(*session.get_service::<String>("user").unwrap(), "alice");
        assert!(app.get_service::<String>("user").is_err());

        app.destroy();
        assert!(session.is_destroyed());
    }
}
