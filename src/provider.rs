//! Root scope ownership for hosting applications.

use crate::Scope;

/// Owner of the single root scope for a running application.
///
/// The hosting application builds the root scope at startup, wraps it in a
/// provider, and passes the provider (or `root()` references) down to the
/// components that need to build children or look up app-level services.
/// This keeps root access an owned value handed around by constructor
/// injection rather than a true global, so tests construct a fresh root per
/// test.
///
/// Exactly one root scope should exist per process; all other scopes are
/// reached by walking from a concrete scope reference — there is no global
/// scope registry.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{RootScopeProvider, ScopeBuilder};
///
/// let mut builder = ScopeBuilder::new("app");
/// builder.add_service("version", String::from("1.4.2"));
/// let provider = RootScopeProvider::new(builder.build());
///
/// let version = provider.root().get_service::<String>("version").unwrap();
/// assert_eq!(*version, "1.4.2");
///
/// provider.shutdown();
/// assert!(provider.root().is_destroyed());
/// ```
pub struct RootScopeProvider {
    root: Scope,
}

impl RootScopeProvider {
    /// Wraps the root scope of the application.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent. A provider wrapping a non-root scope is
    /// a wiring mistake caught at startup rather than carried through the
    /// process lifetime.
    pub fn new(root: Scope) -> Self {
        if root.parent().is_some() {
            panic!(
                "RootScopeProvider requires a root scope, got child scope '{}'",
                root.path()
            );
        }
        Self { root }
    }

    /// The root scope.
    pub fn root(&self) -> &Scope {
        &self.root
    }

    /// Destroys the root scope and, transitively, the entire scope tree.
    ///
    /// Idempotent, like [`Scope::destroy`].
    pub fn shutdown(&self) {
        self.root.destroy();
    }
}

impl Drop for RootScopeProvider {
    fn drop(&mut self) {
        if !self.root.is_destroyed() {
            eprintln!(
                "[ferrous-scope] RootScopeProvider dropped while root scope '{}' is live. \
                 Call shutdown() before exit so listeners observe on_exit.",
                self.root.name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeBuilder;

    #[test]
    fn shutdown_is_idempotent() {
        let provider = RootScopeProvider::new(ScopeBuilder::new("app").build());
        provider.shutdown();
        provider.shutdown();
        assert!(provider.root().is_destroyed());
    }

    #[test]
    #[should_panic(expected = "requires a root scope")]
    fn rejects_child_scopes() {
        let app = ScopeBuilder::new("app").build();
        let session = app.build_child("session").unwrap();
        let _provider = RootScopeProvider::new(session);
    }
}
