//! Error types for the scope tree.

use std::fmt;

/// Scope lifecycle errors
///
/// Represents the error conditions that can occur when operating on a scope:
/// using a scope after it has been destroyed, or looking up a service the
/// scope does not carry.
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{ScopeBuilder, ScopeError};
///
/// let scope = ScopeBuilder::new("app").build();
/// scope.destroy();
///
/// // Every operation except is_destroyed() fails on a destroyed scope
/// match scope.build_child("session") {
///     Err(ScopeError::Destroyed(name)) => assert_eq!(name, "app"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_scope::{ScopeBuilder, ScopeError};
///
/// let mut builder = ScopeBuilder::new("app");
/// builder.add_service("port", 8080u16);
/// let scope = builder.build();
///
/// // Lookup failures are distinct from use-after-destroy
/// assert!(matches!(
///     scope.get_service::<u16>("host"),
///     Err(ScopeError::ServiceNotFound(_))
/// ));
/// assert!(matches!(
///     scope.get_service::<String>("port"),
///     Err(ScopeError::ServiceTypeMismatch { .. })
/// ));
/// scope.destroy();
/// ```
#[derive(Debug, Clone)]
pub enum ScopeError {
    /// Operation attempted on a destroyed scope (includes the scope name).
    ///
    /// This is the use-after-destroy condition: it indicates a caller kept a
    /// handle past the end of the lifetime it belongs to. It is raised loudly
    /// rather than ignored, because continuing to use a destroyed scope is a
    /// programming defect, not a recoverable runtime state.
    Destroyed(String),
    /// No service registered under the key (includes the key).
    ///
    /// Lookup is scope-local; a key present on an ancestor still yields this
    /// error. Callers walk `parent()` links themselves for ancestor lookup.
    ServiceNotFound(String),
    /// A service exists under the key but holds a different type.
    ServiceTypeMismatch {
        /// The key that was looked up.
        key: String,
        /// The type the caller requested.
        requested: &'static str,
    },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::Destroyed(name) => {
                write!(f, "Scope '{}' is destroyed", name)
            }
            ScopeError::ServiceNotFound(key) => {
                write!(f, "Service not found: '{}'", key)
            }
            ScopeError::ServiceTypeMismatch { key, requested } => {
                write!(f, "Service '{}' is not a {}", key, requested)
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Result type for scope operations
///
/// A convenience alias for `Result<T, ScopeError>` used throughout
/// ferrous-scope, following the common Rust pattern of a crate-specific
/// Result type to reduce boilerplate in signatures.
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{Scope, ScopeResult};
///
/// fn open_session(app: &Scope) -> ScopeResult<Scope> {
///     app.build_child("session")
/// }
/// ```
pub type ScopeResult<T> = Result<T, ScopeError>;
