//! Cancellable background-work contexts and their scope listener.
//!
//! Scopes themselves never spawn or await anything; background work belongs
//! to the services registered into a scope. What the scope tree provides is
//! the stop signal: a [`TaskScope`] listener exclusively owns one
//! [`CancellationToken`] and cancels it during teardown, before any ordinary
//! listener runs `on_exit`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
#[cfg(feature = "async")]
use std::time::Duration;

use crate::{Lifecycle, ListenerKind};

/// A token that signals cancellation to cooperative background work.
///
/// Tokens are cheaply clonable; all clones observe the same flag. A child
/// token ([`child_token`](CancellationToken::child_token)) also observes its
/// parent's cancellation, which mirrors the scope hierarchy: work started in
/// a session scope should stop when either the session or the whole
/// application winds down.
///
/// # Examples
///
/// ```
/// use ferrous_scope::CancellationToken;
///
/// let app_token = CancellationToken::new();
/// let session_token = app_token.child_token();
///
/// app_token.cancel();
/// assert!(session_token.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                parent: None,
            }),
        }
    }

    /// Creates a token that is cancelled when either it or this token is.
    ///
    /// Cancelling the child does not affect the parent.
    pub fn child_token(&self) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// True once this token or any ancestor token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match &self.inner.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// Completes when cancellation is requested.
    ///
    /// Designed for `tokio::select!` inside background loops:
    ///
    /// ```
    /// use ferrous_scope::CancellationToken;
    ///
    /// # async fn example(token: CancellationToken) {
    /// loop {
    ///     tokio::select! {
    ///         _ = token.cancelled() => break,
    ///         _ = do_work() => {}
    ///     }
    /// }
    /// # }
    /// # async fn do_work() {}
    /// ```
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Creates a token that cancels itself after `timeout`.
    ///
    /// Must be called from within a tokio runtime; the countdown runs on a
    /// spawned task.
    #[cfg(feature = "async")]
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        let armed = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            armed.cancel();
        });
        token
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle listener that exclusively owns one cancellable background-work
/// context.
///
/// `on_enter` is a no-op — the token is supplied at construction, not at
/// scope-entry time. `on_exit` cancels the held token exactly once. The type
/// reports [`ListenerKind::Task`], which is what places it in the first
/// teardown group: during [`Scope::destroy`](crate::Scope::destroy), every
/// `TaskScope` is stopped before any plain listener begins tearing down.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{ScopeBuilder, TaskScope};
/// use std::sync::Arc;
///
/// let tasks = Arc::new(TaskScope::new());
/// let worker_token = tasks.token();
/// // worker_token would be moved into the session's background loops here.
///
/// let mut builder = ScopeBuilder::new("session");
/// builder.register(tasks);
/// let session = builder.build();
///
/// assert!(!worker_token.is_cancelled());
/// session.destroy();
/// assert!(worker_token.is_cancelled());
/// ```
pub struct TaskScope {
    token: CancellationToken,
    stopped: AtomicBool,
}

impl TaskScope {
    /// Creates a listener owning a fresh token.
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Creates a listener owning `token`.
    ///
    /// Use this with a [`child_token`](CancellationToken::child_token) of an
    /// outer scope's token so the work also observes outer cancellation.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            stopped: AtomicBool::new(false),
        }
    }

    /// A clone of the held token, for handing to background loops.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once `on_exit` has cancelled the held token.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Default for TaskScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle for TaskScope {
    fn on_exit(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            self.token.cancel();
        }
    }

    fn kind(&self) -> ListenerKind {
        ListenerKind::Task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn child_observes_parent_cancellation() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let grandchild = child.child_token();

        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn child_cancellation_leaves_parent_alone() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn task_scope_cancels_on_exit_exactly_once() {
        let tasks = TaskScope::new();
        let token = tasks.token();

        assert!(!tasks.is_stopped());
        tasks.on_exit();
        assert!(tasks.is_stopped());
        assert!(token.is_cancelled());

        // A second exit is a no-op.
        tasks.on_exit();
        assert!(tasks.is_stopped());
    }

    #[test]
    fn task_scope_reports_task_kind() {
        assert_eq!(TaskScope::new().kind(), ListenerKind::Task);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let token = CancellationToken::new();
        let background = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            background.cancel();
        });

        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn timeout_token_cancels_itself() {
        let token = CancellationToken::with_timeout(Duration::from_millis(5));
        assert!(!token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(token.is_cancelled());
    }
}
