//! Session-bound cancellation scopes.
//!
//! Every background task a visible screen starts runs under a [`ScopeToken`]
//! derived from the session root. Ending the session cancels the root, which
//! transitively cancels every screen scope derived from it. So does reaching
//! the session's `expires_at`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info};

/// Authenticated user session (owned by the auth collaborator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Shared holder for the current credential.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn get(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    pub fn set(&self, session: Session) {
        *self.inner.write() = Some(session);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

/// Cancellable lifetime for work bound to one screen activation.
///
/// Cloning yields a handle to the same scope. Cancelling a scope cancels every
/// scope derived from it with [`ScopeToken::child`].
#[derive(Debug, Clone)]
pub struct ScopeToken {
    token: CancellationToken,
}

impl ScopeToken {
    fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A live scope with no parent, for work that outlives sessions.
    pub fn detached() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// A scope that is already cancelled.
    pub fn cancelled_scope() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope (or any ancestor) is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn child(&self) -> ScopeToken {
        Self::from_token(self.token.child_token())
    }
}

/// Produces screen scopes bounded by the session's validity.
#[derive(Debug, Clone)]
pub struct SessionScope {
    store: SessionStore,
    root: Arc<Mutex<CancellationToken>>,
}

impl SessionScope {
    /// Creates a scope source with no active session.
    pub fn new(store: SessionStore) -> Self {
        let root = CancellationToken::new();
        if store.get().is_none() {
            root.cancel();
        }
        Self {
            store,
            root: Arc::new(Mutex::new(root)),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Installs a new session and a fresh root for its scopes.
    ///
    /// The root cancels itself at `expires_at`, so scopes derived while the
    /// session was valid end with it even if no event ever arrives.
    pub fn begin(&self, session: Session) {
        info!(user = %session.username, expires_at = %session.expires_at, "session started");
        let mut root = self.root.lock();
        root.cancel();
        *root = CancellationToken::new();
        expire_at(&root, session.expires_at);
        self.store.set(session);
    }

    /// Invalidates the session, cancelling every derived scope.
    pub fn end(&self) {
        self.root.lock().cancel();
        if self.store.get().is_some() {
            info!("session ended");
        }
        self.store.clear();
    }

    /// True while a session exists and has not expired.
    pub fn is_valid(&self) -> bool {
        self.store.get().is_some_and(|s| !s.is_expired()) && !self.root.lock().is_cancelled()
    }

    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }

    /// Returns the access credential if the session is still valid.
    pub fn access_token(&self) -> Option<String> {
        self.store
            .get()
            .filter(|s| !s.is_expired())
            .map(|s| s.access_token)
    }

    /// Derives a scope for one screen activation.
    ///
    /// With no valid session the returned scope is already cancelled, so
    /// listeners started under it exit on their first check.
    pub fn derive_scope(&self) -> ScopeToken {
        if !self.is_valid() {
            debug!("deriving scope without a valid session; returning cancelled scope");
            return ScopeToken::cancelled_scope();
        }
        ScopeToken::from_token(self.root.lock().child_token())
    }
}

/// Cancels `root` once `expires_at` passes. Needs a tokio runtime; without
/// one, expiry is only seen by `is_valid` and `access_token`.
fn expire_at(root: &CancellationToken, expires_at: DateTime<Utc>) {
    let Ok(handle) = Handle::try_current() else {
        debug!("no runtime; session expiry will not cancel scopes");
        return;
    };
    let remaining = (expires_at - Utc::now()).to_std().unwrap_or_default();
    let root = root.clone();
    handle.spawn(async move {
        if root
            .run_until_cancelled(tokio::time::sleep(remaining))
            .await
            .is_some()
        {
            info!("session expired");
            root.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn session(expires_in: Duration) -> Session {
        Session {
            access_token: "token".into(),
            user_id: "u1".into(),
            username: "bro".into(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_derive_without_session_is_cancelled() {
        let scope = SessionScope::new(SessionStore::default());
        assert!(scope.derive_scope().is_cancelled());
    }

    #[test]
    fn test_derive_with_expired_session_is_cancelled() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::minutes(-1)));
        assert!(!scope.is_valid());
        assert!(scope.derive_scope().is_cancelled());
        assert!(scope.access_token().is_none());
    }

    #[test]
    fn test_end_cancels_all_derived_scopes() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::minutes(5)));
        let a = scope.derive_scope();
        let b = scope.derive_scope();
        let grandchild = a.child();
        assert!(!a.is_cancelled());

        scope.end();

        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert!(scope.session().is_none());
    }

    #[test]
    fn test_cancelling_screen_scope_leaves_siblings() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::minutes(5)));
        let a = scope.derive_scope();
        let b = scope.derive_scope();

        a.cancel();

        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(scope.is_valid());
    }

    #[test]
    fn test_begin_after_end_gives_live_scopes() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::minutes(5)));
        let old = scope.derive_scope();
        scope.end();
        scope.begin(session(Duration::minutes(5)));

        assert!(old.is_cancelled());
        assert!(!scope.derive_scope().is_cancelled());
        assert_eq!(scope.access_token().as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_on_parent_cancel() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::minutes(5)));
        let child = scope.derive_scope();
        let waiter = tokio::spawn(async move { child.cancelled().await });
        scope.end();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_expiry_cancels_scopes_derived_while_valid() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::milliseconds(50)));
        let child = scope.derive_scope();
        let grandchild = child.child();
        assert!(!child.is_cancelled());

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;

        assert!(!scope.is_valid());
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[tokio::test]
    async fn test_new_session_is_not_cancelled_by_previous_expiry() {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(session(Duration::milliseconds(50)));
        scope.begin(session(Duration::minutes(5)));
        let child = scope.derive_scope();

        tokio::time::sleep(std::time::Duration::from_millis(150)).await;

        assert!(scope.is_valid());
        assert!(!child.is_cancelled());
    }
}
