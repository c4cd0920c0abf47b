//! Authenticated-session state store.
//!
//! Owns the `Session` state machine and publishes every transition on a
//! watch channel, so dependent stores observe an explicit subscription
//! instead of an implicit side effect. The cart store reacts to these
//! transitions (see [`crate::shop`]).

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, instrument, warn};

use paperback_core::User;

use crate::api::{ApiClient, ApiError};

/// Authentication state.
///
/// `Unchecked → Checking → {Authenticated, Anonymous}` on startup; explicit
/// login/register/logout and observed 401s drive the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// Nobody has asked the server yet.
    #[default]
    Unchecked,
    /// A `current_user` request is in flight.
    Checking,
    /// The server confirmed this user.
    Authenticated(User),
    /// No session, or the session was invalidated.
    Anonymous,
}

impl Session {
    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Store owning the authentication state.
///
/// Clones share state. Local state is authoritative for UI purposes: an
/// explicit logout transitions to `Anonymous` even when the remote call
/// fails.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: ApiClient,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Create a session store and start listening for process-wide 401s.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(Session::default());
        let unauthorized = api.subscribe_unauthorized();
        let store = Self {
            inner: Arc::new(SessionStoreInner { api, state }),
        };
        store.spawn_unauthorized_listener(unauthorized);
        store
    }

    /// Any 401 observed anywhere in the process invalidates the session.
    fn spawn_unauthorized_listener(&self, mut unauthorized: broadcast::Receiver<()>) {
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                match unauthorized.recv().await {
                    // Lagged still means at least one 401 happened.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let Some(inner) = inner.upgrade() else { break };
                        if *inner.state.borrow() != Session::Anonymous {
                            debug!("401 observed, invalidating session");
                            inner.state.send_replace(Session::Anonymous);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Current session snapshot.
    #[must_use]
    pub fn current(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Resolve the session by asking the server who we are.
    ///
    /// Any failure resolves to `Anonymous`; startup never errors out.
    #[instrument(skip(self))]
    pub async fn check(&self) -> Session {
        self.inner.state.send_replace(Session::Checking);
        let next = match self.inner.api.current_user().await {
            Ok(user) => Session::Authenticated(user),
            Err(err) => {
                debug!(error = %err, "session check resolved to anonymous");
                Session::Anonymous
            }
        };
        self.inner.state.send_replace(next.clone());
        next
    }

    /// Log in.
    ///
    /// # Errors
    ///
    /// On failure the session state is left untouched and the error carries
    /// a reason the caller can render inline.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let user = self.inner.api.login(username, password).await?;
        self.inner
            .state
            .send_replace(Session::Authenticated(user.clone()));
        Ok(user)
    }

    /// Register a new account; success signs the user in.
    ///
    /// # Errors
    ///
    /// On failure the session state is left untouched and the error carries
    /// the server's reason.
    #[instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.inner.api.register(username, email, password).await?;
        self.inner
            .state
            .send_replace(Session::Authenticated(user.clone()));
        Ok(user)
    }

    /// Log out.
    ///
    /// The remote call is best-effort: the local transition to `Anonymous`
    /// happens even if it fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(err) = self.inner.api.logout().await {
            warn!(error = %err, "remote logout failed, clearing local session anyway");
        }
        self.inner.state.send_replace(Session::Anonymous);
    }
}
