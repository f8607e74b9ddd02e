use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::UserProfile;

use super::guard::Route;
use super::store::{StoreError, TokenStore};

/// Message shown when the backend gives no reason for a failed login
const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session as seen by the front end
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
}

impl SessionState {
    fn with_status(status: SessionStatus) -> Self {
        Self { status, user: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// True until the startup token check has resolved, and during login
    pub fn is_loading(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Uninitialized | SessionStatus::Loading
        )
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::with_status(SessionStatus::Uninitialized)
    }
}

// ============================================================================
// Session context
// ============================================================================

/// Shared session state: the token store, the current session and the
/// latest navigation request.
///
/// One context exists per running client. It is created at startup and
/// handed to the API client, session manager and route guard.
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    navigation: watch::Sender<Option<Route>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        let (navigation, _) = watch::channel(None);
        Arc::new(Self {
            store,
            state,
            navigation,
        })
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Receive navigation requests (`/admin` after login, `/` after logout)
    pub fn navigation(&self) -> watch::Receiver<Option<Route>> {
        self.navigation.subscribe()
    }

    fn navigate(&self, route: Route) {
        debug!(route = %route, "Navigation requested");
        self.navigation.send_replace(Some(route));
    }

    /// Move Uninitialized -> Loading. Returns false if already started.
    fn begin_initialize(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.status == SessionStatus::Uninitialized {
                state.status = SessionStatus::Loading;
                true
            } else {
                false
            }
        })
    }

    fn set_loading(&self) {
        self.state.send_modify(|state| state.status = SessionStatus::Loading);
    }

    fn set_authenticated(&self, user: UserProfile) {
        self.state.send_replace(SessionState {
            status: SessionStatus::Authenticated,
            user: Some(user),
        });
    }

    /// Drop the user but keep whatever tokens are stored
    fn set_unauthenticated(&self) {
        self.state
            .send_replace(SessionState::with_status(SessionStatus::Unauthenticated));
    }

    /// Clear stored tokens and the user, then send the front end to login.
    /// Safe to call in any state.
    pub fn teardown(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        self.set_unauthenticated();
        self.navigate(Route::Login);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Login failures, phrased for display next to the login form
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Please fill in all fields")]
    MissingCredentials,

    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Unable to reach the server. Please try again.")]
    Unreachable(#[source] ApiError),

    #[error("Failed to save session: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    fn from_api(error: ApiError) -> Self {
        match error {
            ApiError::NetworkError(_) => SessionError::Unreachable(error),
            error => SessionError::Rejected {
                message: error
                    .detail()
                    .unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string()),
                source: error,
            },
        }
    }
}

// ============================================================================
// Session manager
// ============================================================================

/// Owns the login lifecycle: startup token check, login, logout and refresh.
#[derive(Clone)]
pub struct SessionManager {
    api: ApiClient,
    context: Arc<SessionContext>,
}

impl SessionManager {
    pub fn new(api: ApiClient) -> Self {
        let context = Arc::clone(api.session());
        Self { api, context }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.context.snapshot()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.context.snapshot().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.snapshot().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.context.snapshot().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.context.subscribe()
    }

    /// Resolve the stored session at startup.
    ///
    /// Runs once; later calls return the current status without touching
    /// the network.
    pub async fn initialize(&self) -> SessionStatus {
        if !self.context.begin_initialize() {
            return self.context.snapshot().status;
        }

        let pair = match self.context.store().load() {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Failed to read stored tokens during startup");
                self.logout();
                return SessionStatus::Unauthenticated;
            }
        };

        if pair.is_none() {
            debug!("No complete token pair stored, starting logged out");
            // Drop any half pair left behind
            if let Err(e) = self.context.store().clear() {
                warn!(error = %e, "Failed to clear stored tokens");
            }
            self.context.set_unauthenticated();
            return SessionStatus::Unauthenticated;
        }

        match self.api.fetch_profile_once().await {
            Ok(user) => {
                info!(user_id = user.id, "Restored session from stored tokens");
                self.context.set_authenticated(user);
                return SessionStatus::Authenticated;
            }
            Err(e) => debug!(error = %e, "Stored access token not accepted, refreshing"),
        }

        if let Err(e) = self.api.refresh_access_token().await {
            warn!(error = %e, "Token refresh failed during startup");
            self.logout();
            return SessionStatus::Unauthenticated;
        }

        match self.api.fetch_profile_once().await {
            Ok(user) => {
                info!(user_id = user.id, "Restored session after token refresh");
                self.context.set_authenticated(user);
                SessionStatus::Authenticated
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed after token refresh");
                self.logout();
                SessionStatus::Unauthenticated
            }
        }
    }

    /// Log in with a username and password.
    ///
    /// A rejected login leaves stored tokens untouched. A failure after the
    /// new tokens were stored falls back to a full logout.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        self.context.set_loading();

        let pair = match self.api.authenticate(username, password).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Login rejected");
                self.context.set_unauthenticated();
                return Err(SessionError::from_api(e));
            }
        };

        if let Err(e) = self.context.store().save(&pair) {
            error!(error = %e, "Failed to store tokens after login");
            self.logout();
            return Err(e.into());
        }

        match self.api.fetch_profile().await {
            Ok(user) => {
                info!(user_id = user.id, "Login successful");
                self.context.set_authenticated(user.clone());
                self.context.navigate(Route::admin_home());
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Profile fetch failed after login");
                self.logout();
                Err(SessionError::from_api(e))
            }
        }
    }

    /// Clear tokens and user and navigate to the login page. Idempotent.
    pub fn logout(&self) {
        info!("Logging out");
        self.context.teardown();
    }

    /// Obtain a new access token using the stored refresh token.
    /// Logs out on failure.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        self.api.refresh_access_token().await
    }
}
