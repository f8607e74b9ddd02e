//! Authentication: token storage, the session lifecycle and route access.
//!
//! This module provides:
//! - `TokenStore`: persisted access/refresh token pair (file, keychain or memory)
//! - `SessionContext`: the shared session state handed to every component
//! - `SessionManager`: startup token check, login, logout and silent refresh
//! - `RouteGuard`: gates protected routes on the session status

pub mod guard;
pub mod session;
pub mod store;

pub use guard::{decide, AdminPage, GuardDecision, Route, RouteError, RouteGuard};
pub use session::{SessionContext, SessionError, SessionManager, SessionState, SessionStatus};
pub use store::{
    CredentialPair, FileTokenStore, KeyringTokenStore, MemoryTokenStore, StoreError, TokenStore,
};
