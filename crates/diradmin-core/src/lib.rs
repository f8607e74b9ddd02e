//! Core library for diradmin.
//!
//! Client for the business and event directory backend:
//! - `auth`: token storage, session lifecycle with silent token refresh, route guard
//! - `api`: HTTP client wrapper and typed resource calls
//! - `models`: users, businesses, events, categories, provinces
//! - `directory` and `map`: paginated business listing kept in step with its map view

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod map;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{
    GuardDecision, Route, RouteGuard, SessionContext, SessionError, SessionManager, SessionState,
    SessionStatus, TokenStore,
};
pub use config::Config;
