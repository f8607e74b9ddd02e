//! REST API client module for the directory backend.
//!
//! This module provides the `ApiClient` for communicating with the backend
//! and typed calls for users, businesses, events, categories and provinces.
//!
//! Requests carry a JWT bearer token. Expired tokens are renewed through
//! the refresh endpoint transparently, once per request.

pub mod client;
pub mod error;
pub mod form;
pub mod resources;

pub use client::ApiClient;
pub use error::ApiError;
pub use form::{FormData, FormValue};
