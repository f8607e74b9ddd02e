//! HTTP client wrapper for the directory backend.
//!
//! Every request carries the stored access token as a bearer credential.
//! A `401` triggers exactly one token refresh and one resend; a second
//! rejection, or a failed refresh, ends the session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::auth::{CredentialPair, SessionContext};
use crate::models::UserProfile;

use super::{ApiError, FormData};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/user/auth/login/";
const REFRESH_PATH: &str = "/user/auth/refresh/";
const PROFILE_PATH: &str = "/user/profile/";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Request body, owned so the request can be rebuilt for the retry
#[derive(Debug, Clone)]
enum Body {
    Empty,
    Json(serde_json::Value),
    Form(FormData),
}

#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    url: String,
    query: Vec<(&'static str, String)>,
    body: Body,
}

/// Outcome of a single send
enum Attempt {
    Done(Response),
    Rejected { token: Option<String> },
}

/// API client for the directory backend.
/// Clone is cheap - the connection pool, session context and refresh lock are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new API client bound to a session context
    pub fn new(base_url: &str, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Resolve a backend path, passing absolute URLs (pagination links) through
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn current_access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.session.store().load()?.map(|pair| pair.access_token))
    }

    // ===== Authentication =====

    /// Exchange credentials for a token pair. Sent without a bearer token
    /// and never retried.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<CredentialPair, ApiError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let tokens: LoginResponse = Self::parse_json(response, LOGIN_PATH).await?;
        Ok(CredentialPair::new(tokens.access, tokens.refresh))
    }

    /// Fetch the profile through the refresh-and-retry pipeline
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get(PROFILE_PATH).await
    }

    /// Fetch the profile with the stored token, without refreshing on `401`
    pub async fn fetch_profile_once(&self) -> Result<UserProfile, ApiError> {
        let request = ApiRequest {
            method: Method::GET,
            url: self.url(PROFILE_PATH),
            query: Vec::new(),
            body: Body::Empty,
        };
        let token = self.current_access_token()?;
        let response = self.send(&request, token.as_deref()).await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, PROFILE_PATH).await
    }

    /// Obtain a new access token from the refresh endpoint.
    ///
    /// On any failure the session is torn down before the error is returned.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh after `rejected` was refused. Waiters queued behind an
    /// in-flight refresh reuse its token instead of refreshing again.
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        match self.current_access_token() {
            Ok(Some(current)) if Some(current.as_str()) != rejected => {
                debug!("Access token already refreshed by another request");
                Ok(current)
            }
            Ok(_) => self.refresh_locked().await,
            Err(e) => {
                error!(error = %e, "Failed to read stored tokens after rejection, ending session");
                self.session.teardown();
                Err(e)
            }
        }
    }

    async fn refresh_locked(&self) -> Result<String, ApiError> {
        let result = self.request_new_access_token().await;
        if let Err(ref e) = result {
            error!(error = %e, "Token refresh failed, ending session");
            self.session.teardown();
        }
        result
    }

    async fn request_new_access_token(&self) -> Result<String, ApiError> {
        let pair = self
            .session
            .store()
            .load()?
            .ok_or(ApiError::NoRefreshToken)?;

        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh: &pair.refresh_token,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let refreshed: RefreshResponse = Self::parse_json(response, REFRESH_PATH).await?;

        self.session.store().save_access_token(&refreshed.access)?;
        info!("Access token refreshed");
        Ok(refreshed.access)
    }

    // ===== Request pipeline =====

    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(ref value) => builder.json(value),
            Body::Form(ref form) => builder.multipart(form.to_multipart()),
        };

        debug!(method = %request.method, url = %request.url, "Sending request");
        Ok(builder.send().await?)
    }

    /// Send once with the given token, separating `401` from everything else
    async fn attempt(&self, request: &ApiRequest, token: Option<String>) -> Result<Attempt, ApiError> {
        let response = self.send(request, token.as_deref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            Ok(Attempt::Rejected { token })
        } else {
            Ok(Attempt::Done(Self::check_response(response).await?))
        }
    }

    /// Attempt, refresh once on rejection, resend once
    async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let token = self.current_access_token()?;

        let rejected = match self.attempt(&request, token).await? {
            Attempt::Done(response) => return Ok(response),
            Attempt::Rejected { token } => token,
        };

        debug!(url = %request.url, "Request unauthorized, refreshing access token");
        let fresh = match self.refresh_after_rejection(rejected.as_deref()).await {
            Ok(token) => token,
            Err(e) if e.is_session_expired() => return Err(e),
            Err(_) => return Err(ApiError::SessionExpired),
        };

        match self.attempt(&request, Some(fresh)).await? {
            Attempt::Done(response) => Ok(response),
            Attempt::Rejected { .. } => {
                error!(url = %request.url, "Request rejected after token refresh, ending session");
                self.session.teardown();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", what, e)))
    }

    fn request(&self, method: Method, path: &str, body: Body) -> ApiRequest {
        ApiRequest {
            method,
            url: self.url(path),
            query: Vec::new(),
            body,
        }
    }

    fn json_body<B: Serialize>(body: &B) -> Result<Body, ApiError> {
        serde_json::to_value(body)
            .map(Body::Json)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))
    }

    // ===== Verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with_query(path, Vec::new()).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<T, ApiError> {
        let mut request = self.request(Method::GET, path, Body::Empty);
        request.query = query;
        let response = self.execute(request).await?;
        Self::parse_json(response, path).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path, Self::json_body(body)?);
        let response = self.execute(request).await?;
        Self::parse_json(response, path).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.request(Method::PATCH, path, Self::json_body(body)?);
        let response = self.execute(request).await?;
        Self::parse_json(response, path).await
    }

    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: FormData) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path, Body::Form(form));
        let response = self.execute(request).await?;
        Self::parse_json(response, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path, Body::Empty);
        self.execute(request).await?;
        Ok(())
    }
}
