use thiserror::Error;

use crate::auth::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Token store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Failed to read upload: {0}")]
    Upload(#[from] std::io::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(truncated),
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Human-readable message from the backend error payload.
    ///
    /// Looks at `detail` first, then `message`. Returns `None` when the
    /// error carries no body or the body has neither field.
    pub fn detail(&self) -> Option<String> {
        let body = match self {
            ApiError::BadRequest(body)
            | ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::ServerError(body) => body,
            _ => return None,
        };

        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["detail", "message"]
            .iter()
            .filter_map(|key| value.get(key))
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Whether this error means the caller is no longer logged in.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::NoRefreshToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "x"),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_detail_prefers_detail_over_message() {
        let err = ApiError::Unauthorized(
            r#"{"detail":"No active account found","message":"other"}"#.to_string(),
        );
        assert_eq!(err.detail().as_deref(), Some("No active account found"));

        let err = ApiError::BadRequest(r#"{"message":"Bad input"}"#.to_string());
        assert_eq!(err.detail().as_deref(), Some("Bad input"));
    }

    #[test]
    fn test_detail_missing() {
        assert_eq!(ApiError::Unauthorized("not json".to_string()).detail(), None);
        assert_eq!(ApiError::BadRequest(r#"{"detail":"  "}"#.to_string()).detail(), None);
        assert_eq!(ApiError::SessionExpired.detail(), None);
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "a".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.starts_with(&"a".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated"));
    }
}
