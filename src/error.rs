//! Request-level error types and their HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Rejections produced by the authorization pipeline.
///
/// Every variant is terminal for the request and maps to a fixed status and
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header.
    #[error("missing credential")]
    MissingCredential,

    /// Bad signature, malformed token, or expired token.
    #[error("invalid credential")]
    InvalidCredential,

    /// The role gate ran without a verified identity.
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("rate limit exceeded")]
    RateExceeded,
}

impl AuthError {
    /// HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::RateExceeded => StatusCode::CONFLICT,
            _ => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message for this rejection.
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Forbidden - no token",
            AuthError::InvalidCredential => "Forbidden - invalid token",
            AuthError::Unauthenticated | AuthError::InsufficientRole => {
                "Forbidden - insufficient role"
            }
            AuthError::RateExceeded => "Too many requests - please wait.",
        }
    }

    /// Short label used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::RateExceeded => "rate_exceeded",
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                message: self.message().to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidLogin,

    /// Body missing, not JSON, or not the expected shape.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::InvalidLogin => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            ApiError::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_fixed_responses() {
        let table = [
            (AuthError::MissingCredential, 403, "Forbidden - no token"),
            (AuthError::InvalidCredential, 403, "Forbidden - invalid token"),
            (AuthError::InsufficientRole, 403, "Forbidden - insufficient role"),
            (AuthError::Unauthenticated, 403, "Forbidden - insufficient role"),
            (AuthError::RateExceeded, 409, "Too many requests - please wait."),
        ];

        for (err, status, message) in table {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
            assert_eq!(err.message(), message, "{err:?}");
        }
    }

    #[test]
    fn api_error_passes_auth_rejections_through() {
        let response = ApiError::from(AuthError::RateExceeded).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError::InvalidLogin.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
