use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ApiMessage;

/// ApiError
///
/// The full error taxonomy of the service. Every fallible path in a handler
/// resolves to one of these variants, and the `IntoResponse` impl below is the
/// single point where errors become HTTP responses, so the envelope shape is
/// uniform across the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// A unique key (username, role name, permission slug) is already taken.
    #[error("{0}")]
    Duplicate(String),

    /// The referenced id, slug, or name does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No credential was presented on a gated route.
    #[error("missing bearer token")]
    MissingToken,

    /// A credential was presented but could not be parsed as a bearer JWT.
    #[error("malformed bearer token")]
    MalformedToken,

    /// The token parsed but its signature or expiry check failed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The token was valid but its subject no longer exists.
    #[error("user no longer exists")]
    UnknownUser,

    /// Login password verification failed.
    #[error("incorrect password")]
    InvalidCredentials,

    /// Authenticated, but no role carries the required permission.
    #[error("permission denied")]
    PermissionDenied,

    /// Unexpected store failure. Converted from sqlx below.
    #[error("database error")]
    Database(#[source] sqlx::Error),

    /// Any other unanticipated failure (e.g. password hashing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) | ApiError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidToken | ApiError::UnknownUser => StatusCode::UNAUTHORIZED,
            ApiError::MissingToken | ApiError::MalformedToken | ApiError::PermissionDenied => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    /// Unique-index violations surface as the same duplicate result as the
    /// handler pre-checks. The pre-check is advisory: two concurrent creates
    /// with the same key can both pass it, and the unique index is the actual
    /// correctness backstop.
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::Duplicate(
                    "a record with the same unique value already exists".to_string(),
                );
            }
        }
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 500s get logged with full context and answered with a generic
        // message so store/runtime details never reach the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "unhandled internal error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ApiMessage {
            success: false,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(
            ApiError::Validation("username is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Duplicate("username already in use".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("role").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MissingToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::MalformedToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UnknownUser.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Internal("hashing failed".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::Database(_)));
    }
}
