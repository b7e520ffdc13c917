use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Unable to process user: {0}")]
    NotProcessed(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Invalid hook token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Hook token was minted for `{0}`")]
    WrongAction(String),
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Hook token was minted for another email address")]
    EmailMismatch,
}

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("Invalid issuer URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Sessions are not supported on {0}")]
    UnsupportedBackend(String),
    #[error("Session store setup failed: {0}")]
    Sqlx(#[from] tower_sessions_sqlx_store::sqlx::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid state parameter")]
    InvalidState,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Code delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("Issuer unavailable")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidState | AppError::InvalidEmail => StatusCode::BAD_REQUEST,
            AppError::Hook(_) => StatusCode::UNAUTHORIZED,
            AppError::Delivery(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::User(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, ?status, "request failed");
        } else {
            tracing::debug!(error = %self, ?status, "request rejected");
        }
        // Internal details stay in the logs.
        let message = match &self {
            AppError::User(_) | AppError::Session(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            AppError::Delivery(_) => "Code delivery failed".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_is_bad_request_with_fixed_message() {
        let err = AppError::InvalidState;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid state parameter");
    }

    #[test]
    fn missing_user_row_is_server_error() {
        let err = AppError::from(UserError::NotProcessed("a@b.c".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn hook_errors_are_unauthorized() {
        let err = AppError::from(HookError::MissingToken);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
