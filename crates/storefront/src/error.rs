//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//! Error bodies are JSON: `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::CartError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartError::InvalidUser => StatusCode::UNAUTHORIZED,
                CartError::ProductIdRequired
                | CartError::QuantityRequired
                | CartError::QuantityMustBePositive
                | CartError::InsufficientStock
                | CartError::QuantityTooLarge => StatusCode::BAD_REQUEST,
                CartError::ProductNotFound
                | CartError::CartNotFound
                | CartError::ItemNotFoundInCart => StatusCode::NOT_FOUND,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this once the request's user is known to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_message(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json["message"].as_str().unwrap().to_string())
    }

    #[test]
    fn test_cart_error_status_codes() {
        let cases = [
            (CartError::InvalidUser, StatusCode::UNAUTHORIZED),
            (CartError::ProductIdRequired, StatusCode::BAD_REQUEST),
            (CartError::QuantityRequired, StatusCode::BAD_REQUEST),
            (CartError::QuantityMustBePositive, StatusCode::BAD_REQUEST),
            (CartError::InsufficientStock, StatusCode::BAD_REQUEST),
            (CartError::QuantityTooLarge, StatusCode::BAD_REQUEST),
            (CartError::ProductNotFound, StatusCode::NOT_FOUND),
            (CartError::CartNotFound, StatusCode::NOT_FOUND),
            (CartError::ItemNotFoundInCart, StatusCode::NOT_FOUND),
            (
                CartError::Repository(RepositoryError::NotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_cart_error_messages_are_returned_verbatim() {
        let (status, message) = body_message(CartError::InsufficientStock.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Insufficient stock");

        let (status, message) = body_message(CartError::ItemNotFoundInCart.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Item not found in cart");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_string()));
        let (status, message) = body_message(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let (status, message) = body_message(AppError::NotFound("Product not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Product not found");
    }
}
