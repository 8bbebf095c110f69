//! Authentication middleware and extractors.
//!
//! The session layer is only consulted once per request, by
//! [`load_current_user`], which copies the logged-in user into request
//! extensions. Handlers then use [`RequireAuth`], which reads extensions only,
//! so any layer that supplies a [`CurrentUser`] extension (including tests)
//! authenticates the request.

use axum::{
    Json,
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::Span;

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};

/// Middleware that loads the logged-in user from the session.
///
/// Leaves the request untouched when there is no session, no user, or the
/// stored value cannot be read; [`RequireAuth`] then rejects it.
pub async fn load_current_user(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        let session = request.extensions().get::<Session>().cloned();
        let user = match session {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to read user from session");
                    None
                }),
            None => None,
        };

        if let Some(user) = user {
            Span::current().record("user_id", user.id.as_str());
            set_sentry_user(&user.id);
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but no user is present.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(Self)
            .ok_or(AuthRejection)
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn whoami(RequireAuth(user): RequireAuth) -> String {
        user.id.to_string()
    }

    async fn login(session: Session) -> StatusCode {
        set_current_user(&session, &CurrentUser::new("u42")).await.unwrap();
        StatusCode::NO_CONTENT
    }

    #[tokio::test]
    async fn test_missing_user_is_rejected() {
        let app = Router::new().route("/me", get(whoami));

        let response = app
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extension_user_is_accepted() {
        let app = Router::new()
            .route("/me", get(whoami))
            .layer(axum::Extension(CurrentUser::new("u1")));

        let response = app
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_user_is_loaded() {
        let app = Router::new()
            .route("/me", get(whoami))
            .route("/login", get(login))
            .layer(axum::middleware::from_fn(load_current_user))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(axum::http::header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"u42");
    }
}
