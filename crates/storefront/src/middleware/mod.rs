//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Current user (session user copied into request extensions)

pub mod auth;
pub mod session;

pub use auth::{RequireAuth, load_current_user, set_current_user};
pub use session::create_session_layer;
