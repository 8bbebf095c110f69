//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use sugarloaf_core::UserId;

/// Session-stored user identity.
///
/// Written to the session by the login flow and copied into request
/// extensions by [`crate::middleware::load_current_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's account ID.
    pub id: UserId,
}

impl CurrentUser {
    #[must_use]
    pub fn new(id: impl Into<UserId>) -> Self {
        Self { id: id.into() }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
