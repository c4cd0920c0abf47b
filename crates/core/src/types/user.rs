//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use super::UserId;

/// The authenticated user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}
