//! User projection read from the collaborator-owned `users` table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Minimal projection (id, name, email) embedded in charge responses.
///
/// The full user entity is managed by the auth collaborator; the charge
/// module only reads existence and identity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}
