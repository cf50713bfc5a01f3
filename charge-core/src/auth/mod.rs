//! External auth collaborator contract.
//!
//! User registration, sessions, user administration, and capability checks are
//! delegated to the auth service. The charge platform treats every call as an
//! opaque, trusted operation; [`AuthGateway`] is the seam, and
//! [`HttpAuthGateway`] is the production client. Tests inject their own
//! implementation behind `Arc<dyn AuthGateway>`.

mod http;

pub use http::{HttpAuthGateway, HttpAuthGatewayConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Minimal user projection returned by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Authenticated principal attached to each request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub role: Option<String>,
    /// Opaque session token, forwarded on collaborator calls made on the
    /// principal's behalf.
    pub token: String,
}

/// Session plus token, returned by sign-up and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub token: String,
    pub user: AuthUserRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Filter/sort/pagination contract of the collaborator's user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<AuthUserRecord>,
    pub total: i64,
}

/// Contract with the external auth collaborator.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, input: SignUpInput) -> Result<SessionInfo, AppError>;

    async fn sign_in(&self, input: SignInInput) -> Result<SessionInfo, AppError>;

    async fn sign_out(&self, token: &str) -> Result<(), AppError>;

    /// Resolve an opaque session token into a principal.
    async fn validate_session(&self, token: &str) -> Result<AuthSession, AppError>;

    async fn create_user(
        &self,
        token: &str,
        input: CreateUserInput,
    ) -> Result<AuthUserRecord, AppError>;

    async fn update_user(
        &self,
        token: &str,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<AuthUserRecord, AppError>;

    async fn delete_user(&self, token: &str, user_id: Uuid) -> Result<(), AppError>;

    async fn list_users(&self, token: &str, query: ListUsersQuery) -> Result<UserPage, AppError>;

    /// Ask the collaborator whether the principal holds every listed action on
    /// the resource, optionally constrained to a role (e.g. `admin`).
    async fn user_has_permission(
        &self,
        user_id: Uuid,
        role: Option<&str>,
        resource: &str,
        actions: &[&str],
    ) -> Result<bool, AppError>;
}
