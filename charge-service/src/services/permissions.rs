//! Capability constants and the two-tier read scope rule.

use charge_core::auth::{AuthGateway, AuthSession};
use charge_core::error::AppError;

/// Resource under which charge capabilities are registered with the auth
/// collaborator.
pub const PAYMENT_RESOURCE: &str = "payment";

/// Charge capabilities.
pub mod capabilities {
    /// Create charges.
    pub const CREATE: &str = "create";

    /// View own charges.
    pub const LIST: &str = "list";

    /// View any charge (administrator scope).
    pub const LIST_ALL: &str = "listAll";

    /// Update charge status.
    pub const UPDATE: &str = "update";
}

/// Outcome of the single-charge read scope resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    /// `payment:listAll` with the admin role: may view any charge.
    Admin,
    /// `payment:list`: may view a charge only if they own it.
    Owner,
    Denied,
}

/// Require a single capability; absence is a 403.
pub async fn require_capability(
    auth: &dyn AuthGateway,
    principal: &AuthSession,
    action: &str,
    denial_message: &str,
) -> Result<(), AppError> {
    let allowed = auth
        .user_has_permission(principal.user_id, None, PAYMENT_RESOURCE, &[action])
        .await?;

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("{denial_message}")))
    }
}

/// Ordered decision list for single-charge reads: the admin check runs first,
/// then the owner fallback. A principal without `payment:list` is denied
/// before any ownership comparison is attempted.
pub async fn resolve_read_scope(
    auth: &dyn AuthGateway,
    principal: &AuthSession,
) -> Result<ReadScope, AppError> {
    let is_admin = auth
        .user_has_permission(
            principal.user_id,
            Some("admin"),
            PAYMENT_RESOURCE,
            &[capabilities::LIST_ALL],
        )
        .await?;
    if is_admin {
        return Ok(ReadScope::Admin);
    }

    let can_list_own = auth
        .user_has_permission(
            principal.user_id,
            None,
            PAYMENT_RESOURCE,
            &[capabilities::LIST],
        )
        .await?;
    if can_list_own {
        return Ok(ReadScope::Owner);
    }

    Ok(ReadScope::Denied)
}
