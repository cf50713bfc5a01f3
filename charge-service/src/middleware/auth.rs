//! Bearer-token authentication against the auth collaborator.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use charge_core::auth::AuthSession;
use charge_core::error::AppError;

use crate::AppState;

/// Middleware to require authentication. Resolves the bearer token into an
/// [`AuthSession`] via the auth collaborator and stores it in request
/// extensions so handlers can access it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let session = state.auth.validate_session(token).await.map_err(|err| {
        tracing::debug!(error = %err, "Session validation failed");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session"))
    })?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Extractor to easily get the principal in handlers.
pub struct CurrentUser(pub AuthSession);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<AuthSession>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Auth session missing from request extensions"))
        })?;

        Ok(CurrentUser(session.clone()))
    }
}
