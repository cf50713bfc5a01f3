//! Charge endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use charge_core::error::AppError;
use charge_core::extract::{Json, Query};
use charge_core::response::{ApiListResponse, ApiResponse};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{ChargeQuery, ChargeResponse, CreateChargeRequest, UpdateChargeStatusRequest};
use crate::middleware::CurrentUser;
use crate::services::permissions::{
    capabilities, require_capability, resolve_read_scope, ReadScope,
};
use crate::AppState;

/// POST /charges
pub async fn create_charge(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(payload): Json<CreateChargeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChargeResponse>>), AppError> {
    payload.validate()?;
    require_capability(
        state.auth.as_ref(),
        &principal,
        capabilities::CREATE,
        "You do not have permission to create charges",
    )
    .await?;

    let charge = state.charges.create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Charge created successfully", charge)),
    ))
}

/// GET /charges
///
/// Listing requires `payment:listAll`; the filters are applied as sent.
/// The admin-role check only guards single-charge reads.
pub async fn list_charges(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<ChargeQuery>,
) -> Result<Json<ApiListResponse<ChargeResponse>>, AppError> {
    require_capability(
        state.auth.as_ref(),
        &principal,
        capabilities::LIST_ALL,
        "You do not have permission to list charges",
    )
    .await?;

    let charges = state.charges.find_all(&query).await?;

    Ok(Json(ApiListResponse::success(
        "Charges retrieved successfully",
        charges,
    )))
}

/// GET /charges/:id
pub async fn get_charge(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(charge_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ChargeResponse>>, AppError> {
    let scope = resolve_read_scope(state.auth.as_ref(), &principal).await?;
    if scope == ReadScope::Denied {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not have permission to view this charge"
        )));
    }

    let charge = state.charges.find_one(charge_id).await?;

    if scope == ReadScope::Owner && charge.user_id != principal.user_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not have permission to view this charge"
        )));
    }

    Ok(Json(ApiResponse::success(
        "Charge retrieved successfully",
        charge,
    )))
}

/// PATCH /charges/:id/status
pub async fn update_charge_status(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(charge_id): Path<Uuid>,
    Json(payload): Json<UpdateChargeStatusRequest>,
) -> Result<Json<ApiResponse<ChargeResponse>>, AppError> {
    require_capability(
        state.auth.as_ref(),
        &principal,
        capabilities::UPDATE,
        "You do not have permission to update charges",
    )
    .await?;

    let charge = state.charges.update_status(charge_id, payload.status).await?;

    Ok(Json(ApiResponse::success(
        "Charge status updated successfully",
        charge,
    )))
}
