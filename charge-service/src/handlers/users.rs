//! User endpoints, proxied to the auth collaborator.
//!
//! This service stores only the user projection it needs for charge
//! ownership; credentials, sessions and role administration live with the
//! collaborator, which also enforces authorization on the administrative
//! operations using the forwarded session token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use charge_core::auth::{
    AuthUserRecord, CreateUserInput, ListUsersQuery, SessionInfo, SignInInput, SignUpInput,
    UpdateUserInput, UserPage,
};
use charge_core::error::AppError;
use charge_core::extract::{Json, Query};
use charge_core::response::ApiResponse;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    CreateUserQuery, CreateUserRequest, LoginRequest, RegisterUserRequest, UpdateUserRequest,
};
use crate::middleware::CurrentUser;
use crate::AppState;

/// POST /users/register (public)
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionInfo>>), AppError> {
    payload.validate()?;

    let session = state
        .auth
        .sign_up(SignUpInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", session)),
    ))
}

/// POST /users/login (public)
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    payload.validate()?;

    let session = state
        .auth
        .sign_in(SignInInput {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(ApiResponse::success("Login successful", session)))
}

/// POST /users/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth.sign_out(&principal.token).await?;

    Ok(Json(ApiResponse::success_empty("Logout successful")))
}

/// POST /users?role=... (administrative)
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<CreateUserQuery>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthUserRecord>>), AppError> {
    payload.validate()?;

    let user = state
        .auth
        .create_user(
            &principal.token,
            CreateUserInput {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role: query.role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User created successfully", user)),
    ))
}

/// GET /users (administrative)
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserPage>>, AppError> {
    let page = state.auth.list_users(&principal.token, query).await?;

    Ok(Json(ApiResponse::success(
        "Users retrieved successfully",
        page,
    )))
}

/// PATCH /users/:id (administrative)
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<AuthUserRecord>>, AppError> {
    payload.validate()?;

    let user = state
        .auth
        .update_user(
            &principal.token,
            user_id,
            UpdateUserInput {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success("User updated successfully", user)))
}

/// DELETE /users/:id (administrative)
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth.delete_user(&principal.token, user_id).await?;

    Ok(Json(ApiResponse::success_empty("User deleted successfully")))
}
