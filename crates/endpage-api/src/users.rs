use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use endpage_store::StoreError;
use endpage_types::api::{Claims, UpdateUserRequest, UserResponse};

use crate::AppState;
use crate::auth::hash_password;
use crate::error::ApiError;

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(user.into()))
}

/// Accounts are self-service only: the path id must match the token.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if claims.sub != id {
        return Err(ApiError::Forbidden("you can only edit your own account"));
    }

    let username = req.username.filter(|u| !u.trim().is_empty());
    let password_hash = match req.password.as_deref() {
        Some(p) if !p.trim().is_empty() => Some(hash_password(p)?),
        _ => None,
    };

    let user = state
        .users
        .update_profile(id, username, password_hash)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("user not found"),
            StoreError::Conflict => ApiError::Conflict("username already exists"),
            e => e.into(),
        })?;

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    if claims.sub != id {
        return Err(ApiError::Forbidden("you can only delete your own account"));
    }

    state.users.delete(id).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("user not found"),
        e => e.into(),
    })?;
    Ok(StatusCode::NO_CONTENT)
}
