//! Role and permission administration handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{admin_to_api, publish_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    AffectedResponse, AttachPermissionsRequest, PermissionIdsRequest, PermissionRequest,
    RoleRequest,
};
use crate::infra::http::api::state::ApiState;

pub async fn create_role(
    State(state): State<ApiState>,
    Json(payload): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .roles
        .create_role(payload.into())
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<ApiState>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state
        .roles
        .update_role(role_id, payload.into())
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<ApiState>,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .roles
        .delete_role(role_id)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permissions(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = state.roles.permissions().await.map_err(admin_to_api)?;
    Ok(Json(permissions))
}

pub async fn create_permission(
    State(state): State<ApiState>,
    Json(payload): Json<PermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = state
        .roles
        .create_permission(payload.into())
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn list_role_permissions(
    State(state): State<ApiState>,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = state
        .roles
        .role_permissions(role_id)
        .await
        .map_err(admin_to_api)?;
    Ok(Json(permissions))
}

pub async fn attach_role_permissions(
    State(state): State<ApiState>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<AttachPermissionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .roles
        .attach_permissions(role_id, &payload.grants())
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn detach_role_permissions(
    State(state): State<ApiState>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<PermissionIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .roles
        .detach_permissions(role_id, &payload.permission_ids)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}
