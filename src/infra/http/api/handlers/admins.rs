//! Admin role and lifecycle handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{admin_to_api, publish_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{AffectedResponse, DeleteAdminsRequest, RolesRequest};
use crate::infra::http::api::state::ApiState;

pub async fn assign_admin_roles(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RolesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .admins
        .assign_roles(user_id, &payload.role_ids)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn remove_admin_roles(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RolesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .admins
        .remove_roles(user_id, &payload.role_ids)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn delete_admins(
    State(state): State<ApiState>,
    Json(payload): Json<DeleteAdminsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .admins
        .delete_admins(&payload.user_ids)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn restore_admin(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .admins
        .restore_admin(user_id)
        .await
        .map_err(admin_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
