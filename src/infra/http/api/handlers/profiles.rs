use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use super::profile_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn get_student(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .profiles
        .student(user_id)
        .await
        .map_err(profile_to_api)?;
    Ok(Json(profile))
}

pub async fn get_service_provider(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .profiles
        .service_provider(user_id)
        .await
        .map_err(profile_to_api)?;
    Ok(Json(profile))
}

pub async fn get_admin(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.profiles.admin(user_id).await.map_err(profile_to_api)?;
    Ok(Json(profile))
}
