use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::repo_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn list_categories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.catalog.categories().await.map_err(repo_to_api)?;
    Ok(Json(categories))
}

pub async fn list_skills(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let skills = state.catalog.skills().await.map_err(repo_to_api)?;
    Ok(Json(skills))
}

pub async fn list_roles(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let roles = state.catalog.roles().await.map_err(repo_to_api)?;
    Ok(Json(roles))
}
