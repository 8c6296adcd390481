//! Service-provider onboarding handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{onboarding_to_api, publish_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    AffectedResponse, EducationRequest, PersonalDataRequest, SkillsRequest, WorkExperienceRequest,
};
use crate::infra::http::api::state::ApiState;

pub async fn add_provider_skills(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SkillsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .service_providers
        .add_skills(user_id, &payload.skill_ids)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn add_provider_education(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .service_providers
        .add_education(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_provider_education(
    State(state): State<ApiState>,
    Path((user_id, education_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .service_providers
        .update_education(user_id, education_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(record))
}

pub async fn delete_provider_education(
    State(state): State<ApiState>,
    Path((user_id, education_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service_providers
        .delete_education(user_id, education_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_provider_work_experience(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<WorkExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .service_providers
        .add_work_experience(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_provider_work_experience(
    State(state): State<ApiState>,
    Path((user_id, work_experience_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<WorkExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .service_providers
        .update_work_experience(user_id, work_experience_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(record))
}

pub async fn delete_provider_work_experience(
    State(state): State<ApiState>,
    Path((user_id, work_experience_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service_providers
        .delete_work_experience(user_id, work_experience_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_personal_data(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PersonalDataRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = state
        .service_providers
        .save_personal_data(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(overview))
}
