//! Student onboarding handlers

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::onboarding::IdentityDocumentsUpload;
use crate::application::uploads::DocumentUpload;

use super::{onboarding_to_api, publish_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    AffectedResponse, EducationRequest, PersonalDataRequest, ProfileSummaryRequest,
    SelectCategoryRequest, SkillsRequest, WorkExperienceRequest,
};
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::students";

const NYSC_FIELD: &str = "nysc";
const VALID_ID_FIELD: &str = "validId";

pub async fn select_category(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SelectCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state
        .students
        .select_category(user_id, payload.category_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(student))
}

pub async fn add_student_skills(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SkillsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let affected = state
        .students
        .add_skills(user_id, &payload.skill_ids)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(AffectedResponse { affected }))
}

pub async fn upload_identity_documents(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_identity_documents(multipart).await?;

    state
        .students
        .upload_identity_documents(user_id, upload)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_student_education(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .students
        .add_education(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_student_education(
    State(state): State<ApiState>,
    Path((user_id, education_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .students
        .update_education(user_id, education_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(record))
}

pub async fn delete_student_education(
    State(state): State<ApiState>,
    Path((user_id, education_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .students
        .delete_education(user_id, education_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_student_work_experience(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<WorkExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .students
        .add_work_experience(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_student_work_experience(
    State(state): State<ApiState>,
    Path((user_id, work_experience_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<WorkExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .students
        .update_work_experience(user_id, work_experience_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(record))
}

pub async fn delete_student_work_experience(
    State(state): State<ApiState>,
    Path((user_id, work_experience_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .students
        .delete_work_experience(user_id, work_experience_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_student_personal_data(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PersonalDataRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = state
        .students
        .save_personal_data(user_id, payload.into())
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(overview))
}

pub async fn save_profile_summary(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ProfileSummaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .students
        .save_profile_summary(user_id, &payload.summary)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(Json(summary))
}

pub async fn complete_onboarding(
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .students
        .complete_onboarding(user_id)
        .await
        .map_err(onboarding_to_api)?
        .publish(&state.refresher)
        .await
        .map_err(publish_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Collects the `nysc` and `validId` file fields; other fields are ignored.
async fn read_identity_documents(
    mut multipart: Multipart,
) -> Result<IdentityDocumentsUpload, ApiError> {
    let mut nysc = None;
    let mut valid_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(SOURCE, format!("invalid multipart payload: {err}")))?
    {
        let slot = match field.name() {
            Some(NYSC_FIELD) => &mut nysc,
            Some(VALID_ID_FIELD) => &mut valid_id,
            _ => continue,
        };

        let filename = field.file_name().map(str::to_owned);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field.bytes().await.map_err(|err| {
            ApiError::bad_request(SOURCE, format!("failed to read upload: {err}"))
        })?;

        *slot = Some(DocumentUpload {
            filename,
            content_type,
            bytes,
        });
    }

    let nysc = nysc.ok_or_else(|| missing_field(NYSC_FIELD))?;
    let valid_id = valid_id.ok_or_else(|| missing_field(VALID_ID_FIELD))?;
    Ok(IdentityDocumentsUpload { nysc, valid_id })
}

fn missing_field(name: &str) -> ApiError {
    ApiError::bad_request(SOURCE, format!("missing `{name}` file"))
        .with_hint("send both `nysc` and `validId` as multipart file fields")
}
