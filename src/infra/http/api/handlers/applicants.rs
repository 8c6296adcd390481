//! Paginated applicant and admin listings

use axum::Json;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::IntoResponse;

use super::listing_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ListingQuery;
use crate::infra::http::api::state::ApiState;

const SOURCE: &str = "infra::http::api::listing";

/// Listing query string; malformed values render as the JSON error body.
#[derive(Debug)]
pub struct ListingParamsQuery(pub ListingQuery);

impl<S> FromRequestParts<S> for ListingParamsQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListingQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(SOURCE, rejection.body_text()).with_hint(
                    "pageSize and currentPage must be positive integers and categoryId a UUID",
                )
            })?;
        Ok(Self(query))
    }
}

pub async fn list_student_applicants(
    State(state): State<ApiState>,
    ListingParamsQuery(query): ListingParamsQuery,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .applicants
        .list_students(query.into())
        .await
        .map_err(listing_to_api)?;
    Ok(Json(page))
}

pub async fn list_service_provider_applicants(
    State(state): State<ApiState>,
    ListingParamsQuery(query): ListingParamsQuery,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .applicants
        .list_service_providers(query.into())
        .await
        .map_err(listing_to_api)?;
    Ok(Json(page))
}

pub async fn list_admin_users(
    State(state): State<ApiState>,
    ListingParamsQuery(query): ListingParamsQuery,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .applicants
        .list_admins(query.into())
        .await
        .map_err(listing_to_api)?;
    Ok(Json(page))
}
