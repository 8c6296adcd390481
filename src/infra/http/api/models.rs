use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::application::applicants::ListingParams;
use crate::application::repos::{
    NewEducation, NewWorkExperience, PermissionGrant, PermissionParams, ProfessionalOverviewParams,
    RoleParams,
};
use crate::domain::types::EmploymentType;

/// Query string accepted by every listing endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub page_size: Option<u32>,
    pub current_page: Option<u32>,
    pub search: Option<String>,
    pub state: Option<String>,
    pub category_id: Option<Uuid>,
    pub discipline: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl From<ListingQuery> for ListingParams {
    fn from(query: ListingQuery) -> Self {
        Self {
            page_size: query.page_size,
            current_page: query.current_page,
            search: query.search,
            state: query.state,
            category_id: query.category_id,
            discipline: query.discipline,
            sort: query.sort,
            direction: query.direction,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectCategoryRequest {
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsRequest {
    pub skill_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationRequest {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

impl From<EducationRequest> for NewEducation {
    fn from(request: EducationRequest) -> Self {
        Self {
            institution: request.institution,
            degree: request.degree,
            field_of_study: request.field_of_study,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceRequest {
    pub company: String,
    pub title: String,
    pub employment_type: EmploymentType,
    pub location: Option<String>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    #[serde(default)]
    pub working_here: bool,
    pub description: Option<String>,
}

impl From<WorkExperienceRequest> for NewWorkExperience {
    fn from(request: WorkExperienceRequest) -> Self {
        Self {
            company: request.company,
            title: request.title,
            employment_type: request.employment_type,
            location: request.location,
            start_date: request.start_date,
            end_date: request.end_date,
            working_here: request.working_here,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummaryRequest {
    pub summary: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDataRequest {
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl From<PersonalDataRequest> for ProfessionalOverviewParams {
    fn from(request: PersonalDataRequest) -> Self {
        Self {
            phone_number: request.phone_number,
            address: request.address,
            city: request.city,
            state: request.state,
            country: request.country,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesRequest {
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAdminsRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleRequest> for RoleParams {
    fn from(request: RoleRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub name: String,
    pub description: Option<String>,
}

impl From<PermissionRequest> for PermissionParams {
    fn from(request: PermissionRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrantRequest {
    pub permission_id: Uuid,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachPermissionsRequest {
    pub permissions: Vec<PermissionGrantRequest>,
}

impl AttachPermissionsRequest {
    pub fn grants(&self) -> Vec<PermissionGrant> {
        self.permissions
            .iter()
            .map(|grant| PermissionGrant {
                permission_id: grant.permission_id,
                is_active: grant.is_active,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionIdsRequest {
    pub permission_ids: Vec<Uuid>,
}

/// Number of links or rows a bulk mutation changed.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedResponse {
    pub affected: u64,
}
