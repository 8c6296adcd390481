pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

pub fn build_api_router(state: ApiState) -> Router<ApiState> {
    let upload_body_limit = state.upload_body_limit;

    Router::new()
        .route("/api/v1/catalog/categories", get(handlers::list_categories))
        .route("/api/v1/catalog/skills", get(handlers::list_skills))
        .route("/api/v1/catalog/roles", get(handlers::list_roles))
        .route(
            "/api/v1/applicants/students",
            get(handlers::list_student_applicants),
        )
        .route(
            "/api/v1/applicants/service-providers",
            get(handlers::list_service_provider_applicants),
        )
        .route("/api/v1/students/{user_id}", get(handlers::get_student))
        .route(
            "/api/v1/students/{user_id}/category",
            put(handlers::select_category),
        )
        .route(
            "/api/v1/students/{user_id}/skills",
            post(handlers::add_student_skills),
        )
        .route(
            "/api/v1/students/{user_id}/identity-documents",
            post(handlers::upload_identity_documents)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route(
            "/api/v1/students/{user_id}/education",
            post(handlers::add_student_education),
        )
        .route(
            "/api/v1/students/{user_id}/education/{education_id}",
            put(handlers::update_student_education).delete(handlers::delete_student_education),
        )
        .route(
            "/api/v1/students/{user_id}/work-experience",
            post(handlers::add_student_work_experience),
        )
        .route(
            "/api/v1/students/{user_id}/work-experience/{work_experience_id}",
            put(handlers::update_student_work_experience)
                .delete(handlers::delete_student_work_experience),
        )
        .route(
            "/api/v1/students/{user_id}/personal-data",
            put(handlers::save_student_personal_data),
        )
        .route(
            "/api/v1/students/{user_id}/profile-summary",
            put(handlers::save_profile_summary),
        )
        .route(
            "/api/v1/students/{user_id}/complete",
            post(handlers::complete_onboarding),
        )
        .route(
            "/api/v1/service-providers/{user_id}",
            get(handlers::get_service_provider),
        )
        .route(
            "/api/v1/service-providers/{user_id}/skills",
            post(handlers::add_provider_skills),
        )
        .route(
            "/api/v1/service-providers/{user_id}/education",
            post(handlers::add_provider_education),
        )
        .route(
            "/api/v1/service-providers/{user_id}/education/{education_id}",
            put(handlers::update_provider_education).delete(handlers::delete_provider_education),
        )
        .route(
            "/api/v1/service-providers/{user_id}/work-experience",
            post(handlers::add_provider_work_experience),
        )
        .route(
            "/api/v1/service-providers/{user_id}/work-experience/{work_experience_id}",
            put(handlers::update_provider_work_experience)
                .delete(handlers::delete_provider_work_experience),
        )
        .route(
            "/api/v1/service-providers/{user_id}/personal-data",
            put(handlers::save_personal_data),
        )
        .route("/api/v1/admins", get(handlers::list_admin_users))
        .route("/api/v1/admins/delete", post(handlers::delete_admins))
        .route("/api/v1/admins/{user_id}", get(handlers::get_admin))
        .route(
            "/api/v1/admins/{user_id}/roles",
            post(handlers::assign_admin_roles).delete(handlers::remove_admin_roles),
        )
        .route(
            "/api/v1/admins/{user_id}/restore",
            post(handlers::restore_admin),
        )
        .route("/api/v1/roles", post(handlers::create_role))
        .route(
            "/api/v1/roles/{role_id}",
            put(handlers::update_role).delete(handlers::delete_role),
        )
        .route(
            "/api/v1/roles/{role_id}/permissions",
            get(handlers::list_role_permissions)
                .post(handlers::attach_role_permissions)
                .delete(handlers::detach_role_permissions),
        )
        .route(
            "/api/v1/permissions",
            get(handlers::list_permissions).post(handlers::create_permission),
        )
}
