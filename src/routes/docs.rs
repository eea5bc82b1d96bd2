use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use super::{admin, auth, company, health, student};

#[derive(OpenApi)]
#[openapi(paths(
    health::health,
    auth::register,
    auth::verify_registration,
    auth::resend_otp,
    auth::forgot_password,
    auth::reset_password,
    auth::login,
    admin::pending_students,
    admin::decide_student,
    admin::pending_companies,
    admin::decide_company,
    admin::list_jafs,
    admin::moderate_jaf,
    admin::moderate_jaf_by_id,
    admin::set_job_status,
    admin::set_user_active,
    admin::activity_logs,
    admin::get_smtp_settings,
    admin::update_smtp_settings,
    company::create_jaf,
    company::list_own_jafs,
    company::set_own_job_status,
    company::list_applications,
    company::update_application,
    student::list_jobs,
    student::apply,
    student::my_applications,
))]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
