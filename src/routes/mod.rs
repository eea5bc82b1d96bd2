pub mod admin;
pub mod auth;
pub mod company;
pub mod docs;
pub mod health;
pub mod student;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::middleware::{
    auth::{require_admin, require_company, require_reviewer, require_student, require_super_admin},
    cors::cors_layer,
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full HTTP surface. Role groups are guarded per route so unmatched paths
/// still fall through to 404.
pub fn router(state: AppState) -> Result<Router> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref())?;

    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-registration", post(auth::verify_registration))
        .route("/auth/resend-otp", post(auth::resend_otp))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/login", post(auth::login))
        .route_layer(from_fn_with_state(
            new_rps_state(state.config.auth_rps),
            rps_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/admin/verify-student",
            get(admin::pending_students).post(admin::decide_student),
        )
        .route(
            "/admin/verify-company",
            get(admin::pending_companies).post(admin::decide_company),
        )
        .route("/admin/jaf", get(admin::list_jafs).put(admin::moderate_jaf))
        .route("/admin/jaf/status", put(admin::set_job_status))
        .route("/admin/jaf/:id", put(admin::moderate_jaf_by_id))
        .route("/admin/users/:id/active", put(admin::set_user_active))
        .route("/admin/activity-logs", get(admin::activity_logs))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let super_admin_routes = Router::new()
        .route(
            "/admin/settings/smtp",
            get(admin::get_smtp_settings).put(admin::update_smtp_settings),
        )
        .route_layer(from_fn_with_state(state.clone(), require_super_admin));

    let company_routes = Router::new()
        .route(
            "/company/JAF",
            get(company::list_own_jafs).post(company::create_jaf),
        )
        .route("/company/JAF/:id/status", put(company::set_own_job_status))
        .route_layer(from_fn_with_state(state.clone(), require_company));

    let reviewer_routes = Router::new()
        .route(
            "/company/JAF/:id/applications",
            get(company::list_applications).put(company::update_application),
        )
        .route_layer(from_fn_with_state(state.clone(), require_reviewer));

    let student_routes = Router::new()
        .route("/student/jobs", get(student::list_jobs))
        .route("/student/jobs/apply", post(student::apply))
        .route("/student/applications", get(student::my_applications))
        .route_layer(from_fn_with_state(state.clone(), require_student));

    Ok(Router::new()
        .merge(base_routes)
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(super_admin_routes)
        .merge(company_routes)
        .merge(reviewer_routes)
        .merge(student_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
