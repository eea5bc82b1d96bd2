use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::{
        application_dto::{ApplicationListResponse, ApplicationResponse, ApplyPayload},
        jaf_dto::StudentJobListResponse,
    },
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/student/jobs",
    responses(
        (status = 200, description = "Open jobs with the caller's eligibility", body = Json<StudentJobListResponse>),
        (status = 403, description = "Caller is not a student")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let student = state
        .services
        .applications
        .student_for_user(auth.user_id)
        .await?;
    let items = state.services.jaf.open_jobs_for(&student).await?;
    Ok(Json(StudentJobListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/student/jobs/apply",
    request_body = ApplyPayload,
    responses(
        (status = 201, description = "Application submitted", body = Json<ApplicationResponse>),
        (status = 400, description = "Closed, past deadline, duplicate or ineligible"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    let applications = &state.services.applications;
    let student = applications.student_for_user(auth.user_id).await?;
    let application = applications.apply(&student, payload.jaf_id).await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

#[utoipa::path(
    get,
    path = "/student/applications",
    responses(
        (status = 200, description = "The caller's applications, newest first", body = Json<ApplicationListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let applications = &state.services.applications;
    let student = applications.student_for_user(auth.user_id).await?;
    let items = applications.list_for_student(student.id).await?;
    Ok(Json(ApplicationListResponse { items }))
}
