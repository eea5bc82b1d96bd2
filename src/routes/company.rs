use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{ApplicationListResponse, ApplicationResponse, UpdateApplicationPayload},
        jaf_dto::{CreateJafPayload, JafListResponse, JafResponse, SetJobStatusPayload},
    },
    error::Result,
    middleware::auth::AuthUser,
    models::role::Role,
    services::application_service::Reviewer,
    AppState,
};

#[utoipa::path(
    post,
    path = "/company/JAF",
    request_body = CreateJafPayload,
    responses(
        (status = 201, description = "Announcement submitted for moderation", body = Json<JafResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller is not a company")
    )
)]
#[axum::debug_handler]
pub async fn create_jaf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateJafPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let company = state.services.jaf.company_for_user(auth.user_id).await?;
    let jaf = state.services.jaf.submit(&company, payload).await?;
    Ok((StatusCode::CREATED, Json(JafResponse::from(jaf))))
}

#[utoipa::path(
    get,
    path = "/company/JAF",
    responses(
        (status = 200, description = "The caller's announcements, newest first", body = Json<JafListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_own_jafs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let company = state.services.jaf.company_for_user(auth.user_id).await?;
    let jafs = state.services.jaf.list_for_company(company.id).await?;
    Ok(Json(JafListResponse::from(jafs)))
}

#[utoipa::path(
    put,
    path = "/company/JAF/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Job announcement ID")
    ),
    request_body = SetJobStatusPayload,
    responses(
        (status = 200, description = "Job status changed", body = Json<JafResponse>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Announcement belongs to another company")
    )
)]
#[axum::debug_handler]
pub async fn set_own_job_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetJobStatusPayload>,
) -> Result<impl IntoResponse> {
    let company = state.services.jaf.company_for_user(auth.user_id).await?;
    let jaf = state
        .services
        .jaf
        .set_job_status(id, payload.job_status, Some(company.id), auth.user_id)
        .await?;
    Ok(Json(JafResponse::from(jaf)))
}

/// Companies review their own announcements only; admins review any.
async fn reviewer_for(state: &AppState, auth: AuthUser) -> Result<Reviewer> {
    let company_id = match auth.role {
        Role::Company => Some(state.services.jaf.company_for_user(auth.user_id).await?.id),
        _ => None,
    };
    Ok(Reviewer {
        user_id: auth.user_id,
        company_id,
    })
}

#[utoipa::path(
    get,
    path = "/company/JAF/{id}/applications",
    params(
        ("id" = Uuid, Path, description = "Job announcement ID")
    ),
    responses(
        (status = 200, description = "Applications in submission order", body = Json<ApplicationListResponse>),
        (status = 403, description = "Announcement belongs to another company"),
        (status = 404, description = "Announcement not found")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let reviewer = reviewer_for(&state, auth).await?;
    let items = state
        .services
        .applications
        .list_for_jaf(id, reviewer)
        .await?;
    Ok(Json(ApplicationListResponse { items }))
}

#[utoipa::path(
    put,
    path = "/company/JAF/{id}/applications",
    params(
        ("id" = Uuid, Path, description = "Job announcement ID")
    ),
    request_body = UpdateApplicationPayload,
    responses(
        (status = 200, description = "Application updated", body = Json<ApplicationResponse>),
        (status = 400, description = "Transition or round not allowed"),
        (status = 403, description = "Announcement belongs to another company"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn update_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let reviewer = reviewer_for(&state, auth).await?;
    let application = state
        .services
        .applications
        .update_status(id, payload, reviewer)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}
