use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::{
            ActivityLogQuery, SetActiveRequest, SmtpSettingsResponse, UpdateSmtpSettingsPayload,
            UserStatusResponse,
        },
        jaf_dto::{JafListQuery, JafListResponse, JafResponse, ModerateJafPayload, SetJobStatusPayload},
        verification_dto::{
            DecisionResponse, PendingCompanySummary, PendingStudentSummary, VerifyAction,
            VerifyCompanyRequest, VerifyStudentRequest,
        },
    },
    error::{Error, Result},
    middleware::auth::AuthUser,
    services::verification_service::ProfileKind,
    AppState,
};

#[utoipa::path(
    get,
    path = "/admin/verify-student",
    responses(
        (status = 200, description = "Students awaiting admin verification", body = Json<Vec<PendingStudentSummary>>),
        (status = 403, description = "Caller is not an admin")
    )
)]
#[axum::debug_handler]
pub async fn pending_students(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let students = state.services.verification.pending_students().await?;
    let items: Vec<PendingStudentSummary> = students.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

/// Verify keeps the account; reject deletes it so the student can register
/// again.
#[utoipa::path(
    post,
    path = "/admin/verify-student",
    request_body = VerifyStudentRequest,
    responses(
        (status = 200, description = "Decision applied", body = Json<DecisionResponse>),
        (status = 400, description = "Student already verified"),
        (status = 404, description = "Student not found")
    )
)]
#[axum::debug_handler]
pub async fn decide_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<VerifyStudentRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let verification = &state.services.verification;
    let message = match payload.action {
        VerifyAction::Verify => {
            verification
                .verify(ProfileKind::Student, payload.student_id, auth.user_id)
                .await?;
            "Student verified"
        }
        VerifyAction::Reject => {
            verification
                .hard_reject_and_purge(
                    ProfileKind::Student,
                    payload.student_id,
                    auth.user_id,
                    payload.remarks.as_deref(),
                )
                .await?;
            "Student rejected and removed"
        }
    };
    Ok(Json(DecisionResponse {
        id: payload.student_id,
        action: payload.action,
        message: message.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/verify-company",
    responses(
        (status = 200, description = "Companies awaiting admin verification", body = Json<Vec<PendingCompanySummary>>),
        (status = 403, description = "Caller is not an admin")
    )
)]
#[axum::debug_handler]
pub async fn pending_companies(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let companies = state.services.verification.pending_companies().await?;
    let items: Vec<PendingCompanySummary> = companies.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

/// Rejected companies stay on record and can be verified later.
#[utoipa::path(
    post,
    path = "/admin/verify-company",
    request_body = VerifyCompanyRequest,
    responses(
        (status = 200, description = "Decision applied", body = Json<DecisionResponse>),
        (status = 400, description = "Company already verified"),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn decide_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<VerifyCompanyRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let verification = &state.services.verification;
    let message = match payload.action {
        VerifyAction::Verify => {
            verification
                .verify(ProfileKind::Company, payload.company_id, auth.user_id)
                .await?;
            "Company verified"
        }
        VerifyAction::Reject => {
            verification
                .soft_reject(
                    ProfileKind::Company,
                    payload.company_id,
                    auth.user_id,
                    payload.remarks.as_deref(),
                )
                .await?;
            "Company rejected"
        }
    };
    Ok(Json(DecisionResponse {
        id: payload.company_id,
        action: payload.action,
        message: message.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/jaf",
    params(
        ("status" = Option<String>, Query, description = "pending, approved or rejected")
    ),
    responses(
        (status = 200, description = "Job announcements", body = Json<JafListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_jafs(
    State(state): State<AppState>,
    Query(query): Query<JafListQuery>,
) -> Result<impl IntoResponse> {
    let jafs = state.services.jaf.list(query.status).await?;
    Ok(Json(JafListResponse::from(jafs)))
}

#[utoipa::path(
    put,
    path = "/admin/jaf",
    request_body = ModerateJafPayload,
    responses(
        (status = 200, description = "Announcement moderated", body = Json<JafResponse>),
        (status = 400, description = "Missing jaf_id or announcement already moderated"),
        (status = 404, description = "Announcement not found")
    )
)]
#[axum::debug_handler]
pub async fn moderate_jaf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ModerateJafPayload>,
) -> Result<impl IntoResponse> {
    let jaf_id = payload
        .jaf_id
        .ok_or_else(|| Error::BadRequest("jaf_id is required".to_string()))?;
    moderate(&state, jaf_id, payload, auth).await
}

#[utoipa::path(
    put,
    path = "/admin/jaf/{id}",
    params(
        ("id" = Uuid, Path, description = "Job announcement ID")
    ),
    request_body = ModerateJafPayload,
    responses(
        (status = 200, description = "Announcement moderated", body = Json<JafResponse>),
        (status = 400, description = "Announcement already moderated"),
        (status = 404, description = "Announcement not found")
    )
)]
#[axum::debug_handler]
pub async fn moderate_jaf_by_id(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateJafPayload>,
) -> Result<impl IntoResponse> {
    moderate(&state, id, payload, auth).await
}

async fn moderate(
    state: &AppState,
    jaf_id: Uuid,
    payload: ModerateJafPayload,
    auth: AuthUser,
) -> Result<Json<JafResponse>> {
    payload.validate()?;
    let jaf = state
        .services
        .jaf
        .moderate(jaf_id, payload.status, payload.remarks, auth.user_id)
        .await?;
    Ok(Json(JafResponse::from(jaf)))
}

#[utoipa::path(
    put,
    path = "/admin/jaf/status",
    request_body = SetJobStatusPayload,
    responses(
        (status = 200, description = "Job status changed", body = Json<JafResponse>),
        (status = 400, description = "Missing jaf_id or transition not allowed"),
        (status = 404, description = "Announcement not found")
    )
)]
#[axum::debug_handler]
pub async fn set_job_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SetJobStatusPayload>,
) -> Result<impl IntoResponse> {
    let jaf_id = payload
        .jaf_id
        .ok_or_else(|| Error::BadRequest("jaf_id is required".to_string()))?;
    let jaf = state
        .services
        .jaf
        .set_job_status(jaf_id, payload.job_status, None, auth.user_id)
        .await?;
    Ok(Json(JafResponse::from(jaf)))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/active",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Activation flag updated", body = Json<UserStatusResponse>),
        (status = 400, description = "Admins cannot deactivate themselves"),
        (status = 403, description = "Target role is out of reach for the caller"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn set_user_active(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .services
        .accounts
        .set_active(id, payload.is_active, auth.user_id, auth.role)
        .await?;
    Ok(Json(UserStatusResponse {
        id: user.id,
        email: user.email,
        is_active: user.is_active,
    }))
}

#[utoipa::path(
    get,
    path = "/admin/activity-logs",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum entries, 1 to 500")
    ),
    responses(
        (status = 200, description = "Most recent activity first")
    )
)]
#[axum::debug_handler]
pub async fn activity_logs(
    State(state): State<AppState>,
    Query(query): Query<ActivityLogQuery>,
) -> Result<impl IntoResponse> {
    let entries = state
        .services
        .activity
        .recent(query.limit.unwrap_or(100))
        .await?;
    Ok(Json(json!({ "items": entries })))
}

#[utoipa::path(
    get,
    path = "/admin/settings/smtp",
    responses(
        (status = 200, description = "Current SMTP settings", body = Json<SmtpSettingsResponse>),
        (status = 404, description = "SMTP has not been configured")
    )
)]
#[axum::debug_handler]
pub async fn get_smtp_settings(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let settings = state.services.settings.smtp().await?;
    Ok(Json(SmtpSettingsResponse::from(settings)))
}

#[utoipa::path(
    put,
    path = "/admin/settings/smtp",
    request_body = UpdateSmtpSettingsPayload,
    responses(
        (status = 200, description = "SMTP settings saved", body = Json<SmtpSettingsResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_smtp_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateSmtpSettingsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let settings = state
        .services
        .settings
        .update_smtp(payload, auth.user_id)
        .await?;
    Ok(Json(SmtpSettingsResponse::from(settings)))
}
