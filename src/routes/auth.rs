use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::auth_dto::{
        ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest, ResendOtpRequest,
        ResetPasswordRequest, VerifyRegistrationRequest,
    },
    error::Result,
    models::otp::OtpPurpose,
    AppState,
};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration staged and verification code sent", body = Json<RegisterResponse>),
        (status = 400, description = "Invalid payload or email already registered"),
        (status = 502, description = "Verification code could not be delivered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.services.registration.initiate(payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/auth/verify-registration",
    request_body = VerifyRegistrationRequest,
    responses(
        (status = 201, description = "Account created", body = Json<VerifyRegistrationResponse>),
        (status = 400, description = "Code already used, mismatched or expired"),
        (status = 404, description = "No code was issued for this email")
    )
)]
#[axum::debug_handler]
pub async fn verify_registration(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRegistrationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .services
        .registration
        .verify(&payload.email, &payload.otp)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "New code sent", body = Json<MessageResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 502, description = "Verification code could not be delivered")
    )
)]
#[axum::debug_handler]
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    match payload.purpose {
        OtpPurpose::Registration => state.services.registration.resend(&payload.email).await?,
        OtpPurpose::PasswordReset => state.services.auth.resend_reset_code(&payload.email).await?,
    }
    Ok(Json(MessageResponse::new(
        "A new verification code has been sent to your email",
    )))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code sent", body = Json<MessageResponse>),
        (status = 404, description = "No account for this email")
    )
)]
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.services.auth.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new(
        "A password reset code has been sent to your email",
    )))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = Json<MessageResponse>),
        (status = 400, description = "Code already used, mismatched or expired")
    )
)]
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .services
        .auth
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new(
        "Password has been reset. Please login with your new password.",
    )))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = Json<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account inactive or pending admin verification")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.services.auth.login(payload).await?;
    Ok(Json(response))
}
