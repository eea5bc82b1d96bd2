use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::{Error, ForbiddenReason, Result};
use crate::models::role::Role;
use crate::utils::token::decode_token;
use crate::AppState;

/// Caller identity resolved from the bearer token, available to handlers as
/// `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub const ADMINS: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const SUPER_ADMINS: &[Role] = &[Role::SuperAdmin];
pub const COMPANIES: &[Role] = &[Role::Company];
pub const STUDENTS: &[Role] = &[Role::Student];
pub const REVIEWERS: &[Role] = &[Role::Company, Role::Admin, Role::SuperAdmin];

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized("unsupported authorization scheme".to_string()))
}

/// Decodes the token, checks the role set, and rejects accounts deactivated
/// or un-verified since the token was issued.
async fn authorize(state: &AppState, token: Result<String>, allowed: &[Role]) -> Result<AuthUser> {
    let token = token?;
    let claims = decode_token(&state.config.jwt_secret, &token)
        .map_err(|_| Error::Unauthorized("invalid or expired token".to_string()))?;

    if !allowed.contains(&claims.role) {
        return Err(Error::Forbidden(ForbiddenReason::Role));
    }

    let user = state
        .services
        .auth
        .find_by_id(claims.sub)
        .await
        .map_err(|err| match err {
            Error::NotFound(_) => Error::Unauthorized("account no longer exists".to_string()),
            other => other,
        })?;
    state.services.auth.ensure_admitted(&user).await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

async fn guard(state: AppState, mut req: Request, next: Next, allowed: &[Role]) -> Response {
    // The request body is not Sync, so nothing borrowed from `req` may be
    // held across the lookup below.
    let token = bearer_token(&req).map(str::to_owned);
    match authorize(&state, token, allowed).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(
                code = err.code(),
                path = %req.uri().path(),
                "request refused by access gate"
            );
            err.into_response()
        }
    }
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, ADMINS).await
}

pub async fn require_super_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    guard(state, req, next, SUPER_ADMINS).await
}

pub async fn require_company(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, COMPANIES).await
}

pub async fn require_student(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, STUDENTS).await
}

pub async fn require_reviewer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    guard(state, req, next, REVIEWERS).await
}
