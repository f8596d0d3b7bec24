/// Authentication endpoints
use crate::{
    api::middleware::client_info,
    auth::AdminIdentity,
    context::AppContext,
    error::AdminResult,
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AdminSummary {
    id: i64,
    username: String,
    email: String,
    role_name: String,
    permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    admin: AdminSummary,
}

/// Verify credentials and issue a token pair
async fn login(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AdminResult<Json<LoginResponse>> {
    let client = client_info(&headers);

    // Credential guessing is throttled per client address
    ctx.login_limiter
        .check(client.ip.as_deref().unwrap_or("unknown"))?;

    let outcome = ctx.credentials.login(&req.email, &req.password, &client).await?;

    Ok(Json(LoginResponse {
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
        admin: AdminSummary {
            id: outcome.admin.id,
            username: outcome.admin.username,
            email: outcome.admin.email,
            role_name: outcome.role_name,
            permissions: outcome.permissions,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Redeem a refresh token; the presented token is spent either way
async fn refresh(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> AdminResult<Json<RefreshResponse>> {
    let client = client_info(&headers);
    let outcome = ctx.credentials.refresh(&req.refresh_token, &client).await?;

    Ok(Json(RefreshResponse {
        access_token: outcome.tokens.access_token,
        refresh_token: outcome.tokens.refresh_token,
    }))
}

#[derive(Debug, Deserialize)]
struct LogoutRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    success: bool,
}

/// Revoke the session for a refresh token. Always 200.
async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<LogoutRequest>,
) -> AdminResult<Json<LogoutResponse>> {
    let client = client_info(&headers);
    ctx.credentials.logout(&req.refresh_token, &client).await?;

    Ok(Json(LogoutResponse { success: true }))
}

#[derive(Debug, Serialize)]
struct MeResponse {
    id: i64,
    username: String,
    email: String,
    role_name: String,
    permissions: Vec<String>,
    last_login_at: Option<DateTime<Utc>>,
}

/// Current principal with role and permissions
async fn me(identity: AdminIdentity) -> AdminResult<Json<MeResponse>> {
    Ok(Json(MeResponse {
        id: identity.admin.id,
        username: identity.admin.username,
        email: identity.admin.email,
        role_name: identity.role_name,
        permissions: identity.permissions,
        last_login_at: identity.admin.last_login_at,
    }))
}
