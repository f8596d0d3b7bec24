/// Report moderation endpoints
use crate::{
    admin::{EnforcementAction, Report, ReportStatus},
    api::middleware::client_info,
    auth::AdminIdentity,
    context::AppContext,
    error::{AdminError, AdminResult},
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/reports/:id", get(get_report))
        .route("/reports/:id/status", post(update_status))
}

/// Fetch a single report
async fn get_report(
    State(ctx): State<AppContext>,
    identity: AdminIdentity,
    Path(id): Path<i64>,
) -> AdminResult<Json<Report>> {
    identity.require(&["reports:view"])?;

    let report = ctx
        .reports
        .get(id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("report {} not found", id)))?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: ReportStatus,
    resolution_notes: Option<String>,
    #[serde(default)]
    action_taken: EnforcementAction,
}

#[derive(Debug, Serialize)]
struct UpdateStatusResponse {
    success: bool,
    report_id: i64,
    status: ReportStatus,
    user_banned: bool,
    banned_user_id: Option<i64>,
    content_deleted: bool,
    partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Resolve or dismiss a pending report, optionally enforcing against the
/// target. A deletion failure after the resolution has committed comes back
/// as a partial success, not an error.
async fn update_status(
    State(ctx): State<AppContext>,
    identity: AdminIdentity,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> AdminResult<Json<UpdateStatusResponse>> {
    identity.require(&["reports:review", "reports:dismiss"])?;

    let client = client_info(&headers);
    let outcome = ctx
        .moderation
        .resolve_report(
            id,
            req.status,
            req.resolution_notes,
            req.action_taken,
            identity.admin.id,
            &client,
        )
        .await?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        report_id: outcome.report_id,
        status: outcome.status,
        user_banned: outcome.user_banned,
        banned_user_id: outcome.banned_user_id,
        content_deleted: outcome.content_deleted,
        partial: outcome.partial,
        message: outcome.message,
    }))
}
