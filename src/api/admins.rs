/// Admin account management endpoints
use crate::{
    api::middleware::client_info,
    auth::AdminIdentity,
    context::AppContext,
    error::AdminResult,
};
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/admins", post(create_admin))
}

#[derive(Debug, Deserialize)]
struct CreateAdminRequest {
    username: String,
    email: String,
    password: String,
    role_id: i64,
}

#[derive(Debug, Serialize)]
struct CreateAdminResponse {
    id: i64,
    username: String,
    email: String,
    role_id: i64,
}

/// Create an admin account. The password is hashed before persistence; the
/// plaintext never leaves this handler.
async fn create_admin(
    State(ctx): State<AppContext>,
    identity: AdminIdentity,
    headers: HeaderMap,
    Json(req): Json<CreateAdminRequest>,
) -> AdminResult<Json<CreateAdminResponse>> {
    identity.require(&["admins:create"])?;

    let admin = ctx
        .admins
        .create_admin(&req.username, &req.email, &req.password, req.role_id)
        .await?;

    let client = client_info(&headers);
    let resource_id = admin.id.to_string();
    ctx.audit
        .append(
            identity.admin.id,
            "admins.create",
            Some(("admin", resource_id.as_str())),
            None,
            &client,
        )
        .await?;

    Ok(Json(CreateAdminResponse {
        id: admin.id,
        username: admin.username,
        email: admin.email,
        role_id: admin.role_id,
    }))
}
