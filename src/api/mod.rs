/// API routes and handlers
pub mod admins;
pub mod auth;
pub mod middleware;
pub mod reports;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(reports::routes())
        .merge(admins::routes())
}
