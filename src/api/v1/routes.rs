/*
 * Responsibility
 * - v1 URL structure
 * - /auth/verify accepts any method: proxies forward the original method as is
 */
use axum::{Router, routing::any};

use crate::api::v1::handlers::verify::verify;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/verify", any(verify))
}
