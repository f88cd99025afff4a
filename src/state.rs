/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Clone is cheap: the authentication core is built once and shared read-only behind Arc
 */
use std::sync::Arc;

use crate::services::auth::EdgeAuth;

#[derive(Clone, Debug)]
pub struct AppState {
    pub edge: Arc<EdgeAuth>,
}

impl AppState {
    pub fn new(edge: Arc<EdgeAuth>) -> Self {
        Self { edge }
    }
}
