//! Edge authentication filter.
//!
//! For each request: decide whether the path is exempt from authentication,
//! otherwise verify the bearer token and turn its claims into trusted
//! `X-User-*` headers for downstream services, or reject with 401.
//!
//! - `services::auth` - the decision core (exempt paths, token validator, trusted headers)
//! - `middleware::auth::edge` - the filter as an axum middleware
//! - `api::v1` - forward-auth endpoint for external reverse proxies

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
