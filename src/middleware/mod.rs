/*
 * Responsibility
 * - Public interface of the middleware layers
 * - http: request id / tracing / limits, auth: edge authentication filter
 */
pub mod auth;
pub mod http;
