/*
 * Responsibility
 * - Forward-auth endpoint for an external reverse proxy (Traefik ForwardAuth, nginx auth_request)
 * - The proxy sends the client's headers plus the original URI; we answer 200 (+ identity headers) or 401
 *
 * Notes
 * - The proxy must copy X-User-Id / X-User-Email / X-User-Role from this response onto the upstream
 *   request, replacing client-supplied values (Traefik `authResponseHeaders` does this).
 */
use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth::Decision;
use crate::state::AppState;

const X_FORWARDED_URI: HeaderName = HeaderName::from_static("x-forwarded-uri");
const X_ORIGINAL_URI: HeaderName = HeaderName::from_static("x-original-uri");

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = forwarded_path(&headers);
    if path.is_none() {
        tracing::debug!("forward-auth request without a usable original uri");
    }

    match state.edge.decide(path.as_deref().unwrap_or_default(), &headers) {
        Decision::PassThrough => Ok(StatusCode::OK.into_response()),
        Decision::Authenticated(trusted) => {
            let mut response = StatusCode::OK.into_response();
            trusted.write_to(response.headers_mut());
            Ok(response)
        }
        Decision::Rejected(failure) => Err(AppError::Unauthorized(failure)),
    }
}

/// Path of the original request, query string removed.
/// Accepts either an origin-form (`/a/b?x=1`) or absolute (`https://h/a/b`) URI.
fn forwarded_path(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(X_FORWARDED_URI)
        .or_else(|| headers.get(X_ORIGINAL_URI))?
        .to_str()
        .ok()?;

    let uri: Uri = raw.parse().ok()?;
    Some(uri.path().to_string())
}
