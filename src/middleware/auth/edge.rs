//! Edge authentication in front of an in-process router.
//!
//! Every request, exempt or not:
//! - inbound `x-user-*` headers are removed
//! - exempt path: forwarded as is
//! - valid bearer token: forwarded with `X-User-Id` / `X-User-Email` / `X-User-Role`
//! - anything else: 401 with an empty body; the inner service is never called

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{Decision, trusted_headers};
use crate::state::AppState;

/// Put the edge filter in front of `router`.
///
/// ```ignore
/// let upstream = Router::new().route("/member/doSave", post(save));
/// let app = middleware::auth::edge::apply(upstream, state);
/// ```
pub fn apply<S>(router: Router<S>, state: AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(state, edge_middleware))
}

async fn edge_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let spoofed = trusted_headers::strip_inbound(req.headers_mut());
    if spoofed > 0 {
        tracing::warn!(path = req.uri().path(), spoofed, "dropped inbound identity headers");
    }

    let decision = state.edge.decide(req.uri().path(), req.headers());

    match decision {
        Decision::PassThrough => Ok(next.run(req).await),
        Decision::Authenticated(trusted) => {
            trusted.write_to(req.headers_mut());
            Ok(next.run(req).await)
        }
        Decision::Rejected(failure) => Err(AppError::Unauthorized(failure)),
    }
}
