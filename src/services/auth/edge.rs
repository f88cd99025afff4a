//! Per-request authentication decision.
//!
//! `EdgeAuth::decide` runs the exemption check and, when needed, token
//! validation. It never forwards or writes anything itself; host adapters
//! (middleware, forward-auth handler) act on the returned [`Decision`].

use axum::http::{HeaderMap, header};
use tracing::{debug, warn};

use super::access_jwt::{AuthFailure, TokenValidator};
use super::exempt_paths::ExemptPaths;
use super::trusted_headers::TrustedHeaders;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Exempt path: forward without identity headers.
    PassThrough,
    /// Verified token: forward with these identity headers.
    Authenticated(TrustedHeaders),
    /// Reject with 401; nothing is forwarded.
    Rejected(AuthFailure),
}

#[derive(Debug)]
pub struct EdgeAuth {
    exempt: ExemptPaths,
    validator: TokenValidator,
}

impl EdgeAuth {
    pub fn new(exempt: ExemptPaths, validator: TokenValidator) -> Self {
        Self { exempt, validator }
    }

    /// `path` is the request path without query string.
    pub fn decide(&self, path: &str, headers: &HeaderMap) -> Decision {
        match self.exempt.classify(path) {
            Ok(true) => {
                debug!(path, "exempt path, skipping authentication");
                return Decision::PassThrough;
            }
            Ok(false) => {}
            Err(reason) => {
                debug!(path, %reason, "path not eligible for exemption");
            }
        }

        let identity = self
            .validator
            .validate(headers.get(header::AUTHORIZATION))
            .and_then(TrustedHeaders::try_from);

        match identity {
            Ok(trusted) => {
                debug!(path, user_id = ?trusted.user_id(), "request authenticated");
                Decision::Authenticated(trusted)
            }
            Err(err) => {
                let failure = err.failure();
                warn!(
                    path,
                    code = err.code(),
                    failure = %failure,
                    "request rejected"
                );
                Decision::Rejected(failure)
            }
        }
    }
}
