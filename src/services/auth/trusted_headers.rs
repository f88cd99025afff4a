//! Identity headers forwarded to downstream services.
//!
//! Downstream services trust `X-User-*` headers unconditionally, so only the
//! filter may set them: every inbound `x-user-*` header is dropped before the
//! request goes anywhere.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use super::access_jwt::{IdentityClaims, TokenError};

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");

const TRUSTED_PREFIX: &str = "x-user-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHeaders {
    user_id: HeaderValue,
    email: Option<HeaderValue>,
    role: Option<HeaderValue>,
}

impl TrustedHeaders {
    pub fn user_id(&self) -> &HeaderValue {
        &self.user_id
    }

    pub fn email(&self) -> Option<&HeaderValue> {
        self.email.as_ref()
    }

    pub fn role(&self) -> Option<&HeaderValue> {
        self.role.as_ref()
    }

    /// Replace any identity headers in `headers` with these values.
    pub fn write_to(&self, headers: &mut HeaderMap) {
        strip_inbound(headers);
        headers.insert(X_USER_ID, self.user_id.clone());
        if let Some(email) = &self.email {
            headers.insert(X_USER_EMAIL, email.clone());
        }
        if let Some(role) = &self.role {
            headers.insert(X_USER_ROLE, role.clone());
        }
    }
}

impl TryFrom<IdentityClaims> for TrustedHeaders {
    type Error = TokenError;

    fn try_from(claims: IdentityClaims) -> Result<Self, Self::Error> {
        let user_id =
            HeaderValue::try_from(claims.subject).map_err(|_| TokenError::InvalidClaim("sub"))?;
        let email = claims
            .email
            .map(HeaderValue::try_from)
            .transpose()
            .map_err(|_| TokenError::InvalidClaim("email"))?;
        let role = claims
            .role
            .map(HeaderValue::try_from)
            .transpose()
            .map_err(|_| TokenError::InvalidClaim("role"))?;

        Ok(Self {
            user_id,
            email,
            role,
        })
    }
}

/// Drop every `x-user-*` header. Returns how many distinct names were removed.
pub fn strip_inbound(headers: &mut HeaderMap) -> usize {
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(TRUSTED_PREFIX))
        .cloned()
        .collect();

    for name in &spoofed {
        headers.remove(name);
    }
    spoofed.len()
}
