use std::fmt;

use axum::http::HeaderValue;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::{Map, Value};

const BEARER_PREFIX: &str = "Bearer ";

/// Minimum HMAC secret length, in bytes (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// Symmetric signing secret shared with the token issuer.
///
/// Key material is never printable via Debug.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("signing secret must be at least 32 bytes, got {0}")]
pub struct WeakSecret(pub usize);

impl SigningSecret {
    pub fn new(bytes: Vec<u8>) -> Result<Self, WeakSecret> {
        if bytes.len() < MIN_SECRET_LEN {
            return Err(WeakSecret(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Coarse failure classes. Every class yields the same 401 to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    InvalidSignature,
    InvalidClaims,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidSignature => "invalid_signature",
            AuthFailure::InvalidClaims => "invalid_claims",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Errors returned by bearer extraction + token verification + claim checks.
// None of the variants carry token material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("missing authorization header")]
    MissingAuthorization,
    #[error("authorization header is not a bearer credential")]
    NotBearer,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token algorithm is not accepted")]
    UnsupportedAlgorithm,
    #[error("token has expired")]
    Expired,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token audience is invalid")]
    InvalidAudience,
    #[error("token has no 'exp' claim")]
    MissingExpiry,
    #[error("token has no usable 'sub' claim")]
    MissingSubject,
    #[error("invalid '{0}' claim")]
    InvalidClaim(&'static str),
}

impl TokenError {
    /// Stable diagnostic code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::MissingAuthorization => "missing_authorization",
            TokenError::NotBearer => "not_bearer",
            TokenError::Malformed => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::UnsupportedAlgorithm => "unsupported_algorithm",
            TokenError::Expired => "token_expired",
            TokenError::NotYetValid => "token_not_yet_valid",
            TokenError::InvalidIssuer => "invalid_issuer",
            TokenError::InvalidAudience => "invalid_audience",
            TokenError::MissingExpiry => "missing_expiry",
            TokenError::MissingSubject => "missing_subject",
            TokenError::InvalidClaim(_) => "invalid_claim",
        }
    }

    pub fn failure(&self) -> AuthFailure {
        match self {
            TokenError::MissingAuthorization | TokenError::NotBearer => AuthFailure::MissingToken,
            TokenError::MissingSubject | TokenError::InvalidClaim(_) => AuthFailure::InvalidClaims,
            TokenError::Malformed
            | TokenError::InvalidSignature
            | TokenError::UnsupportedAlgorithm
            | TokenError::Expired
            | TokenError::NotYetValid
            | TokenError::InvalidIssuer
            | TokenError::InvalidAudience
            | TokenError::MissingExpiry => AuthFailure::InvalidSignature,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnsupportedAlgorithm
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "exp" => TokenError::MissingExpiry,
                "iss" => TokenError::InvalidIssuer,
                "aud" => TokenError::InvalidAudience,
                _ => TokenError::Malformed,
            },
            _ => TokenError::Malformed,
        }
    }
}

/// Knobs on top of the signing secret. Issuer/audience are only checked when set.
#[derive(Debug, Clone, Default)]
pub struct TokenPolicy {
    pub leeway_seconds: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// Identity extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// HMAC (HS256/HS384/HS512) bearer-token verifier.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .field("iss", &self.validation.iss)
            .field("aud", &self.validation.aud)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(secret: &SigningSecret, policy: &TokenPolicy) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = policy.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let mut required = vec!["exp"];
        if let Some(issuer) = &policy.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &policy.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);

        Self {
            decoding_key,
            validation,
        }
    }

    /// Extract the bearer credential. A missing header, a value that is not
    /// visible ASCII, or a missing `"Bearer "` prefix all count as "no token".
    pub fn bearer_token(authorization: Option<&HeaderValue>) -> Result<&str, TokenError> {
        let value = authorization
            .ok_or(TokenError::MissingAuthorization)?
            .to_str()
            .map_err(|_| TokenError::NotBearer)?;

        value.strip_prefix(BEARER_PREFIX).ok_or(TokenError::NotBearer)
    }

    /// Verify signature and time-bound claims, then extract identity.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        identity_from_claims(data.claims)
    }

    /// Full pipeline from the raw `Authorization` value.
    pub fn validate(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<IdentityClaims, TokenError> {
        let token = Self::bearer_token(authorization)?;
        self.verify(token)
    }
}

fn identity_from_claims(mut claims: Map<String, Value>) -> Result<IdentityClaims, TokenError> {
    let subject = match claims.remove("sub") {
        Some(Value::String(sub)) if !sub.trim().is_empty() => sub,
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(TokenError::MissingSubject);
        }
        Some(_) => return Err(TokenError::InvalidClaim("sub")),
    };

    Ok(IdentityClaims {
        subject,
        email: optional_string(&mut claims, "email")?,
        role: optional_string(&mut claims, "role")?,
    })
}

fn optional_string(
    claims: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, TokenError> {
    match claims.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(TokenError::InvalidClaim(name)),
    }
}
