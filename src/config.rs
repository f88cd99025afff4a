/*
 * Responsibility
 * - Read settings from the environment once at startup (PORT, signing secret, exempt paths, ...)
 * - Validate them (missing or malformed values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::services::auth::SigningSecret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log_format: LogFormat,

    // HMAC secret shared with the token issuer (Debug is redacted)
    pub jwt_secret: SigningSecret,
    pub jwt_leeway_seconds: u64,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    // Raw exemption patterns; parsed by the auth factory.
    // `.env.example` carries the public member/posts/ranks/views allow-list.
    pub exempt_paths: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        let raw_secret = lookup("JWT_SECRET_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let secret_bytes = match lookup("JWT_SECRET_ENCODING").as_deref().map(str::trim) {
            None | Some("") | Some("base64") => STANDARD
                .decode(raw_secret.trim())
                .map_err(|_| ConfigError::Invalid("JWT_SECRET_KEY"))?,
            Some("raw") => raw_secret.into_bytes(),
            Some(_) => return Err(ConfigError::Invalid("JWT_SECRET_ENCODING")),
        };

        let jwt_secret =
            SigningSecret::new(secret_bytes).map_err(|_| ConfigError::Invalid("JWT_SECRET_KEY"))?;

        let jwt_leeway_seconds = match lookup("JWT_LEEWAY_SECONDS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            None => 0,
        };

        let jwt_issuer = lookup("JWT_ISSUER").filter(|s| !s.trim().is_empty());
        let jwt_audience = lookup("JWT_AUDIENCE").filter(|s| !s.trim().is_empty());

        let exempt_paths = lookup("AUTH_EXEMPT_PATHS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        Ok(Self {
            addr,
            app_env,
            log_format,
            jwt_secret,
            jwt_leeway_seconds,
            jwt_issuer,
            jwt_audience,
            exempt_paths,
        })
    }
}
