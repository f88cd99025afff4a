/// Factory: build `EdgeAuth` from application `Config`.
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::services::auth::{EdgeAuth, ExemptPaths, PatternError, TokenPolicy, TokenValidator};

pub fn build_edge_auth(config: &Config) -> Result<Arc<EdgeAuth>, PatternError> {
    let exempt = ExemptPaths::new(&config.exempt_paths)?;

    if exempt.patterns().iter().any(|p| p.is_catch_all()) {
        warn!("exemption list contains '/**': authentication is disabled for every path");
    }
    for pattern in exempt.patterns() {
        info!(%pattern, "authentication exempt");
    }

    let policy = TokenPolicy {
        leeway_seconds: config.jwt_leeway_seconds,
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    };
    let validator = TokenValidator::new(&config.jwt_secret, &policy);

    Ok(Arc::new(EdgeAuth::new(exempt, validator)))
}
