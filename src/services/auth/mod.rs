pub mod access_jwt;
pub mod edge;
pub mod exempt_paths;
pub mod factory;
pub mod trusted_headers;

pub use access_jwt::{AuthFailure, SigningSecret, TokenError, TokenPolicy, TokenValidator};
pub use edge::{Decision, EdgeAuth};
pub use exempt_paths::{ExemptPaths, MalformedPath, PatternError};
pub use factory::build_edge_auth;
pub use trusted_headers::TrustedHeaders;
