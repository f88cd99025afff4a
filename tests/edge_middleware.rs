//! The edge filter as an axum middleware in front of an in-process upstream.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
    response::Response,
    routing::any,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use edge_auth::{app, config::Config, middleware::auth::edge, state::AppState};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "an-edge-auth-test-secret-of-32+bytes";

fn state() -> AppState {
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET_KEY" => Some(SECRET.to_string()),
        "JWT_SECRET_ENCODING" => Some("raw".to_string()),
        "AUTH_EXEMPT_PATHS" => Some("/member/doLogin,/views/**".to_string()),
        _ => None,
    })
    .unwrap();
    app::build_state(&config).unwrap()
}

/// Upstream that reports the identity headers it received.
fn upstream(hits: Arc<AtomicUsize>) -> Router {
    let echo = move |headers: HeaderMap| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            let get = |name: &str| {
                headers
                    .get_all(name)
                    .iter()
                    .map(|v| v.to_str().unwrap().to_string())
                    .collect::<Vec<_>>()
            };
            Json(json!({
                "user_id": get("x-user-id"),
                "email": get("x-user-email"),
                "role": get("x-user-role"),
            }))
        }
    };

    Router::new()
        .route("/member/doLogin", any(echo.clone()))
        .route("/member/doSave", any(echo.clone()))
        .route("/views", any(echo.clone()))
        .route("/views/{id}", any(echo.clone()))
        .route("/views-internal", any(echo))
}

fn gateway() -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    (edge::apply(upstream(hits.clone()), state()), hits)
}

fn token(claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn exp() -> i64 {
    chrono::Utc::now().timestamp() + 600
}

fn request(path: &str, authorization: Option<String>, extra: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn assert_rejected(response: Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn exact_exempt_path_needs_no_token() {
    let (app, hits) = gateway();
    let response = app
        .oneshot(request("/member/doLogin", None, &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn subtree_exempt_path_needs_no_token() {
    for path in ["/views", "/views/42", "/views/42?source=home"] {
        let (app, hits) = gateway();
        let response = app.oneshot(request(path, None, &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn sibling_of_exempt_prefix_requires_token() {
    let (app, hits) = gateway();
    let response = app
        .oneshot(request("/views-internal", None, &[]))
        .await
        .unwrap();

    assert_rejected(response).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_or_malformed_authorization_is_rejected() {
    for authorization in [
        None,
        Some("Basic dTE6cHc=".to_string()),
        Some("bearer abc".to_string()),
        Some("Bearer not-a-jwt".to_string()),
    ] {
        let (app, hits) = gateway();
        let response = app
            .oneshot(request("/member/doSave", authorization, &[]))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert_rejected(response).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn forged_signature_is_rejected() {
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "u1", "exp": exp() }),
        &EncodingKey::from_secret(b"someone-elses-secret-32-bytes-long"),
    )
    .unwrap();

    let (app, hits) = gateway();
    let response = app
        .oneshot(request("/member/doSave", Some(format!("Bearer {}", forged)), &[]))
        .await
        .unwrap();

    assert_rejected(response).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payload_swapped_under_original_signature_is_rejected() {
    let genuine = token(json!({ "sub": "u1", "role": "USER", "exp": exp() }));
    let parts: Vec<&str> = genuine.split('.').collect();
    let payload = json!({ "sub": "u1", "role": "ADMIN", "exp": exp() }).to_string();
    let tampered = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(payload),
        parts[2]
    );

    let (app, hits) = gateway();
    let response = app
        .oneshot(request("/member/doSave", Some(format!("Bearer {}", tampered)), &[]))
        .await
        .unwrap();

    assert_rejected(response).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let expired = token(json!({ "sub": "u1", "exp": chrono::Utc::now().timestamp() - 60 }));
    let (app, _) = gateway();
    let response = app
        .oneshot(request("/member/doSave", Some(format!("Bearer {}", expired)), &[]))
        .await
        .unwrap();

    assert_rejected(response).await;
}

#[tokio::test]
async fn valid_token_injects_identity_headers() {
    let jwt = token(json!({
        "sub": "u1", "email": "u1@x.com", "role": "USER", "exp": exp()
    }));

    let (app, hits) = gateway();
    let response = app
        .oneshot(request("/member/doSave", Some(format!("Bearer {}", jwt)), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        json_body(response).await,
        json!({ "user_id": ["u1"], "email": ["u1@x.com"], "role": ["USER"] })
    );
}

#[tokio::test]
async fn absent_optional_claims_are_omitted() {
    let jwt = token(json!({ "sub": "u1", "exp": exp() }));

    let (app, _) = gateway();
    let response = app
        .oneshot(request("/member/doSave", Some(format!("Bearer {}", jwt)), &[]))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        json!({ "user_id": ["u1"], "email": [], "role": [] })
    );
}

#[tokio::test]
async fn spoofed_identity_is_replaced_by_token_identity() {
    let jwt = token(json!({ "sub": "real", "exp": exp() }));

    let (app, _) = gateway();
    let response = app
        .oneshot(request(
            "/member/doSave",
            Some(format!("Bearer {}", jwt)),
            &[("x-user-id", "attacker"), ("x-user-role", "ADMIN")],
        ))
        .await
        .unwrap();

    assert_eq!(
        json_body(response).await,
        json!({ "user_id": ["real"], "email": [], "role": [] })
    );
}

#[tokio::test]
async fn spoofed_identity_is_stripped_on_exempt_paths() {
    let (app, _) = gateway();
    let response = app
        .oneshot(request(
            "/views/42",
            None,
            &[("x-user-id", "attacker"), ("x-user-email", "a@evil.test")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "user_id": [], "email": [], "role": [] })
    );
}

#[tokio::test]
async fn same_request_gets_same_outcome() {
    let jwt = token(json!({ "sub": "u1", "exp": exp() }));
    let (app, _) = gateway();

    for _ in 0..2 {
        let ok = app
            .clone()
            .oneshot(request("/member/doSave", Some(format!("Bearer {}", jwt)), &[]))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let denied = app
            .clone()
            .oneshot(request("/member/doSave", None, &[]))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }
}
