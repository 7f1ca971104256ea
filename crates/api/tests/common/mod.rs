#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use canopy_api::auth::jwt::{generate_access_token, JwtConfig};
use canopy_api::config::ServerConfig;
use canopy_api::router::build_app_router;
use canopy_api::state::AppState;
use canopy_core::search::SearchStrategy;
use canopy_core::types::DbId;
use canopy_db::models::user::CreateUser;
use canopy_db::repositories::UserRepo;
use canopy_wiki::Wiki;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        site_url: "http://wiki.test".to_string(),
        backup_path: None,
        search_strategy: SearchStrategy::Substring,
        share_access_queue: 0,
        trust_proxy_headers: true,
        jwt: JwtConfig {
            secret: "canopy-api-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router over `pool`, exactly as `main.rs` does.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        wiki: Wiki::new(pool),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Insert a user and mint a bearer token for it.
pub async fn login_as(pool: &PgPool, username: &str, role: &str) -> (DbId, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: username.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap();
    let token = generate_access_token(user.id, role, &test_config().jwt).unwrap();
    (user.id, token)
}

// ---- Requests ----

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request("GET", uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request("GET", uri, Some(token), None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, request("POST", uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request("POST", uri, Some(token), None)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, request("PUT", uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request("DELETE", uri, Some(token), None)).await
}

/// Anonymous GET from a given client address.
pub async fn get_from_ip(app: Router, uri: &str, ip: &str) -> Response<Body> {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .header("user-agent", "canopy-test")
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
