//! HTTP-level tests for share-link issuing, public viewing and management.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, get_auth, get_from_ip, login_as, post_auth, post_json_auth,
};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---- Helpers ----

async fn create_page(pool: &PgPool, token: &str, slug: &str) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/pages",
        token,
        json!({ "slug": slug, "title": slug, "content": "body", "is_published": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn issue(pool: &PgPool, token: &str, page_id: i64, body: Value) -> Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/pages/{page_id}/share-links"),
        token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---- Issue and view ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn issued_link_serves_page_and_counts_views(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;
    let issued = issue(&pool, &token, page_id, json!({})).await;

    let share_token = issued["token"].as_str().unwrap().to_string();
    assert_eq!(issued["url"], format!("http://wiki.test/s/{share_token}"));
    assert!(issued["link"].get("token_hash").is_none());

    let app = common::build_test_app(pool.clone());
    let response = get_from_ip(app, &format!("/s/{share_token}"), "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"]["slug"], "handbook");

    let link_id = issued["link"]["id"].as_i64().unwrap();
    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/share-links/{link_id}/stats"), &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_views"], 1);
    assert_eq!(json["data"]["unique_ips"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_token_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/s/this-token-does-not-exist-anywhere-000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_expiry_is_rejected(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/pages/{page_id}/share-links"),
        &token,
        json!({ "expires_in": "soon" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---- Denials ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn view_quota_denies_with_code(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;
    let issued = issue(&pool, &token, page_id, json!({ "max_views": 1 })).await;
    let uri = format!("/s/{}", issued["token"].as_str().unwrap());

    let app = common::build_test_app(pool.clone());
    assert_eq!(get_from_ip(app, &uri, "10.0.0.1").await.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get_from_ip(app, &uri, "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "SHARE_VIEW_LIMIT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_ip_quota_admits_known_addresses(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;
    let issued = issue(&pool, &token, page_id, json!({ "max_unique_ips": 1 })).await;
    let uri = format!("/s/{}", issued["token"].as_str().unwrap());

    let app = common::build_test_app(pool.clone());
    assert_eq!(get_from_ip(app, &uri, "10.0.0.1").await.status(), StatusCode::OK);
    let app = common::build_test_app(pool.clone());
    assert_eq!(get_from_ip(app, &uri, "10.0.0.1").await.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get_from_ip(app, &uri, "10.0.0.2").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "SHARE_IP_LIMIT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoked_link_is_gone(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;
    let issued = issue(&pool, &token, page_id, json!({})).await;
    let link_id = issued["link"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/share-links/{link_id}/revoke"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let uri = format!("/s/{}", issued["token"].as_str().unwrap());
    let response = get_from_ip(app, &uri, "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(body_json(response).await["code"], "SHARE_REVOKED");

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/share-links/{link_id}"), &token).await;
    assert_eq!(body_json(response).await["data"]["status"], "revoked");
}

// ---- Scope ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn descendant_route_respects_include_children(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let docs = create_page(&pool, &token, "docs").await;
    create_page(&pool, &token, "docs/install").await;
    create_page(&pool, &token, "other").await;

    let tree = issue(&pool, &token, docs, json!({ "include_children": true })).await;
    let single = issue(&pool, &token, docs, json!({})).await;
    let tree_token = tree["token"].as_str().unwrap();
    let single_token = single["token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = get_from_ip(app, &format!("/s/{tree_token}/docs/install"), "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"]["slug"], "docs/install");
    assert_eq!(json["data"]["root_slug"], "docs");

    let app = common::build_test_app(pool.clone());
    let response = get_from_ip(app, &format!("/s/{tree_token}/other"), "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "SHARE_PAGE_NOT_ACCESSIBLE");

    let app = common::build_test_app(pool);
    let response =
        get_from_ip(app, &format!("/s/{single_token}/docs/install"), "10.0.0.1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---- Management ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_creator_or_admin_manage_links(pool: PgPool) {
    let (_, owner) = login_as(&pool, "ada", "editor").await;
    let (_, other) = login_as(&pool, "bob", "editor").await;
    let (_, admin) = login_as(&pool, "root", "admin").await;
    let page_id = create_page(&pool, &owner, "handbook").await;
    let issued = issue(&pool, &owner, page_id, json!({})).await;
    let link_uri = format!("/api/v1/share-links/{}", issued["link"]["id"]);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &link_uri, &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/share-links", &other).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/share-links", &admin).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &link_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/share-links/mine", &owner).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn access_history_lists_visits(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page_id = create_page(&pool, &token, "handbook").await;
    let issued = issue(&pool, &token, page_id, json!({})).await;
    let uri = format!("/s/{}", issued["token"].as_str().unwrap());

    for ip in ["10.0.0.1", "10.0.0.2"] {
        let app = common::build_test_app(pool.clone());
        assert_eq!(get_from_ip(app, &uri, ip).await.status(), StatusCode::OK);
    }

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/share-links/{}/accesses", issued["link"]["id"]),
        &token,
    )
    .await;
    let json = body_json(response).await;
    let accesses = json["data"].as_array().unwrap();
    assert_eq!(accesses.len(), 2);
    assert_eq!(accesses[0]["ip_address"], "10.0.0.2");
    assert_eq!(accesses[0]["user_agent"], "canopy-test");
}
