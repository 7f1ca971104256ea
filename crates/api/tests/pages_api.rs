//! HTTP-level tests for page, revision and search endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, get_auth, login_as, post_auth, post_json_auth, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;

// ---- Helpers ----

async fn create(pool: &PgPool, token: &str, slug: &str, content: &str) -> serde_json::Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/pages",
        token,
        json!({ "slug": slug, "title": slug, "content": content, "is_published": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---- Auth ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn pages_require_bearer_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/pages").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn viewer_cannot_create_pages(pool: PgPool) {
    let (_, token) = login_as(&pool, "reader", "viewer").await;
    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/pages", &token, json!({ "title": "Nope" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---- CRUD ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_fetch_by_slug(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let created = create(&pool, &token, "Guides/Getting Started", "# Intro").await;
    assert_eq!(created["slug"], "guides/getting-started");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/pages/by-slug/GUIDES/getting-started", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], created["id"]);
    assert_eq!(json["data"]["breadcrumbs"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["toc"][0]["id"], "intro");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_slug_is_conflict(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    create(&pool, &token, "docs", "").await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/pages",
        &token,
        json!({ "slug": "Docs", "title": "Docs again" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "SLUG_CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_title_is_bad_request(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/api/v1/pages", &token, json!({ "title": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TITLE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rename_reports_cascade(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let linux = create(&pool, &token, "linux", "").await;
    create(&pool, &token, "linux/ubuntu", "").await;

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/pages/{}", linux["id"]),
        &token,
        json!({ "slug": "commands/linux" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"]["slug"], "commands/linux");
    let changes = json["data"]["slug_changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["old_slug"], "linux/ubuntu");
    assert_eq!(changes[0]["new_slug"], "commands/linux/ubuntu");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_subtree(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let docs = create(&pool, &token, "docs", "").await;
    let child = create(&pool, &token, "docs/install", "").await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/pages/{}", docs["id"]), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["removed"].as_array().unwrap().len(), 2);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/pages/{}", child["id"]), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---- Hierarchy ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn children_and_tree_reflect_hierarchy(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    create(&pool, &token, "a/b", "").await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/pages/tree", &token).await;
    let json = body_json(response).await;
    let roots = json["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["slug"], "a");
    assert_eq!(roots[0]["children"][0]["slug"], "a/b");

    let parent_id = roots[0]["id"].as_i64().unwrap();
    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/pages/{parent_id}/children"), &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["slug"], "a/b");
}

// ---- Revisions ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn revert_restores_old_content(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let page = create(&pool, &token, "notes", "first").await;
    let page_uri = format!("/api/v1/pages/{}", page["id"]);

    let app = common::build_test_app(pool.clone());
    put_json_auth(app, &page_uri, &token, json!({ "content": "second" })).await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &format!("{page_uri}/revisions"), &token).await;
    let json = body_json(response).await;
    let revisions = json["data"].as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    let initial = revisions.last().unwrap()["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/revisions/{initial}/revert"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["page"]["content"], "first");

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("{page_uri}/revisions"), &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

// ---- Search ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_and_tags(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        "/api/v1/pages",
        &token,
        json!({
            "title": "Kernel tuning",
            "content": "Adjust the scheduler",
            "is_published": true,
            "tags": ["linux"]
        }),
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/search?q=scheduler", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["slug"], "kernel-tuning");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/search?q=x&strategy=bogus", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/tags", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["name"], "linux");
    assert_eq!(json["data"][0]["page_count"], 1);
}

// ---- Links, stats, import ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_backlinks_and_stats(pool: PgPool) {
    let (_, token) = login_as(&pool, "ada", "editor").await;
    let target = create(&pool, &token, "linux", "The kernel").await;
    create(&pool, &token, "distros", "Built on [[Linux]]").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/pages/import",
        &token,
        json!({
            "filename": "setup.md",
            "content": "---\ntitle: Setup\nslug: linux/setup\n---\nSee [[linux]]",
            "is_published": true
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let imported = body_json(response).await["data"].clone();
    assert_eq!(imported["slug"], "linux/setup");
    assert_eq!(imported["parent_id"], target["id"]);

    let app = common::build_test_app(pool.clone());
    let uri = format!("/api/v1/pages/{}/backlinks", target["id"]);
    let json = body_json(get_auth(app, &uri, &token).await).await;
    let slugs: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["distros", "linux/setup"]);

    let app = common::build_test_app(pool);
    let json = body_json(get_auth(app, "/api/v1/stats", &token).await).await;
    assert_eq!(json["data"]["page_count"], 3);
    assert_eq!(json["data"]["user_count"], 1);
}
