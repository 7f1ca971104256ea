mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use canopy_core::error::CoreError;
use canopy_core::share::{ShareDenial, ShareLinkStatus};
use canopy_db::models::share_link::CreateShareLink;
use canopy_db::repositories::ShareLinkRepo;
use canopy_wiki::{AccessRecorder, AccessSink, Actor, Wiki, WikiError};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use common::{editor, page, user};

const UA: &str = "Mozilla/5.0";

// ---- Helpers ----

fn link_input(include_children: bool) -> CreateShareLink {
    CreateShareLink {
        include_children,
        ..Default::default()
    }
}

// ---- Issue ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn issue_then_validate_counts_one_view(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "hello").await;

    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();
    assert_ne!(issued.token, issued.link.token_hash);

    let shared = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shared.page.id, target.id);
    assert!(shared.children.is_empty());

    let link = ShareLinkRepo::find_by_id(&pool, issued.link.id).await.unwrap().unwrap();
    assert_eq!(link.view_count, 1);
    let stats = wiki
        .share_link_stats(link.id, &Actor::new(author, "editor"))
        .await
        .unwrap();
    assert_eq!(stats.total_views, 1);
    assert_eq!(stats.unique_ips, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn issue_rejects_bad_quota_and_missing_page(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;

    let err = wiki
        .issue_share_link(
            target.id,
            author,
            &CreateShareLink {
                max_views: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::Validation(_)));

    let err = wiki
        .issue_share_link(
            target.id,
            author,
            &CreateShareLink {
                expires_in: Some("soon".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::Validation(_)));

    let err = wiki
        .issue_share_link(9999, author, &link_input(false))
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::NotFound { entity: "page", .. }));
}

// ---- Validation ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_token_is_not_found(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());

    let err = wiki
        .validate_and_record("definitely-not-a-token", "10.0.0.1", UA, None)
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::NotFoundByKey { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn view_quota_denies_third_access(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(
            target.id,
            author,
            &CreateShareLink {
                max_views: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for _ in 0..2 {
        wiki.validate_and_record(&issued.token, "10.0.0.1", UA, None)
            .await
            .unwrap()
            .unwrap();
    }
    let third = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap();
    assert_matches!(third, Err(ShareDenial::ViewLimitReached));

    let link = ShareLinkRepo::find_by_id(&pool, issued.link.id).await.unwrap().unwrap();
    assert_eq!(link.view_count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_ip_quota_admits_known_ip_only(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(
            target.id,
            author,
            &CreateShareLink {
                max_unique_ips: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    wiki.validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap()
        .unwrap();
    let other = wiki
        .validate_and_record(&issued.token, "10.0.0.2", UA, None)
        .await
        .unwrap();
    assert_matches!(other, Err(ShareDenial::IpLimitReached));

    wiki.validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap()
        .unwrap();

    let view = wiki
        .get_share_link(issued.link.id, &Actor::new(author, "editor"))
        .await
        .unwrap();
    assert_eq!(view.link.unique_ips, 1);
    assert_eq!(view.status, ShareLinkStatus::IpLimitReached);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoked_link_is_denied(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();

    wiki.revoke_share_link(issued.link.id, &Actor::new(author, "editor"))
        .await
        .unwrap();

    let result = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap();
    assert_matches!(result, Err(ShareDenial::Revoked));

    let view = wiki
        .get_share_link(issued.link.id, &Actor::new(author, "editor"))
        .await
        .unwrap();
    assert_eq!(view.status, ShareLinkStatus::Revoked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_link_is_denied(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();

    sqlx::query("UPDATE share_links SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(issued.link.id)
        .execute(&pool)
        .await
        .unwrap();

    let result = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap();
    assert_matches!(result, Err(ShareDenial::Expired));
}

// ---- Scope ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn include_children_admits_descendants_only(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let root = page(&wiki, author, "docs", "").await;
    let child = page(&wiki, author, "docs/install", "").await;
    page(&wiki, author, "docs-old", "").await;
    page(&wiki, author, "other", "").await;

    let issued = wiki
        .issue_share_link(root.id, author, &link_input(true))
        .await
        .unwrap();

    let shared = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shared.children.len(), 1);
    assert_eq!(shared.children[0].id, child.id);

    let shared = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, Some("Docs/Install"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shared.page.id, child.id);
    assert_eq!(shared.root_slug, "docs");

    for outside in ["other", "docs-old", "missing"] {
        let denied = wiki
            .validate_and_record(&issued.token, "10.0.0.1", UA, Some(outside))
            .await
            .unwrap();
        assert_matches!(denied, Err(ShareDenial::PageNotAccessible));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn single_page_link_denies_children(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let root = page(&wiki, author, "docs", "").await;
    page(&wiki, author, "docs/install", "").await;

    let issued = wiki
        .issue_share_link(root.id, author, &link_input(false))
        .await
        .unwrap();

    let denied = wiki
        .validate_and_record(&issued.token, "10.0.0.1", UA, Some("docs/install"))
        .await
        .unwrap();
    assert_matches!(denied, Err(ShareDenial::PageNotAccessible));

    let link = ShareLinkRepo::find_by_id(&pool, issued.link.id).await.unwrap().unwrap();
    assert_eq!(link.view_count, 0);
}

// ---- Management ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_creator_or_admin_manages_link(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let stranger = user(&pool, "stranger", "editor").await;
    let admin = user(&pool, "root", "admin").await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();

    let err = wiki
        .revoke_share_link(issued.link.id, &Actor::new(stranger, "editor"))
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::Forbidden(_)));

    let err = wiki
        .list_all_share_links(&Actor::new(stranger, "editor"), 20, 0)
        .await
        .unwrap_err();
    assert_matches!(err, WikiError::Core(CoreError::Forbidden(_)));

    let all = wiki
        .list_all_share_links(&Actor::new(admin, "admin"), 20, 0)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, ShareLinkStatus::Active);

    wiki.delete_share_link(issued.link.id, &Actor::new(admin, "admin"))
        .await
        .unwrap();
    assert!(wiki.list_share_links_for_page(target.id).await.unwrap().is_empty());
    assert!(wiki.list_share_links_for_user(author).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn access_history_is_listed_newest_first(pool: PgPool) {
    let wiki = Wiki::new(pool.clone());
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();

    for ip in ["10.0.0.1", "10.0.0.2"] {
        wiki.validate_and_record(&issued.token, ip, UA, None)
            .await
            .unwrap()
            .unwrap();
    }

    let accesses = wiki
        .list_share_accesses(issued.link.id, &Actor::new(author, "editor"), 20, 0)
        .await
        .unwrap();
    assert_eq!(accesses.len(), 2);
    assert_eq!(accesses[0].ip_address, "10.0.0.2");
    assert_eq!(accesses[0].user_agent, UA);
}

// ---- Queued recording ----

#[sqlx::test(migrations = "../../db/migrations")]
async fn queued_recorder_persists_after_shutdown(pool: PgPool) {
    let cancel = CancellationToken::new();
    let (handle, task) = AccessRecorder::spawn(pool.clone(), 16, cancel.clone());
    let wiki = Wiki::new(pool.clone()).with_access_sink(AccessSink::Queued(handle));
    let author = editor(&pool).await;
    let target = page(&wiki, author, "handbook", "").await;
    let issued = wiki
        .issue_share_link(target.id, author, &link_input(false))
        .await
        .unwrap();

    for _ in 0..3 {
        wiki.validate_and_record(&issued.token, "10.0.0.1", UA, None)
            .await
            .unwrap()
            .unwrap();
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    let link = ShareLinkRepo::find_by_id(&pool, issued.link.id).await.unwrap().unwrap();
    assert_eq!(link.view_count, 3);
}
