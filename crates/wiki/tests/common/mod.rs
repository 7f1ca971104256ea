#![allow(dead_code)]

use canopy_core::types::DbId;
use canopy_db::models::page::{CreatePage, Page};
use canopy_db::models::user::CreateUser;
use canopy_db::repositories::UserRepo;
use canopy_wiki::Wiki;
use sqlx::PgPool;

pub async fn user(pool: &PgPool, username: &str, role: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: username.to_string(),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn editor(pool: &PgPool) -> DbId {
    user(pool, "editor", "editor").await
}

pub async fn page(wiki: &Wiki, author: DbId, slug: &str, content: &str) -> Page {
    wiki.create_page(
        author,
        &CreatePage {
            slug: Some(slug.to_string()),
            title: slug.rsplit('/').next().unwrap_or(slug).to_string(),
            content: content.to_string(),
            is_published: Some(true),
            tags: Vec::new(),
        },
    )
    .await
    .unwrap()
}
