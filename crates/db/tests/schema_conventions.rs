use sqlx::PgPool;

/// All `id` columns must be bigint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_bigint(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::text, data_type::text
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert_eq!(data_type, "bigint", "Table {table}.id should be bigint");
    }
}

/// Every table carries created_at and updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_tables_have_timestamps(pool: PgPool) {
    // One row per (table, timestamp column); NULL type when the column is missing.
    let found: Vec<(String, String, Option<String>)> = sqlx::query_as(
        "SELECT t.table_name::text, c.name, col.data_type::text
         FROM information_schema.tables t
         CROSS JOIN (VALUES ('created_at'), ('updated_at')) AS c(name)
         LEFT JOIN information_schema.columns col
           ON col.table_schema = t.table_schema
          AND col.table_name = t.table_name
          AND col.column_name = c.name
         WHERE t.table_schema = 'public'
           AND t.table_type = 'BASE TABLE'
           AND t.table_name != '_sqlx_migrations'
         ORDER BY 1, 2",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!found.is_empty());
    for (table, column, data_type) in &found {
        assert_eq!(
            data_type.as_deref(),
            Some("timestamp with time zone"),
            "{table}.{column} should exist as timestamptz"
        );
    }
}

/// TEXT is used instead of VARCHAR.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_no_varchar_columns(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::text, column_name::text
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND data_type = 'character varying'
           AND table_name != '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(rows.is_empty(), "Found varchar columns: {rows:?}");
}

/// The conflict detectors the service layer relies on exist by name.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_indexes_exist(pool: PgPool) {
    for name in ["uq_pages_slug_lower", "uq_tags_name_lower", "uq_share_links_token_hash"] {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM pg_indexes WHERE schemaname = 'public' AND indexname = $1)",
        )
        .bind(name)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(row.0, "missing index {name}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_check(pool: PgPool) {
    canopy_db::health_check(&pool).await.unwrap();
}
