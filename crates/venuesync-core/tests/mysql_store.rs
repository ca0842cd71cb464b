use std::env;

use anyhow::Result;
use venuesync_core::config::{ImportOptions, TableNames};
use venuesync_core::db::{self, MySqlStore};
use venuesync_core::processor::{run_import, HOURS_META_KEY, LATITUDE_META_KEY};
use venuesync_core::store::VenueStore;
use venuesync_parser::RawRow;

#[tokio::test]
async fn upserts_against_mysql_when_database_available() -> Result<()> {
    let database_url = match env::var("VENUESYNC_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping mysql_store test because VENUESYNC_TEST_DATABASE_URL is not set");
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    let tables = TableNames::with_prefix("venuesync_test_")?;

    for statement in [
        format!("DROP TABLE IF EXISTS {}", tables.postmeta),
        format!("DROP TABLE IF EXISTS {}", tables.posts),
        format!(
            "CREATE TABLE {} (
                ID BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                post_title TEXT NOT NULL,
                post_content LONGTEXT NOT NULL,
                post_type VARCHAR(20) NOT NULL DEFAULT 'post'
            )",
            tables.posts
        ),
        format!(
            "CREATE TABLE {} (
                meta_id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                post_id BIGINT UNSIGNED NOT NULL DEFAULT 0,
                meta_key VARCHAR(255) NULL,
                meta_value LONGTEXT NULL
            )",
            tables.postmeta
        ),
    ] {
        sqlx::query(&statement).execute(&pool).await?;
    }

    sqlx::query(&format!(
        "INSERT INTO {} (post_title, post_content, post_type) VALUES (?, '', 'listing')",
        tables.posts
    ))
    .bind("Cafe X")
    .execute(&pool)
    .await?;

    let store = MySqlStore::new(pool.clone(), tables.clone(), Some("listing".to_string()));
    let row: RawRow = [
        ("Title", "Cafe X"),
        ("Open_Time_Monday", "9AM\u{2013}5PM"),
        ("Latitude", "1.23"),
    ]
    .into_iter()
    .collect();

    let result = async {
        run_import(&store, &[row.clone()], &ImportOptions::default()).await?;
        run_import(&store, &[row], &ImportOptions::default()).await
    }
    .await;

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE meta_key IN (?, ?)",
        tables.postmeta
    ))
    .bind(HOURS_META_KEY)
    .bind(LATITUDE_META_KEY)
    .fetch_one(&pool)
    .await?;

    store.close().await;

    let report = result?;
    assert_eq!(report.meta_updated, 2, "second run should update existing rows");
    assert_eq!(count, 2, "expected one row per metadata key");
    Ok(())
}
