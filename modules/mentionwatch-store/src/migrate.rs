use sqlx::PgPool;
use tracing::info;

/// Run idempotent schema migrations. Only invoked when MW_ENV=develop;
/// production schemas are managed out of band.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running schema migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mentions (
            id UUID PRIMARY KEY,
            post_id TEXT NOT NULL UNIQUE,
            author_id TEXT NOT NULL,
            author_handle TEXT NOT NULL,
            posted_at TIMESTAMPTZ NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS mentions_posted_at_idx ON mentions (posted_at)")
        .execute(pool)
        .await?;

    info!("Schema migration complete");
    Ok(())
}
