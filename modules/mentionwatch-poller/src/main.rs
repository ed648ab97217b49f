use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chirper_client::ChirperClient;
use mentionwatch_common::{Config, SearchQuery};
use mentionwatch_poller::{FileSessionStore, PollLoop, SessionManager};
use mentionwatch_store::PgMentionSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mentionwatch_poller=info".parse()?),
        )
        .init();

    info!("MentionWatch poller starting...");

    // Load config — any missing variable is fatal here, with one
    // aggregate error naming all of them.
    let config = Config::from_env()?;
    config.log_redacted();

    // Connect to Postgres
    let pool = mentionwatch_store::connect(&config.database_url())
        .await
        .context("Failed to connect to Postgres")?;

    // Auto-create schema in develop only
    if config.is_develop() {
        mentionwatch_store::migrate(&pool)
            .await
            .context("Schema migration failed")?;
    }

    // Establish a session: restore from cache if live, else login
    let client = ChirperClient::with_base_url(&config.chirper_base_url);
    let session_store = FileSessionStore::new(&config.session_dir);
    let manager = SessionManager::new(
        client,
        session_store,
        &config.chirper_username,
        &config.chirper_password,
        &config.chirper_otp,
    );
    let client = manager.establish().await?;

    // Stop flag, set on Ctrl-C, honored at cycle boundaries and
    // during the sleep
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping after current cycle");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let query = SearchQuery::new(&config.query, config.page_size);
    let poll = PollLoop::new(
        client,
        PgMentionSink::new(pool),
        query,
        Duration::from_secs(config.poll_interval_secs),
    );

    let stats = poll.run(stop).await?;
    info!("{stats}");

    Ok(())
}
