//! The driving loop: fetch → filter → sink, forever, at a fixed cadence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use chirper_client::SearchItem;
use mentionwatch_common::{MentionRecord, SearchQuery};
use mentionwatch_store::{InsertOutcome, MentionSink};

use crate::traits::SearchTransport;

/// Cap on the fetch-failure backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Granularity at which the sleep honors the stop flag.
const STOP_POLL_SLICE: Duration = Duration::from_millis(250);

/// Stats from a poll run.
#[derive(Debug, Default)]
pub struct PollStats {
    pub cycles: u64,
    pub items_seen: u64,
    pub items_errored: u64,
    pub items_already_known: u64,
    pub records_inserted: u64,
    pub fetch_failures: u64,
}

impl std::fmt::Display for PollStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Poll Run ===")?;
        writeln!(f, "Cycles:           {}", self.cycles)?;
        writeln!(f, "Items seen:       {}", self.items_seen)?;
        writeln!(f, "Items errored:    {}", self.items_errored)?;
        writeln!(f, "Already known:    {}", self.items_already_known)?;
        writeln!(f, "Records inserted: {}", self.records_inserted)?;
        writeln!(f, "Fetch failures:   {}", self.fetch_failures)?;
        Ok(())
    }
}

pub struct PollLoop<T, S> {
    transport: T,
    sink: S,
    query: SearchQuery,
    interval: Duration,
}

impl<T: SearchTransport, S: MentionSink> PollLoop<T, S> {
    pub fn new(transport: T, sink: S, query: SearchQuery, interval: Duration) -> Self {
        Self {
            transport,
            sink,
            query,
            interval,
        }
    }

    /// Run until `stop` is set. The flag is checked at the top of each
    /// cycle and during the sleep.
    ///
    /// Failure policy: a failed page fetch is transient — log, back off
    /// exponentially (capped at 5 minutes), keep going. A sink error is
    /// fatal and propagates.
    pub async fn run(&self, stop: Arc<AtomicBool>) -> Result<PollStats> {
        let mut stats = PollStats::default();
        let mut consecutive_failures = 0u32;

        while !stop.load(Ordering::Relaxed) {
            info!(cycle = stats.cycles, "Poll cycle starting");

            match self.transport.search_posts(&self.query).await {
                Ok(items) => {
                    consecutive_failures = 0;
                    self.ingest_page(items, &mut stats).await?;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    stats.fetch_failures += 1;
                    warn!(
                        error = %e,
                        consecutive_failures,
                        "Search page fetch failed, backing off"
                    );
                }
            }

            stats.cycles += 1;
            let delay = backoff_delay(self.interval, consecutive_failures);
            sleep_until_stopped(delay, &stop).await;
        }

        info!("Poll loop stopped. {stats}");
        Ok(stats)
    }

    /// Drain one page into the sink. Items carrying a provider-side
    /// error are dropped without touching the store.
    pub async fn ingest_page(
        &self,
        items: Vec<SearchItem>,
        stats: &mut PollStats,
    ) -> Result<()> {
        for item in items {
            stats.items_seen += 1;

            if let Some(err) = &item.error {
                debug!(post_id = item.id.as_str(), error = err.as_str(), "Skipping errored item");
                stats.items_errored += 1;
                continue;
            }

            if self.sink.exists(&item.id).await? {
                stats.items_already_known += 1;
                continue;
            }

            let record = MentionRecord::from_raw(
                item.id,
                item.user_id,
                item.username,
                item.timestamp,
                item.text,
            );
            info!(post_id = record.post_id.as_str(), "New mention");

            match self.sink.insert_if_absent(&record).await? {
                InsertOutcome::Inserted => stats.records_inserted += 1,
                // Lost a race with another writer — the invariant held.
                InsertOutcome::AlreadyExists => stats.items_already_known += 1,
            }
        }
        Ok(())
    }
}

fn backoff_delay(base: Duration, consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return base;
    }
    let exp = consecutive_failures.min(16);
    base.saturating_mul(2u32.saturating_pow(exp)).min(MAX_BACKOFF)
}

/// Sleep `total`, waking early if `stop` is set.
async fn sleep_until_stopped(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while remaining > Duration::ZERO && !stop.load(Ordering::Relaxed) {
        let slice = remaining.min(STOP_POLL_SLICE);
        tokio::time::sleep(slice).await;
        remaining = remaining.saturating_sub(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_flat_without_failures() {
        let base = Duration::from_secs(10);
        assert_eq!(backoff_delay(base, 0), base);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(10);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(20));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(40));
        assert_eq!(backoff_delay(base, 10), MAX_BACKOFF);
        assert_eq!(backoff_delay(base, 100), MAX_BACKOFF);
    }
}
