//! Long-running background task that polls the Soroban RPC and writes
//! decoded crowdfund events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where the next poll starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub ledger: u32,
    pub cursor: Option<String>,
}

impl Position {
    /// Resume from a persisted ledger, or from `start_ledger` on a fresh database.
    pub fn resume(saved_ledger: i64, cursor: Option<String>, start_ledger: u32) -> Self {
        let ledger = u32::try_from(saved_ledger)
            .ok()
            .filter(|l| *l > 0)
            .unwrap_or(start_ledger);
        Self { ledger, cursor }
    }

    /// Next position after a page ending at `latest_ledger`.
    ///
    /// With a pagination cursor the ledger stays put so the next call
    /// continues inside the same range; the ledger never moves backwards.
    pub fn advance(&self, latest_ledger: Option<u64>, cursor: Option<String>) -> Self {
        let ledger = latest_ledger
            .and_then(|l| u32::try_from(l).ok())
            .map_or(self.ledger, |l| l.max(self.ledger));
        Self { ledger, cursor }
    }
}

/// Run the indexer loop forever; spawned as a background [`tokio`] task.
pub async fn run(state: Arc<IndexerState>) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    let last_ledger = db::get_last_ledger(&state.pool).await.unwrap_or(0);
    let cursor = db::get_cursor_string(&state.pool).await.unwrap_or(None);
    let mut position = Position::resume(last_ledger, cursor, state.config.start_ledger);

    info!("Resuming from ledger {}", position.ledger);

    loop {
        match poll_once(&state.pool, &state.client, &state.config, &position).await {
            Ok(next) => position = next,
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)).await;
    }
}

/// Perform a single poll iteration and return the next position.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    position: &Position,
) -> crate::errors::Result<Position> {
    let page = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        position.ledger,
        position.cursor.as_deref(),
        config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &config.contract_id);
        let inserted = db::insert_events(pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} new records stored",
            page.events.len(),
            inserted
        );
    }

    let next = position.advance(page.latest_ledger, page.cursor);

    // Persist so restarts are deterministic.
    db::save_cursor(pool, i64::from(next.ledger), next.cursor.as_deref()).await?;

    Ok(next)
}
