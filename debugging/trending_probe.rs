//! Print the current trending records from the configured popularity store.
//! Usage:
//!   cargo run --bin trending_probe -- [limit]
//! Uses the same environment as the server (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use reelscout::config::{Config, StoreConfig};
use reelscout::store::{AppwriteStore, PopularityStore};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let limit = match env::args().nth(1) {
        Some(raw) => raw.parse::<usize>().context("limit must be a number")?,
        None => config.trending_limit,
    };
    let StoreConfig::Appwrite(aw) = &config.store else {
        anyhow::bail!("trending_probe needs POPULARITY_BACKEND=appwrite");
    };

    let store = AppwriteStore::new(aw)?;
    let records = store
        .top_trending(limit)
        .await
        .context("Failed to query popularity store")?;

    for (rank, record) in records.iter().enumerate() {
        println!(
            "{:>2}. {:<30} {:>6}  {} #{}  {}",
            rank + 1,
            record.search_term,
            record.count,
            record.kind,
            record.show_id,
            record.poster_url
        );
    }
    Ok(())
}
