//! Run one movie + series fetch against TMDB and print both lists as pretty JSON.
//! Usage:
//!   cargo run --bin tmdb_probe                 (discover mode)
//!   cargo run --bin tmdb_probe -- <search term>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use reelscout::config::{TmdbConfig, DEFAULT_TMDB_BASE};
use reelscout::tmdb::{TmdbApi, TmdbClient};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let api_key = env::var("TMDB_API_KEY").context("Missing TMDB_API_KEY in environment")?;
    let base_url = env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE.to_string());
    let term = env::args().skip(1).collect::<Vec<_>>().join(" ");

    let client = TmdbClient::new(&TmdbConfig {
        api_key,
        base_url,
        timeout: Duration::from_secs(10),
    })?;
    let listing = client
        .fetch_shows(&term)
        .await
        .context("TMDB fetch failed")?;

    println!("# movies ({})", listing.movies.len());
    println!("{}", serde_json::to_string_pretty(&listing.movies)?);
    println!("# series ({})", listing.series.len());
    println!("{}", serde_json::to_string_pretty(&listing.series)?);
    Ok(())
}
