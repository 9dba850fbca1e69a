use crate::config::TmdbConfig;
use crate::error::FetchError;
use crate::models::{is_blank, ShowKind, ShowListing, ShowSummary};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Fetches movies and series for `query`. An empty query switches to discover mode.
    async fn fetch_shows(&self, query: &str) -> Result<ShowListing, FetchError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let user_agent = format!("reelscout/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build TMDB HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, kind: ShowKind, query: &str) -> String {
        if is_blank(query) {
            format!(
                "{}/discover/{}?sort_by=popularity.desc",
                self.base_url,
                kind.tmdb_segment()
            )
        } else {
            format!(
                "{}/search/{}?query={}",
                self.base_url,
                kind.tmdb_segment(),
                urlencoding::encode(query)
            )
        }
    }

    /// Issues one listing request. Non-success statuses and unreadable bodies are
    /// network failures; the payload sentinel is checked by the caller.
    async fn get_listing(&self, kind: ShowKind, query: &str) -> Result<ListingResponse, FetchError> {
        let url = self.endpoint(kind, query);
        debug!(kind = %kind, url = %url, "Requesting TMDB listing");
        let res = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("{} request failed: {}", kind, e)))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("{} body read failed: {}", kind, e)))?;
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "{} request returned {}: {}",
                kind, status, text
            )));
        }
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Network(format!("{} JSON parse failed: {}", kind, e)))
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_shows(&self, query: &str) -> Result<ShowListing, FetchError> {
        let (movies, series) = tokio::join!(
            self.get_listing(ShowKind::Movie, query),
            self.get_listing(ShowKind::Series, query),
        );
        let (movies, series) = (movies?, series?);
        let movies = movies.into_shows(ShowKind::Movie)?;
        let series = series.into_shows(ShowKind::Series)?;
        Ok(ShowListing { movies, series })
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    results: Vec<RawShow>,
    #[serde(default)]
    response: Option<serde_json::Value>,
    #[serde(default, rename = "Error")]
    error: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    status_message: Option<String>,
}

impl ListingResponse {
    fn rejection(&self) -> Option<String> {
        let flagged = match &self.response {
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("false"),
            Some(serde_json::Value::Bool(b)) => !b,
            _ => false,
        };
        if flagged {
            return Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            );
        }
        if self.success == Some(false) {
            return Some(
                self.status_message
                    .clone()
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            );
        }
        None
    }

    fn into_shows(self, kind: ShowKind) -> Result<Vec<ShowSummary>, FetchError> {
        if let Some(reason) = self.rejection() {
            return Err(FetchError::ProviderRejected(format!("{}: {}", kind, reason)));
        }
        Ok(self
            .results
            .into_iter()
            .map(|raw| raw.into_summary(kind))
            .collect())
    }
}

/// Movie and TV payloads share this shape apart from the title and date field names.
#[derive(Debug, Deserialize)]
struct RawShow {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    original_language: String,
}

impl RawShow {
    fn into_summary(self, kind: ShowKind) -> ShowSummary {
        let (title, date) = match kind {
            ShowKind::Movie => (self.title.or(self.name), self.release_date),
            ShowKind::Series => (self.name.or(self.title), self.first_air_date),
        };
        ShowSummary {
            id: self.id,
            title: title.unwrap_or_default(),
            poster_path: self.poster_path,
            vote_average: self.vote_average,
            release_date: date.as_deref().and_then(parse_date),
            original_language: self.original_language,
            kind,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
