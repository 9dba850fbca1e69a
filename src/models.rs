use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowKind {
    Movie,
    Series,
}

impl ShowKind {
    /// Path segment used by the metadata provider for this kind.
    pub fn tmdb_segment(&self) -> &'static str {
        match self {
            ShowKind::Movie => "movie",
            ShowKind::Series => "tv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShowKind::Movie => "movie",
            ShowKind::Series => "series",
        }
    }
}

impl fmt::Display for ShowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummary {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub original_language: String,
    pub kind: ShowKind,
}

impl ShowSummary {
    /// Full poster URL, or an empty string when the provider has no poster.
    pub fn poster_url(&self) -> String {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{POSTER_BASE}{p}"))
            .unwrap_or_default()
    }
}

/// Result of one metadata fetch. Each kind keeps its own list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowListing {
    pub movies: Vec<ShowSummary>,
    pub series: Vec<ShowSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularityRecord {
    pub search_term: String,
    pub count: u64,
    pub show_id: u64,
    pub kind: ShowKind,
    pub poster_url: String,
}

/// True when the term selects discover mode instead of search mode.
pub fn is_blank(term: &str) -> bool {
    term.trim().is_empty()
}
