//! Search cycle orchestration: committed term -> metadata fetch -> view state -> hit recording.

use crate::error::FetchError;
use crate::models::{is_blank, PopularityRecord, ShowListing, ShowSummary};
use crate::store::PopularityStore;
use crate::tmdb::TmdbApi;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub phase: Phase,
    pub committed_term: String,
    pub is_loading: bool,
    pub error_message: String,
    pub movie_list: Vec<ShowSummary>,
    pub series_list: Vec<ShowSummary>,
    pub trending_shows: Vec<PopularityRecord>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            committed_term: String::new(),
            is_loading: false,
            error_message: String::new(),
            movie_list: Vec::new(),
            series_list: Vec::new(),
            trending_shows: Vec::new(),
        }
    }
}

/// How a single cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Success { hits_recorded: usize },
    Failed,
    /// A newer term was committed while this one was in flight.
    Superseded,
}

pub struct Pipeline {
    tmdb: Arc<dyn TmdbApi>,
    store: Arc<dyn PopularityStore>,
    state: watch::Sender<ViewState>,
    generation: AtomicU64,
}

impl Pipeline {
    pub fn new(tmdb: Arc<dyn TmdbApi>, store: Arc<dyn PopularityStore>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            tmdb,
            store,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Loads the trending snapshot once. Store failures leave the list empty.
    pub async fn load_trending(&self, limit: usize) {
        let shows = match self.store.top_trending(limit).await {
            Ok(shows) => shows,
            Err(e) => {
                warn!("Error fetching trending shows: {}", e);
                Vec::new()
            }
        };
        info!("Loaded {} trending shows", shows.len());
        self.state.send_modify(|s| s.trending_shows = shows);
    }

    /// Runs one search cycle for `term`. Results of a cycle that has been overtaken by a
    /// later call are dropped without touching the view state or the store.
    pub async fn process(&self, term: &str) -> CycleOutcome {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.phase = Phase::Loading;
            s.is_loading = true;
            s.error_message.clear();
            s.committed_term = term.to_string();
        });
        debug!(term = %term, generation, "Search cycle started");

        let result = self.tmdb.fetch_shows(term).await;

        match result {
            Ok(listing) => {
                if !self.publish_success(generation, term, listing.clone()) {
                    return self.superseded(term, generation);
                }
                let hits_recorded = if is_blank(term) {
                    0
                } else {
                    self.record_hits(term, &listing).await
                };
                CycleOutcome::Success { hits_recorded }
            }
            Err(e) => {
                if !self.publish_failure(generation, term, &e) {
                    return self.superseded(term, generation);
                }
                CycleOutcome::Failed
            }
        }
    }

    /// Runs cycles for every committed term until the channel closes. The current value
    /// is processed first so the startup query runs without waiting for input.
    pub async fn run(self: Arc<Self>, mut committed: watch::Receiver<String>) {
        let mut term = committed.borrow_and_update().clone();
        loop {
            let pipeline = self.clone();
            let cycle_term = term.clone();
            tokio::spawn(async move {
                pipeline.process(&cycle_term).await;
            });
            if committed.changed().await.is_err() {
                debug!("Committed term channel closed, stopping pipeline");
                return;
            }
            term = committed.borrow_and_update().clone();
            info!(term = %term, "Search term committed");
        }
    }

    fn superseded(&self, term: &str, generation: u64) -> CycleOutcome {
        debug!(term = %term, generation, "Discarding stale search results");
        CycleOutcome::Superseded
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Applies a successful listing unless a newer cycle has started. The generation is
    /// checked while the state lock is held.
    fn publish_success(&self, generation: u64, term: &str, listing: ShowListing) -> bool {
        let ShowListing { movies, series } = listing;
        let (movie_count, series_count) = (movies.len(), series.len());
        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.phase = Phase::Success;
            s.is_loading = false;
            s.error_message.clear();
            s.movie_list = movies;
            s.series_list = series;
            true
        });
        if applied {
            info!(
                term = %term,
                movies = movie_count,
                series = series_count,
                "Search cycle succeeded"
            );
        }
        applied
    }

    fn publish_failure(&self, generation: u64, term: &str, err: &FetchError) -> bool {
        error!(term = %term, "Error fetching shows: {}", err);
        let message = err.user_message().to_string();
        self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            s.phase = Phase::Error;
            s.is_loading = false;
            s.error_message = message;
            s.movie_list.clear();
            s.series_list.clear();
            true
        })
    }

    /// Records the first movie and the first series independently. Returns how many
    /// recordings succeeded.
    async fn record_hits(&self, term: &str, listing: &ShowListing) -> usize {
        let (movie, series) = tokio::join!(
            self.record_first(term, listing.movies.first()),
            self.record_first(term, listing.series.first()),
        );
        usize::from(movie) + usize::from(series)
    }

    async fn record_first(&self, term: &str, show: Option<&ShowSummary>) -> bool {
        let Some(show) = show else {
            return false;
        };
        match self.store.record_hit(term, show).await {
            Ok(()) => {
                debug!(term = %term, kind = %show.kind, show_id = show.id, "Recorded search hit");
                true
            }
            Err(e) => {
                warn!(term = %term, kind = %show.kind, "Failed to record search hit: {}", e);
                false
            }
        }
    }
}
