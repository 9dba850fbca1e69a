use super::PopularityStore;
use crate::error::StoreError;
use crate::models::{PopularityRecord, ShowKind, ShowSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local store. The lock makes lookup-then-create a single step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, ShowKind), PopularityRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PopularityRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| ((r.search_term.clone(), r.kind), r))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    pub async fn get(&self, term: &str, kind: ShowKind) -> Option<PopularityRecord> {
        self.records
            .lock()
            .await
            .get(&(term.to_string(), kind))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl PopularityStore for MemoryStore {
    async fn record_hit(&self, term: &str, show: &ShowSummary) -> Result<(), StoreError> {
        let mut guard = self.records.lock().await;
        guard
            .entry((term.to_string(), show.kind))
            .and_modify(|r| r.count += 1)
            .or_insert_with(|| PopularityRecord {
                search_term: term.to_string(),
                count: 1,
                show_id: show.id,
                kind: show.kind,
                poster_url: show.poster_url(),
            });
        Ok(())
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<PopularityRecord>, StoreError> {
        let guard = self.records.lock().await;
        let mut records: Vec<PopularityRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.search_term.cmp(&b.search_term))
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });
        records.truncate(limit);
        Ok(records)
    }
}
