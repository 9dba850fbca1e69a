//! Keyed hit counters for committed search terms.
//!
//! Records are keyed by `(search term, show kind)`: a search that resolves a movie and a
//! series bumps two separate records, and a record never switches the show it points to.

use crate::error::StoreError;
use crate::models::{PopularityRecord, ShowKind, ShowSummary};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

mod appwrite;
mod memory;

pub use appwrite::AppwriteStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait PopularityStore: Send + Sync {
    /// Increments the record for `(term, show.kind)`, creating it with a count of 1 when
    /// it does not exist yet. Concurrent first hits create exactly one record.
    async fn record_hit(&self, term: &str, show: &ShowSummary) -> Result<(), StoreError>;

    /// Up to `limit` records ordered by count, highest first.
    async fn top_trending(&self, limit: usize) -> Result<Vec<PopularityRecord>, StoreError>;
}

/// Stable document id for a record key, usable as an idempotent create target.
pub fn record_id(term: &str, kind: ShowKind) -> String {
    let digest = Sha256::digest(format!("{}:{}", kind.as_str(), term).as_bytes());
    hex::encode(digest)[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable_and_kind_scoped() {
        let a = record_id("batman", ShowKind::Movie);
        assert_eq!(a, record_id("batman", ShowKind::Movie));
        assert_ne!(a, record_id("batman", ShowKind::Series));
        assert_ne!(a, record_id("Batman", ShowKind::Movie));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
