use super::{record_id, PopularityStore};
use crate::config::AppwriteConfig;
use crate::error::StoreError;
use crate::models::{PopularityRecord, ShowKind, ShowSummary};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const RESPONSE_FORMAT: &str = "1.7.0";

/// Popularity counters kept in an Appwrite document collection.
///
/// First hits create a document whose id is derived from the record key, so two racing
/// creates collide on the server (HTTP 409) and the loser falls back to the atomic
/// increment endpoint.
#[derive(Debug, Clone)]
pub struct AppwriteStore {
    client: Client,
    documents_url: String,
    project_id: String,
    api_key: Option<String>,
}

enum CreateOutcome {
    Created,
    AlreadyExists,
}

impl AppwriteStore {
    pub fn new(config: &AppwriteConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Appwrite HTTP client: {}", e))?;
        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            config.endpoint, config.database_id, config.collection_id
        );
        Ok(Self {
            client,
            documents_url,
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Response-Format", RESPONSE_FORMAT);
        match &self.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn list(&self, queries: &[Value]) -> Result<Vec<Document>, StoreError> {
        let query_string = queries
            .iter()
            .map(|q| format!("queries%5B%5D={}", urlencoding::encode(&q.to_string())))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{}", self.documents_url, query_string);
        let res = self.request(reqwest::Method::GET, &url).send().await?;
        let body = check_status(res, "list documents").await?;
        let parsed: DocumentList = serde_json::from_str(&body)
            .map_err(|e| StoreError::Unavailable(format!("list documents JSON: {}", e)))?;
        Ok(parsed.documents)
    }

    async fn find(&self, term: &str, kind: ShowKind) -> Result<Option<Document>, StoreError> {
        let docs = self
            .list(&[
                json!({"method": "equal", "attribute": "searchTerm", "values": [term]}),
                json!({"method": "limit", "values": [10]}),
            ])
            .await?;
        Ok(docs.into_iter().find(|d| d.kind() == Some(kind)))
    }

    async fn increment(&self, document_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}/count/increment", self.documents_url, document_id);
        let res = self
            .request(reqwest::Method::PATCH, &url)
            .json(&json!({ "value": 1 }))
            .send()
            .await?;
        check_status(res, "increment count").await?;
        Ok(())
    }

    async fn create(
        &self,
        document_id: &str,
        term: &str,
        show: &ShowSummary,
    ) -> Result<CreateOutcome, StoreError> {
        let body = json!({
            "documentId": document_id,
            "data": {
                "searchTerm": term,
                "count": 1,
                "kind": show.kind.as_str(),
                "show_id": show.id,
                "poster_url": show.poster_url(),
            }
        });
        let res = self
            .request(reqwest::Method::POST, &self.documents_url)
            .json(&body)
            .send()
            .await?;
        if res.status() == StatusCode::CONFLICT {
            return Ok(CreateOutcome::AlreadyExists);
        }
        check_status(res, "create document").await?;
        Ok(CreateOutcome::Created)
    }
}

#[async_trait]
impl PopularityStore for AppwriteStore {
    async fn record_hit(&self, term: &str, show: &ShowSummary) -> Result<(), StoreError> {
        if let Some(doc) = self.find(term, show.kind).await? {
            debug!(term = %term, kind = %show.kind, id = %doc.id, "Incrementing existing record");
            return self.increment(&doc.id).await;
        }

        let id = record_id(term, show.kind);
        match self.create(&id, term, show).await? {
            CreateOutcome::Created => {
                debug!(term = %term, kind = %show.kind, id = %id, "Created popularity record");
                Ok(())
            }
            CreateOutcome::AlreadyExists => {
                debug!(term = %term, kind = %show.kind, id = %id, "Lost create race, incrementing");
                self.increment(&id).await
            }
        }
    }

    async fn top_trending(&self, limit: usize) -> Result<Vec<PopularityRecord>, StoreError> {
        let docs = self
            .list(&[
                json!({"method": "limit", "values": [limit]}),
                json!({"method": "orderDesc", "attribute": "count"}),
            ])
            .await?;
        Ok(docs.into_iter().filter_map(Document::into_record).collect())
    }
}

async fn check_status(res: reqwest::Response, action: &str) -> Result<String, StoreError> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        return Err(StoreError::Unavailable(format!(
            "{} returned {}: {}",
            action, status, text
        )));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Stored document. Older documents carry `movie_id`/`series_id` instead of `kind` and
/// `show_id`; both layouts are read.
#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "searchTerm")]
    search_term: String,
    #[serde(default)]
    count: u64,
    kind: Option<ShowKind>,
    show_id: Option<u64>,
    movie_id: Option<u64>,
    series_id: Option<u64>,
    #[serde(default)]
    poster_url: Option<String>,
}

impl Document {
    fn kind(&self) -> Option<ShowKind> {
        self.kind.or(match (self.movie_id, self.series_id) {
            (Some(_), _) => Some(ShowKind::Movie),
            (None, Some(_)) => Some(ShowKind::Series),
            (None, None) => None,
        })
    }

    fn into_record(self) -> Option<PopularityRecord> {
        let kind = self.kind()?;
        let show_id = self.show_id.or(self.movie_id).or(self.series_id)?;
        Some(PopularityRecord {
            search_term: self.search_term,
            count: self.count,
            show_id,
            kind,
            poster_url: self.poster_url.unwrap_or_default(),
        })
    }
}
