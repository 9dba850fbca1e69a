use reelscout::config::AppwriteConfig;
use reelscout::error::StoreError;
use reelscout::models::{ShowKind, ShowSummary};
use reelscout::store::{record_id, AppwriteStore, PopularityStore};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const DOCS: &str = "/databases/db/collections/metrics/documents";

fn store_for(server: &MockServer) -> AppwriteStore {
    AppwriteStore::new(&AppwriteConfig {
        endpoint: server.uri(),
        project_id: "project".to_string(),
        database_id: "db".to_string(),
        collection_id: "metrics".to_string(),
        api_key: Some("server-key".to_string()),
        timeout: Duration::from_secs(5),
    })
    .expect("store builds")
}

fn batman_movie() -> ShowSummary {
    ShowSummary {
        id: 1,
        title: "Batman".to_string(),
        poster_path: Some("/a.jpg".to_string()),
        vote_average: Some(7.2),
        release_date: None,
        original_language: "en".to_string(),
        kind: ShowKind::Movie,
    }
}

/// Parsed `queries[]` values of a list request.
fn queries(req: &Request) -> Vec<Value> {
    req.url
        .query_pairs()
        .filter(|(k, _)| *k == "queries[]")
        .filter_map(|(_, v)| serde_json::from_str(&v).ok())
        .collect()
}

fn has_query(expected: Value) -> impl Fn(&Request) -> bool + Send + Sync {
    move |req: &Request| queries(req).contains(&expected)
}

fn list_body(documents: Value) -> Value {
    let total = documents.as_array().map(|d| d.len()).unwrap_or(0);
    json!({ "total": total, "documents": documents })
}

#[tokio::test]
async fn first_hit_creates_document_with_derived_id() {
    let server = MockServer::start().await;
    let id = record_id("batman", ShowKind::Movie);
    Mock::given(method("GET"))
        .and(path(DOCS))
        .and(header("x-appwrite-project", "project"))
        .and(header("x-appwrite-key", "server-key"))
        .and(has_query(
            json!({"method": "equal", "attribute": "searchTerm", "values": ["batman"]}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DOCS))
        .and(body_partial_json(json!({
            "documentId": id,
            "data": {
                "searchTerm": "batman",
                "count": 1,
                "kind": "movie",
                "show_id": 1,
                "poster_url": "https://image.tmdb.org/t/p/w500/a.jpg"
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"$id": id})))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .record_hit("batman", &batman_movie())
        .await
        .unwrap();
}

#[tokio::test]
async fn existing_record_is_incremented() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([
            {"$id": "series-doc", "searchTerm": "batman", "count": 3, "kind": "series", "show_id": 2098},
            {"$id": "movie-doc", "searchTerm": "batman", "count": 1, "kind": "movie", "show_id": 1}
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCS}/movie-doc/count/increment")))
        .and(body_partial_json(json!({"value": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"$id": "movie-doc"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DOCS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    store_for(&server)
        .record_hit("batman", &batman_movie())
        .await
        .unwrap();
}

#[tokio::test]
async fn lost_create_race_degrades_to_increment() {
    let server = MockServer::start().await;
    let id = record_id("batman", ShowKind::Movie);
    Mock::given(method("GET"))
        .and(path(DOCS))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([]))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DOCS))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Document with the requested ID already exists.",
            "code": 409,
            "type": "document_already_exists"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCS}/{id}/count/increment")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"$id": id})))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .record_hit("batman", &batman_movie())
        .await
        .unwrap();
}

#[tokio::test]
async fn top_trending_requests_limit_and_descending_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS))
        .and(has_query(json!({"method": "limit", "values": [5]})))
        .and(has_query(json!({"method": "orderDesc", "attribute": "count"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(json!([
            {"$id": "a", "searchTerm": "dune", "count": 9, "kind": "movie", "show_id": 438631, "poster_url": "https://image.tmdb.org/t/p/w500/d.jpg"},
            {"$id": "b", "searchTerm": "office", "count": 4, "series_id": 2316, "poster_url": "https://image.tmdb.org/t/p/w500/o.jpg"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let records = store_for(&server).top_trending(5).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].search_term, "dune");
    assert_eq!(records[0].count, 9);
    assert_eq!(records[1].kind, ShowKind::Series);
    assert_eq!(records[1].show_id, 2316);
}

#[tokio::test]
async fn auth_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "The current user is not authorized to perform the requested action.",
            "code": 401
        })))
        .mount(&server)
        .await;

    let err = store_for(&server).top_trending(5).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    let err = store_for(&server)
        .record_hit("batman", &batman_movie())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
