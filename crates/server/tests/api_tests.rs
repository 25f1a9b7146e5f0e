use metrics_exporter_prometheus::PrometheusBuilder;
use nimbusdb_core::hnsw::{HnswConfig, HnswIndex};
use nimbusdb_core::storage::WriteAheadLog;
use nimbusdb_server::api::create_router;
use nimbusdb_server::api::handlers::AppState;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

async fn spawn_app() -> (String, PathBuf, TempDir) {
    let tmp_dir = TempDir::new().expect("create temp dir");
    let wal_path = tmp_dir.path().join("nimbus.wal");

    let mut config = HnswConfig::default();
    config.level_seed = Some(42);
    let index = Arc::new(HnswIndex::new(config));
    let wal = Arc::new(WriteAheadLog::open(&wal_path).expect("open WAL"));

    // Only the first test in the process installs the global recorder.
    let prometheus_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(_) => PrometheusBuilder::new().build_recorder().handle(),
    };

    let state = AppState {
        index,
        wal,
        prometheus_handle,
        start_time: Instant::now(),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("http://{}", addr), wal_path, tmp_dir)
}

fn client() -> Client {
    Client::new()
}

async fn insert(base_url: &str, id: &str, vector: &[f32]) -> serde_json::Value {
    client()
        .post(format!("{base_url}/insert"))
        .json(&serde_json::json!({ "id": id, "vector": vector }))
        .send()
        .await
        .expect("send insert")
        .json()
        .await
        .expect("parse insert response")
}

#[tokio::test]
async fn insert_then_search_returns_the_vector() {
    let (base_url, _wal, _tmp) = spawn_app().await;

    let body = insert(&base_url, "a", &[1.0, 0.0, 0.0]).await;
    assert_eq!(body["success"], true);
    insert(&base_url, "b", &[0.0, 1.0, 0.0]).await;

    let resp: serde_json::Value = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({ "vector": [1.0, 0.1, 0.0], "k": 1 }))
        .send()
        .await
        .expect("send search")
        .json()
        .await
        .expect("parse search response");

    let matches = resp["matches"].as_array().expect("matches array");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["id"], "a");
    assert!(matches[0]["score"].as_f64().expect("score") > 0.9);
}

#[tokio::test]
async fn duplicate_insert_reports_error_in_body() {
    let (base_url, _wal, _tmp) = spawn_app().await;

    let first = insert(&base_url, "dup", &[1.0, 2.0]).await;
    assert_eq!(first["success"], true);

    let second = insert(&base_url, "dup", &[3.0, 4.0]).await;
    assert_eq!(second["success"], false);
    let message = second["error"].as_str().expect("error message");
    assert!(message.contains("already exists"), "got: {message}");
}

#[tokio::test]
async fn invalid_vectors_fail_in_body_not_transport() {
    let (base_url, _wal, _tmp) = spawn_app().await;

    let resp = client()
        .post(format!("{base_url}/insert"))
        .json(&serde_json::json!({ "id": "empty", "vector": [] }))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("parse");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "empty vector");

    let body = insert(&base_url, "zero", &[0.0, 0.0]).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn search_validation_is_transport_level() {
    let (base_url, _wal, _tmp) = spawn_app().await;

    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({ "vector": [1.0, 0.0], "k": 0 }))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 400);

    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({ "vector": [0.0, 0.0], "k": 1 }))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn search_on_empty_index_returns_no_matches() {
    let (base_url, _wal, _tmp) = spawn_app().await;

    let resp: serde_json::Value = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({ "vector": [1.0, 0.0], "k": 5 }))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("parse");
    assert_eq!(resp["matches"].as_array().expect("matches").len(), 0);
}

#[tokio::test]
async fn wal_replay_restores_inserted_vectors() {
    let (base_url, wal_path, _tmp) = spawn_app().await;

    insert(&base_url, "persist_1", &[1.0, 0.0, 0.0]).await;
    insert(&base_url, "persist_2", &[0.0, 1.0, 0.0]).await;

    // Simulate a restart: a fresh index rehydrated from the same log.
    let mut config = HnswConfig::default();
    config.level_seed = Some(42);
    let recovered = HnswIndex::new(config);
    let wal = WriteAheadLog::open(&wal_path).expect("reopen WAL");
    let stats = wal
        .replay(|id, v| {
            recovered.insert(id, &v).expect("replay insert");
        })
        .expect("replay");

    assert_eq!(stats.records, 2);
    assert_eq!(recovered.len(), 2);
    let results = recovered.search(&[1.0, 0.0, 0.0], 1).expect("search");
    assert_eq!(results[0].id, "persist_1");
    assert!(results[0].score >= 0.999);
}

#[tokio::test]
async fn health_reports_vector_count() {
    let (base_url, _wal, _tmp) = spawn_app().await;
    insert(&base_url, "h1", &[1.0, 1.0]).await;

    let resp: serde_json::Value = client()
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("parse");
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["vectors"], 1);
    assert!(resp["wal_size_bytes"].as_u64().expect("wal size") > 0);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let (base_url, _wal, _tmp) = spawn_app().await;
    insert(&base_url, "m1", &[1.0, 0.0]).await;

    let resp = client()
        .get(format!("{base_url}/metrics"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), 200);
}
