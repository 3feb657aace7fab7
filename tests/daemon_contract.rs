//! Exercises the daemon client against a small in-process HTTP stand-in
//! speaking the daemon's wire contract.

use std::net::SocketAddr;
use std::sync::mpsc;

use axum::Router;
use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use serde_json::{Value, json};

use modelman::daemon::{DaemonClient, PullEvent};
use modelman::error::{FlowError, flow_error};

const KNOWN_MODEL: &str = "llama3:8b";

async fn tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": KNOWN_MODEL,
            "digest": "sha256:0ff3112a",
            "size": 4_700_000_000u64,
            "modified_at": "2026-08-20T10:00:00Z",
            "details": {
                "format": "gguf",
                "family": "llama",
                "families": ["llama"],
                "parameter_size": "8.0B",
                "quantization_level": "Q4_0"
            }
        }]
    }))
}

async fn ps() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": KNOWN_MODEL,
            "size": 1000u64,
            "size_vram": 750u64,
            "expires_at": "2026-08-27T12:00:00Z",
            "details": { "parameter_size": "8.0B" }
        }]
    }))
}

async fn delete_model(Json(body): Json<Value>) -> StatusCode {
    if body["name"] == KNOWN_MODEL {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn generate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["keep_alive"].is_i64() && body["stream"] == false {
        (StatusCode::OK, Json(json!({ "done": true })))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({})))
    }
}

async fn pull(Json(body): Json<Value>) -> String {
    assert!(body["name"].is_string());
    [
        json!({ "status": "pulling manifest" }),
        json!({ "status": "pulling 0ff3112a", "digest": "sha256:0ff3112a", "total": 100, "completed": 40 }),
        json!({ "status": "pulling 0ff3112a", "digest": "sha256:0ff3112a", "total": 100, "completed": 100 }),
        json!({ "status": "verifying sha256 digest" }),
        json!({ "status": "success" }),
    ]
    .map(|v| v.to_string())
    .join("\n")
}

/// Bind on an ephemeral port, serve the daemon contract on a background
/// thread, and hand the address back.
fn spawn_daemon() -> SocketAddr {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let app = Router::new()
                .route("/api/tags", get(tags))
                .route("/api/ps", get(ps))
                .route("/api/delete", delete(delete_model))
                .route("/api/generate", post(generate))
                .route("/api/pull", post(pull));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

fn client() -> DaemonClient {
    let addr = spawn_daemon();
    DaemonClient::new(&format!("http://{addr}")).unwrap()
}

#[test]
fn ping_succeeds_against_a_live_daemon() {
    client().ping().unwrap();
}

#[test]
fn installed_models_parse_with_details() {
    let models = client().list_installed().unwrap();
    assert_eq!(models.len(), 1);

    let m = &models[0];
    assert_eq!(m.name, KNOWN_MODEL);
    assert_eq!(m.size, 4_700_000_000);
    assert_eq!(m.details.quantization_level, "Q4_0");
    assert!(!m.details.is_multimodal());
}

#[test]
fn running_models_parse_with_memory_split() {
    let models = client().list_running().unwrap();
    assert_eq!(models.len(), 1);

    let m = &models[0];
    assert_eq!(m.name, KNOWN_MODEL);
    assert_eq!(m.vram_percent(), 75.0);
    assert_eq!(m.cpu_percent(), 25.0);
}

#[test]
fn pull_events_arrive_in_order_and_end_in_success() {
    let events: Vec<PullEvent> = client().start_pull(KNOWN_MODEL).iter().collect();
    assert_eq!(events.len(), 5);

    let statuses: Vec<String> = events
        .iter()
        .map(|e| match e {
            PullEvent::Progress(u) => u.status.clone(),
            PullEvent::Failed(msg) => panic!("unexpected failure: {msg}"),
        })
        .collect();
    assert_eq!(statuses[0], "pulling manifest");
    assert_eq!(statuses[4], "success");

    let PullEvent::Progress(mid) = &events[2] else {
        panic!("expected progress");
    };
    assert_eq!(mid.completed, 100);
    assert_eq!(mid.total, 100);
}

#[test]
fn deleting_a_known_model_succeeds() {
    client().delete(KNOWN_MODEL).unwrap();
}

#[test]
fn deleting_an_unknown_model_is_the_not_found_condition() {
    let err = client().delete("missing:latest").unwrap_err();
    assert_eq!(
        flow_error(&err),
        Some(&FlowError::ModelNotFound("missing:latest".into()))
    );
}

#[test]
fn keep_alive_posts_an_accepted_request() {
    let c = client();
    c.keep_alive(KNOWN_MODEL, -1).unwrap();
    c.keep_alive(KNOWN_MODEL, 0).unwrap();
}
