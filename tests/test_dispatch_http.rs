//! Dispatcher against a real local HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinSet;

use judi_chat::backend::{Backend, HttpBackend};
use judi_chat::compose::Draft;
use judi_chat::consultation::Role;
use judi_chat::dispatch::Dispatcher;
use judi_chat::storage::MemoryStorage;
use judi_chat::store::{ConversationStore, Theme};

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn dispatcher(addr: SocketAddr) -> Dispatcher {
    let backend = HttpBackend::new(format!("http://{addr}/"), Some(5)).unwrap();
    Dispatcher::new(Backend::Http(backend))
}

fn store() -> ConversationStore {
    ConversationStore::load(Arc::new(MemoryStorage::new()), Theme::Light)
}

fn draft(text: &str) -> Draft {
    Draft { text: text.into(), attachments: Vec::new() }
}

fn analysis() -> Value {
    let laws: Vec<Value> = (1..=7)
        .map(|i| json!({"section": format!("{i}"), "act": "POCSO Act", "title": format!("Offence {i}")}))
        .collect();
    json!({
        "category": "sexual_harassment",
        "confidence": 0.87,
        "reason": "classified",
        "matched_categories": [
            {"category": "sexual_harassment", "confidence": 0.87},
            {"category": "cyber_harassment", "confidence": 0.42},
            {"category": "stalking", "confidence": 0.2}
        ],
        "laws": laws,
        "steps": ["Tell a trusted adult", "Save the messages"],
        "context": {"authority": "school_staff", "legal_framework": "POCSO", "age_indicator": "minor"}
    })
}

#[tokio::test]
async fn successful_reply_is_formatted_and_keeps_payload() {
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            assert!(body["message"].is_string());
            Json(analysis())
        }),
    );
    let addr = serve(router).await;
    let d = dispatcher(addr);
    let mut store = store();

    d.send(&mut store, draft("A coach at school sends me inappropriate messages"))
        .await
        .unwrap();

    let c = store.active().unwrap();
    assert_eq!(c.messages.len(), 2);
    let reply = &c.messages[1];
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.reply_to, Some(c.messages[0].id));
    assert!(reply.has_details());
    assert!(reply.text.contains("Legal Analysis: Sexual Harassment"));
    assert!(reply.text.contains("+2 more"));
    assert!(reply.text.contains("POCSO"));
    assert_eq!(reply.data.as_ref().unwrap().laws.len(), 7);
}

#[tokio::test]
async fn server_error_becomes_error_reply_without_payload() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "model not loaded"})))
        }),
    );
    let addr = serve(router).await;
    let d = dispatcher(addr);
    let mut store = store();

    d.send(&mut store, draft("hello")).await.unwrap();

    let reply = store.active().unwrap().messages.last().unwrap().clone();
    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.text.starts_with("⚠️ Sorry, I couldn't reach the legal analysis service."));
    assert!(reply.text.contains("HTTP 500"));
    assert!(reply.text.contains("model not loaded"));
    assert!(reply.data.is_none());
    assert!(!reply.has_details());
}

#[tokio::test]
async fn malformed_body_becomes_error_reply() {
    let router = Router::new().route("/chat", post(|| async { "definitely not json" }));
    let addr = serve(router).await;
    let d = dispatcher(addr);
    let mut store = store();

    d.send(&mut store, draft("hello")).await.unwrap();

    let reply = store.active().unwrap().messages.last().unwrap().clone();
    assert!(reply.text.contains("malformed response"));
    assert!(reply.data.is_none());
}

#[tokio::test]
async fn overlapping_requests_land_in_completion_order() {
    let router = Router::new().route(
        "/chat",
        post(|Json(body): Json<Value>| async move {
            let message = body["message"].as_str().unwrap_or_default().to_string();
            if message == "slow" {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Json(json!({"category": "threats", "confidence": 0.5, "steps": [message]}))
        }),
    );
    let addr = serve(router).await;
    let d = dispatcher(addr);
    let mut store = store();

    let slow = d.begin(&mut store, draft("slow")).unwrap();
    let fast = d.begin(&mut store, draft("fast")).unwrap();
    assert_eq!(slow.consultation_id, fast.consultation_id);
    let (slow_id, fast_id) = (slow.request_id, fast.request_id);

    let mut set = JoinSet::new();
    for pending in [slow, fast] {
        let d = d.clone();
        set.spawn(async move { d.fetch(pending).await });
    }
    while let Some(done) = set.join_next().await {
        d.complete(&mut store, done.unwrap()).unwrap();
    }

    let messages = &store.active().unwrap().messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].reply_to, Some(fast_id));
    assert_eq!(messages[3].reply_to, Some(slow_id));
    assert_eq!(messages[2].data.as_ref().unwrap().steps, vec!["fast".to_string()]);
    assert_eq!(messages[3].data.as_ref().unwrap().steps, vec!["slow".to_string()]);
}

#[tokio::test]
async fn health_probe_reads_status() {
    let router = Router::new().route(
        "/health",
        get(|| async {
            Json(json!({"status": "healthy", "model_loaded": true, "confidence_threshold": 0.35}))
        }),
    );
    let addr = serve(router).await;
    let health = dispatcher(addr).backend().health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.model_loaded);
    assert_eq!(health.confidence_threshold, Some(0.35));
}
