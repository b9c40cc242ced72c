// End-to-end loads against an in-process backend

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use integration_hub::{
    render_view, CredentialStore, DateFormat, HttpBackend, IntegrationSession, LoadOutcome,
    ConnectContext, Provider, RenderView,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Reply {
    Records,
    Object,
    InvalidToken,
    PlainError,
    NotJson,
}

struct MockState {
    reply: Reply,
    hits: AtomicUsize,
    seen: Mutex<Vec<(String, Value)>>,
}

async fn load(
    State(state): State<Arc<MockState>>,
    Path(slug): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let credentials = form
        .get("credentials")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);
    state.seen.lock().unwrap().push((slug, credentials));

    match state.reply {
        Reply::Records => Json(json!([
            {"id": "101", "name": "Jane Doe", "type": "contact", "creation_time": "2024-03-15", "url": "https://app.hubspot.com/contacts/101"},
            {"id": "201", "name": "Acme Corp", "type": "company"},
            {"id": "301", "name": "Renewal", "type": "deal"},
            {"id": "401", "name": "Follow up", "type": "task"}
        ]))
        .into_response(),
        Reply::Object => Json(json!({"tables": ["Projects"], "count": 1})).into_response(),
        Reply::InvalidToken => {
            (StatusCode::BAD_REQUEST, Json(json!({"detail": "invalid token"}))).into_response()
        }
        Reply::PlainError => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        Reply::NotJson => (StatusCode::OK, "<html>ok</html>").into_response(),
    }
}

async fn spawn_backend(reply: Reply) -> (String, Arc<MockState>) {
    let state = Arc::new(MockState {
        reply,
        hits: AtomicUsize::new(0),
        seen: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/integrations/:slug/load", post(load))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn connected_session(provider: Provider) -> IntegrationSession {
    let mut store = CredentialStore::new();
    store.insert(provider, json!({"access_token": "tok-123"}));

    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(provider);
    session.connect(&store).unwrap();
    session
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_hubspot_load_groups_records() {
    let (url, state) = spawn_backend(Reply::Records).await;
    let mut session = connected_session(Provider::HubSpot);

    let outcome = session.load_with(&backend(&url)).await;

    assert_eq!(outcome, Some(LoadOutcome::Loaded));
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);

    let seen = state.seen.lock().unwrap();
    assert_eq!(seen[0].0, "hubspot");
    assert_eq!(seen[0].1, json!({"access_token": "tok-123"}));
    drop(seen);

    let view = render_view(session.payload(), session.provider(), &DateFormat::default());
    let RenderView::Grouped(grouped) = view else {
        panic!("expected grouped view");
    };
    let counts: Vec<usize> = grouped.totals.iter().map(|t| t.count).collect();
    assert_eq!(counts, vec![1, 1, 1]);
    assert_eq!(grouped.sections[0].entries[0].created.as_deref(), Some("3/15/2024"));
    // the task record is only visible in the raw JSON
    assert!(grouped.raw.text.contains("Follow up"));
}

#[tokio::test]
async fn test_backend_detail_is_shown_and_data_stays_absent() {
    let (url, state) = spawn_backend(Reply::InvalidToken).await;
    let mut session = connected_session(Provider::HubSpot);

    let outcome = session.load_with(&backend(&url)).await;

    assert_eq!(outcome, Some(LoadOutcome::Failed("invalid token".to_string())));
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    assert!(session.payload().is_none());
    assert!(!session.loader().is_loading());
    assert!(session.can_load());
}

#[tokio::test]
async fn test_error_without_detail_uses_generic_notice() {
    let (url, _state) = spawn_backend(Reply::PlainError).await;
    let mut session = connected_session(Provider::Notion);

    let outcome = session.load_with(&backend(&url)).await;

    assert_eq!(outcome, Some(LoadOutcome::Failed("Failed to load data".to_string())));
    assert!(session.payload().is_none());
}

#[tokio::test]
async fn test_non_json_success_body_is_a_failure() {
    let (url, _state) = spawn_backend(Reply::NotJson).await;
    let mut session = connected_session(Provider::Airtable);

    let outcome = session.load_with(&backend(&url)).await;

    assert_eq!(outcome, Some(LoadOutcome::Failed("Failed to load data".to_string())));
}

#[tokio::test]
async fn test_unreachable_backend_uses_generic_notice() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut session = connected_session(Provider::HubSpot);
    let outcome = session.load_with(&backend(&format!("http://{}", addr))).await;

    assert_eq!(outcome, Some(LoadOutcome::Failed("Failed to load data".to_string())));
    assert!(session.payload().is_none());
}

#[tokio::test]
async fn test_airtable_object_renders_raw() {
    let (url, state) = spawn_backend(Reply::Object).await;
    let mut session = connected_session(Provider::Airtable);

    session.load_with(&backend(&url)).await;

    assert_eq!(state.seen.lock().unwrap()[0].0, "airtable");
    let view = render_view(session.payload(), session.provider(), &DateFormat::default());
    let RenderView::Raw(raw) = view else {
        panic!("expected raw view");
    };
    assert!(!raw.collapsed);
    assert!(raw.text.contains("\"Projects\""));
}

#[tokio::test]
async fn test_disabled_load_sends_nothing() {
    let (url, state) = spawn_backend(Reply::Records).await;
    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(Provider::HubSpot);

    let outcome = session.load_with(&backend(&url)).await;

    assert_eq!(outcome, None);
    assert_eq!(state.hits.load(Ordering::SeqCst), 0);
}
