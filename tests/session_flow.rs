// Session flow with a credentials file and a scripted backend

use async_trait::async_trait;
use integration_hub::{
    render_text, render_view, Backend, ConnectContext, CredentialBundle, CredentialStore,
    DateFormat, IntegrationSession, LoadError, LoadOutcome, LoadPhase, Provider,
};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

struct ScriptedBackend {
    calls: Mutex<Vec<(Provider, Value)>>,
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn load(&self, provider: Provider, bundle: &CredentialBundle) -> Result<Value, LoadError> {
        self.calls
            .lock()
            .unwrap()
            .push((provider, bundle.credentials().clone()));
        Ok(json!([
            {"id": 7, "name": "Globex", "type": "company", "url": "https://example.com/7"}
        ]))
    }
}

fn credentials_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"hubspot": {{"access_token": "hs-token"}}, "Notion": "notion-token"}}"#
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_connect_from_file_and_load() {
    let file = credentials_file();
    let store = CredentialStore::from_file(file.path()).unwrap();
    let backend = ScriptedBackend { calls: Mutex::new(Vec::new()) };

    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(Provider::HubSpot);
    session.connect(&store).unwrap();

    let outcome = session.load_with(&backend).await;
    assert_eq!(outcome, Some(LoadOutcome::Loaded));

    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (Provider::HubSpot, json!({"access_token": "hs-token"})));
    drop(calls);

    let view = render_view(session.payload(), session.provider(), &DateFormat::default());
    let text = render_text(&view, false);
    assert!(text.contains("Companies (1)\n  [Company] Globex\n      ID: 7\n"));
}

#[tokio::test]
async fn test_bare_token_becomes_access_token() {
    let file = credentials_file();
    let store = CredentialStore::from_file(file.path()).unwrap();
    let backend = ScriptedBackend { calls: Mutex::new(Vec::new()) };

    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(Provider::Notion);
    session.connect(&store).unwrap();
    session.load_with(&backend).await;

    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls[0].1, json!({"access_token": "notion-token"}));
}

#[tokio::test]
async fn test_switching_provider_mid_flight_discards_result() {
    let file = credentials_file();
    let store = CredentialStore::from_file(file.path()).unwrap();
    let backend = ScriptedBackend { calls: Mutex::new(Vec::new()) };

    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(Provider::HubSpot);
    session.connect(&store).unwrap();

    let request = session.begin_load().unwrap();
    assert_eq!(session.loader().phase(), LoadPhase::Loading);

    session.select_provider(Provider::Notion);
    let result = request.execute(&backend).await;

    assert_eq!(session.finish_load(request.ticket, result), LoadOutcome::Stale);
    assert!(session.payload().is_none());
    assert_eq!(session.loader().phase(), LoadPhase::Idle);
}

#[test]
fn test_missing_provider_credentials_is_an_error() {
    let store = CredentialStore::new();
    let mut session = IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg"));
    session.select_provider(Provider::Airtable);

    assert!(session.connect(&store).is_err());
    assert!(session.credentials().is_none());
    assert!(!session.can_load());
}
