// 🔑 Credential Acquisition - one adapter per provider
// Adapters turn a provider's connection flow into a `{type, credentials}` bundle

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CredentialError;
use crate::provider::Provider;

// ============================================================================
// CREDENTIAL BUNDLE
// ============================================================================

/// CredentialBundle - opaque provider credentials tagged with their provider
///
/// Wire shape: `{"type": "HubSpot", "credentials": {...}}`.
/// A bundle is never edited; a new connection replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialBundle {
    #[serde(rename = "type")]
    provider: Provider,
    credentials: Value,
}

impl CredentialBundle {
    pub fn new(provider: Provider, credentials: Value) -> Self {
        CredentialBundle {
            provider,
            credentials,
        }
    }

    /// Provider this bundle was acquired for
    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn credentials(&self) -> &Value {
        &self.credentials
    }
}

// ============================================================================
// CREDENTIAL SOURCE
// ============================================================================

/// Who is connecting; handed to every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectContext {
    pub user_id: String,
    pub org_id: String,
}

impl ConnectContext {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        ConnectContext {
            user_id: user_id.into(),
            org_id: org_id.into(),
        }
    }
}

/// CredentialStore - provider credentials read from a JSON file
///
/// ```json
/// { "HubSpot": { "access_token": "..." }, "notion": "secret_..." }
/// ```
///
/// Keys may be provider names or slugs. A bare string is shorthand for
/// `{"access_token": "<string>"}`.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<Provider, Value>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load credentials from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read credentials file: {:?}", path.as_ref()))?;

        let raw: HashMap<String, Value> =
            serde_json::from_str(&content).context("Failed to parse credentials JSON")?;

        let mut store = CredentialStore::new();
        for (key, value) in raw {
            let provider: Provider = key
                .parse()
                .with_context(|| format!("Unknown provider key in credentials file: {}", key))?;
            store.insert(provider, value);
        }

        Ok(store)
    }

    pub fn insert(&mut self, provider: Provider, value: Value) {
        self.entries.insert(provider, value);
    }

    pub fn get(&self, provider: Provider) -> Option<&Value> {
        self.entries.get(&provider)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// ADAPTER TRAIT
// ============================================================================

/// CredentialAdapter - produces a bundle for exactly one provider
///
/// `connect` yields one bundle per successful connection. The default
/// implementation reads the provider's entry from the store and checks
/// `required_fields`.
pub trait CredentialAdapter: Send + Sync {
    /// Provider this adapter connects to
    fn provider(&self) -> Provider;

    /// Fields that must be present (as non-empty strings) in the credentials
    fn required_fields(&self) -> &'static [&'static str] {
        &["access_token"]
    }

    fn connect(
        &self,
        ctx: &ConnectContext,
        store: &CredentialStore,
    ) -> Result<CredentialBundle, CredentialError> {
        let provider = self.provider();
        let entry = store
            .get(provider)
            .ok_or_else(|| CredentialError::NotConfigured(provider.name().to_string()))?;

        let credentials = match entry {
            Value::String(token) => {
                let mut obj = Map::new();
                obj.insert("access_token".to_string(), Value::String(token.clone()));
                Value::Object(obj)
            }
            Value::Object(_) => entry.clone(),
            _ => {
                return Err(CredentialError::NotAnObject {
                    provider: provider.name().to_string(),
                })
            }
        };

        for field in self.required_fields() {
            let present = credentials
                .get(*field)
                .and_then(|v| v.as_str())
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);

            if !present {
                return Err(CredentialError::MissingField {
                    provider: provider.name().to_string(),
                    field: field.to_string(),
                });
            }
        }

        tracing::info!(
            provider = provider.name(),
            user_id = %ctx.user_id,
            org_id = %ctx.org_id,
            "credentials acquired"
        );

        Ok(CredentialBundle::new(provider, credentials))
    }
}

/// Get the adapter for a provider
///
/// Static table over the closed provider set.
pub fn get_adapter(provider: Provider) -> Box<dyn CredentialAdapter> {
    match provider {
        Provider::Notion => Box::new(NotionAdapter),
        Provider::Airtable => Box::new(AirtableAdapter),
        Provider::HubSpot => Box::new(HubSpotAdapter),
    }
}

// ============================================================================
// ADAPTERS
// ============================================================================

/// Notion: internal integration secret or OAuth access token
pub struct NotionAdapter;

impl CredentialAdapter for NotionAdapter {
    fn provider(&self) -> Provider {
        Provider::Notion
    }
}

/// Airtable: personal access token or OAuth access token
pub struct AirtableAdapter;

impl CredentialAdapter for AirtableAdapter {
    fn provider(&self) -> Provider {
        Provider::Airtable
    }
}

/// HubSpot: OAuth token response (`access_token`, optional `refresh_token`)
pub struct HubSpotAdapter;

impl CredentialAdapter for HubSpotAdapter {
    fn provider(&self) -> Provider {
        Provider::HubSpot
    }
}

// ============================================================================
// TESTS
// ============================================================================
