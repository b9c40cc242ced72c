// 🧭 Integration Session - selector and state holder
// Owns the active provider, its credential bundle and the data loader.
// All mutations go through this object; descendants only read.

use serde_json::Value;

use crate::credentials::{get_adapter, ConnectContext, CredentialBundle, CredentialStore};
use crate::error::{CredentialError, LoadError};
use crate::loader::{Backend, DataLoader, LoadOutcome, LoadRequest, LoadTicket};
use crate::provider::Provider;
use crate::record::Payload;

#[derive(Debug)]
pub struct IntegrationSession {
    context: ConnectContext,
    provider: Option<Provider>,
    credentials: Option<CredentialBundle>,
    loader: DataLoader,
}

impl IntegrationSession {
    pub fn new(context: ConnectContext) -> Self {
        IntegrationSession {
            context,
            provider: None,
            credentials: None,
            loader: DataLoader::new(),
        }
    }

    pub fn context(&self) -> &ConnectContext {
        &self.context
    }

    pub fn provider(&self) -> Option<Provider> {
        self.provider
    }

    pub fn credentials(&self) -> Option<&CredentialBundle> {
        self.credentials.as_ref()
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.loader.payload()
    }

    /// Switch provider. Credentials and loaded data of the previous provider are
    /// dropped and any in-flight load is invalidated. Reselecting the active
    /// provider changes nothing.
    pub fn select_provider(&mut self, provider: Provider) {
        if self.provider == Some(provider) {
            return;
        }

        tracing::debug!(from = ?self.provider, to = provider.name(), "provider selected");
        self.provider = Some(provider);
        self.credentials = None;
        self.loader.reset();
    }

    /// Store a freshly acquired bundle, replacing any previous one.
    /// Data loaded with the previous bundle is dropped.
    pub fn set_credentials(&mut self, bundle: CredentialBundle) {
        if self.provider != Some(bundle.provider()) {
            tracing::warn!(
                active = ?self.provider,
                bundle = bundle.provider().name(),
                "credentials do not match the active provider; load stays disabled"
            );
        }
        self.credentials = Some(bundle);
        self.loader.reset();
    }

    /// Run the active provider's adapter and store the result
    pub fn connect(&mut self, store: &CredentialStore) -> Result<(), CredentialError> {
        let provider = self.provider.ok_or(CredentialError::NoProviderSelected)?;

        let bundle = get_adapter(provider).connect(&self.context, store)?;
        self.set_credentials(bundle);
        Ok(())
    }

    /// Load is enabled only with a selected provider, matching credentials and
    /// no load in flight
    pub fn can_load(&self) -> bool {
        match (self.provider, &self.credentials) {
            (Some(provider), Some(bundle)) => {
                bundle.provider() == provider && !self.loader.is_loading()
            }
            _ => false,
        }
    }

    /// Start a load if enabled. `None` means nothing may be sent.
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        if !self.can_load() {
            return None;
        }
        let provider = self.provider?;
        let bundle = self.credentials.clone()?;
        let ticket = self.loader.begin()?;

        Some(LoadRequest {
            ticket,
            provider,
            bundle,
        })
    }

    /// Apply a load result; results for a superseded context are ignored
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Value, LoadError>) -> LoadOutcome {
        self.loader.complete(ticket, result)
    }

    /// Begin, execute and finish a load in one go.
    /// `None` when the load action is disabled.
    pub async fn load_with(&mut self, backend: &dyn Backend) -> Option<LoadOutcome> {
        let request = self.begin_load()?;
        let result = request.execute(backend).await;
        Some(self.finish_load(request.ticket, result))
    }

    pub fn clear(&mut self) {
        self.loader.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
