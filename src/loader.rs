// ⏳ Data Loader - single in-flight load with stale-response protection
//
// Idle → Loading → {Loaded | Failed}
// Loaded → Idle (clear), Loaded → Loading (refresh), Failed → Loading (retry)
//
// A load runs in two phases: `begin` hands out a ticket, `complete` applies a
// result only while that ticket is still the in-flight one.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::credentials::CredentialBundle;
use crate::error::LoadError;
use crate::provider::Provider;
use crate::record::Payload;

// ============================================================================
// BACKEND SEAM
// ============================================================================

/// Backend - one round trip to `/integrations/{slug}/load`
#[async_trait]
pub trait Backend: Send + Sync {
    async fn load(&self, provider: Provider, bundle: &CredentialBundle) -> Result<Value, LoadError>;
}

// ============================================================================
// LOAD STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "Idle",
            LoadPhase::Loading => "Loading",
            LoadPhase::Loaded => "Loaded",
            LoadPhase::Failed => "Failed",
        }
    }
}

/// LoadTicket - identifies one load attempt
///
/// `generation` is the credential context the load was started in; it changes
/// whenever the provider or the credentials change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub request_id: Uuid,
}

/// LoadRequest - everything a backend call needs, detached from the session
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub provider: Provider,
    pub bundle: CredentialBundle,
}

impl LoadRequest {
    /// Perform the round trip for this request
    pub async fn execute(&self, backend: &dyn Backend) -> Result<Value, LoadError> {
        tracing::info!(
            request_id = %self.ticket.request_id,
            provider = self.provider.name(),
            "loading provider data"
        );
        let result = backend.load(self.provider, &self.bundle).await;
        if let Err(e) = &result {
            tracing::warn!(request_id = %self.ticket.request_id, error = %e, "load failed");
        }
        result
    }
}

/// What `complete` did with a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Payload stored
    Loaded,
    /// Collection untouched; message for the user
    Failed(String),
    /// Ticket no longer current; nothing changed
    Stale,
}

// ============================================================================
// DATA LOADER
// ============================================================================

#[derive(Debug)]
pub struct DataLoader {
    phase: LoadPhase,
    payload: Option<Payload>,
    notice: Option<String>,
    generation: u64,
    in_flight: Option<LoadTicket>,
}

impl DataLoader {
    pub fn new() -> Self {
        DataLoader {
            phase: LoadPhase::Idle,
            payload: None,
            notice: None,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Last failure message, until the next load starts
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a load. Returns `None` while another load is in flight.
    pub fn begin(&mut self) -> Option<LoadTicket> {
        if self.in_flight.is_some() {
            tracing::debug!("load ignored, another load is in flight");
            return None;
        }

        let ticket = LoadTicket {
            generation: self.generation,
            request_id: Uuid::new_v4(),
        };
        self.in_flight = Some(ticket);
        self.phase = LoadPhase::Loading;
        self.notice = None;

        Some(ticket)
    }

    /// Apply the result of a load started with `ticket`
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Value, LoadError>) -> LoadOutcome {
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                request_id = %ticket.request_id,
                generation = ticket.generation,
                current_generation = self.generation,
                "discarding stale load result"
            );
            return LoadOutcome::Stale;
        }

        self.in_flight = None;

        match result {
            Ok(value) => {
                self.payload = Some(Payload::from_value(value));
                self.phase = LoadPhase::Loaded;
                LoadOutcome::Loaded
            }
            Err(e) => {
                let message = e.user_message();
                self.phase = LoadPhase::Failed;
                self.notice = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Drop the loaded collection. No-op when nothing is loaded.
    pub fn clear(&mut self) {
        if self.payload.take().is_none() {
            return;
        }
        if self.in_flight.is_none() {
            self.phase = LoadPhase::Idle;
        }
    }

    /// Forget everything and start a new credential context.
    /// Results of loads begun before the reset become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.payload = None;
        self.notice = None;
        self.phase = LoadPhase::Idle;
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
