// Integration Hub - Core Library
// Exposes all modules for use in the CLI, the terminal UI, and tests

pub mod provider;       // Provider catalogue (Notion, Airtable, HubSpot)
pub mod error;          // Error kinds shared across modules
pub mod credentials;    // Credential adapters + store
pub mod record;         // Backend record shape + payload classification
pub mod loader;         // Load state machine + Backend seam
pub mod session;        // Selected provider, credentials, loaded data
pub mod backend;        // HTTP client for the integrations backend
pub mod grouping;       // Category grouping + render views
pub mod report;         // Plain-text rendering
pub mod config;         // CLI flags / env configuration
pub mod logging;        // tracing subscriber setup

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use provider::Provider;
pub use error::{CredentialError, LoadError, ProviderError, GENERIC_LOAD_FAILURE};
pub use credentials::{
    get_adapter, CredentialAdapter, CredentialBundle, CredentialStore, ConnectContext,
    AirtableAdapter, HubSpotAdapter, NotionAdapter,
};
pub use record::{Payload, Record};
pub use loader::{Backend, DataLoader, LoadOutcome, LoadPhase, LoadRequest, LoadTicket};
pub use session::IntegrationSession;
pub use backend::HttpBackend;
pub use grouping::{
    render_view, Category, CategoryTotal, DateFormat, GroupSection, GroupedView,
    GroupingScheme, RawView, RecordSummary, RenderView, HUBSPOT_SCHEME,
};
pub use report::render_text;
pub use config::{HubArgs, Settings};
pub use logging::{init_tracing, LogTarget};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
