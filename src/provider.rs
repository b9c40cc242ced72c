// 🔌 Provider Table - closed set of third-party data sources
// Every provider maps to exactly one credential adapter and one backend slug

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;
use crate::grouping::{GroupingScheme, HUBSPOT_SCHEME};

// ============================================================================
// PROVIDER
// ============================================================================

/// Provider - which third-party service the user connects to
///
/// Serialized with its display name ("Notion", "Airtable", "HubSpot"), which is
/// also the `type` tag carried by a credential bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Notion,
    Airtable,
    HubSpot,
}

impl Provider {
    /// All providers, in picker order
    pub const ALL: [Provider; 3] = [Provider::Notion, Provider::Airtable, Provider::HubSpot];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Notion => "Notion",
            Provider::Airtable => "Airtable",
            Provider::HubSpot => "HubSpot",
        }
    }

    /// Endpoint slug used in `/integrations/{slug}/load`
    pub fn slug(&self) -> &'static str {
        match self {
            Provider::Notion => "notion",
            Provider::Airtable => "airtable",
            Provider::HubSpot => "hubspot",
        }
    }

    /// Short description shown in the provider picker
    pub fn description(&self) -> &'static str {
        match self {
            Provider::Notion => "Notes workspace - pages and databases",
            Provider::Airtable => "Spreadsheet-style bases and tables",
            Provider::HubSpot => "CRM - contacts, companies and deals",
        }
    }

    /// Grouping scheme for typed records, if this provider has one.
    /// Providers without a scheme always render as raw JSON.
    pub fn grouping_scheme(&self) -> Option<&'static GroupingScheme> {
        match self {
            Provider::HubSpot => Some(&HUBSPOT_SCHEME),
            Provider::Notion | Provider::Airtable => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    /// Accepts the display name or the slug, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();

        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.slug() == wanted || p.name().to_lowercase() == wanted)
            .ok_or_else(|| ProviderError::UnknownProvider(s.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
