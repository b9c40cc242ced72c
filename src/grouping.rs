// 🗂️ Record Grouping & Rendering Engine
//
// Pure function of (payload, provider) → RenderView.
// Providers with a grouping scheme get per-category sections plus a collapsed
// raw view; everything else gets the raw view only.

use anyhow::{bail, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::{Display, Write};

use crate::provider::Provider;
use crate::record::{Payload, Record};

// ============================================================================
// GROUPING SCHEMES
// ============================================================================

/// Category - one recognised value of a record's `type` field
#[derive(Debug, PartialEq, Eq)]
pub struct Category {
    /// Exact `type` value matched against records
    pub type_tag: &'static str,
    /// Section heading ("Contacts")
    pub label: &'static str,
    /// Per-record badge ("Contact")
    pub badge: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GroupingScheme {
    pub title: &'static str,
    pub link_label: &'static str,
    pub categories: &'static [Category],
}

impl GroupingScheme {
    /// Category for a `type` value; exact, case-sensitive match
    pub fn category_for(&self, record_type: Option<&str>) -> Option<&'static Category> {
        let record_type = record_type?;
        self.categories.iter().find(|c| c.type_tag == record_type)
    }
}

pub static HUBSPOT_SCHEME: GroupingScheme = GroupingScheme {
    title: "HubSpot Data Summary",
    link_label: "View in HubSpot",
    categories: &[
        Category {
            type_tag: "contact",
            label: "Contacts",
            badge: "Contact",
        },
        Category {
            type_tag: "company",
            label: "Companies",
            badge: "Company",
        },
        Category {
            type_tag: "deal",
            label: "Deals",
            badge: "Deal",
        },
    ],
};

// ============================================================================
// DATE FORMATTING
// ============================================================================

/// DateFormat - how `creation_time` is shown to the viewer
///
/// Timestamps are converted to the viewer's local zone and rendered with a
/// strftime pattern. Default `%-m/%-d/%Y` ("3/15/2024").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    pub const DEFAULT_PATTERN: &'static str = "%-m/%-d/%Y";

    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            bail!("date format must not be empty");
        }
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            bail!("invalid date format: {}", pattern);
        }
        Ok(DateFormat { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format in the viewer's local time zone; `None` if the input does not parse
    pub fn format(&self, raw: &str) -> Option<String> {
        self.format_in(raw, &Local)
    }

    pub fn format_in<Tz>(&self, raw: &str, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        let written = match parse_timestamp(raw)? {
            Timestamp::Instant(dt) => write!(out, "{}", dt.with_timezone(tz).format(&self.pattern)),
            Timestamp::Naive(dt) => write!(out, "{}", dt.format(&self.pattern)),
            Timestamp::Date(d) => write!(out, "{}", d.format(&self.pattern)),
        };
        written.ok().map(|_| out)
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat {
            pattern: Self::DEFAULT_PATTERN.to_string(),
        }
    }
}

enum Timestamp {
    Instant(DateTime<Utc>),
    /// No offset given; already wall-clock time
    Naive(NaiveDateTime),
    Date(NaiveDate),
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp::Instant(dt.with_timezone(&Utc)));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(Timestamp::Naive(dt));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(Timestamp::Date)
}

// ============================================================================
// RENDERING DESCRIPTION
// ============================================================================

/// RecordSummary - what a group section shows for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: String,
    pub name: String,
    pub created: Option<String>,
    pub url: Option<String>,
}

impl RecordSummary {
    pub fn from_record(record: &Record, dates: &DateFormat) -> Self {
        RecordSummary {
            id: record.id.clone(),
            name: record.display_name().to_string(),
            created: record
                .creation_time
                .as_deref()
                .and_then(|raw| dates.format(raw)),
            url: record.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSection {
    pub category: &'static Category,
    pub entries: Vec<RecordSummary>,
}

impl GroupSection {
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

/// Count for one category, zero included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: &'static Category,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawView {
    /// Pretty-printed JSON, two-space indent
    pub text: String,
    pub collapsed: bool,
}

impl RawView {
    fn of(payload: &Payload, collapsed: bool) -> Self {
        let raw = payload.raw();
        RawView {
            text: serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string()),
            collapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedView {
    pub title: &'static str,
    pub link_label: &'static str,
    pub totals: Vec<CategoryTotal>,
    /// Non-empty groups only, in scheme order
    pub sections: Vec<GroupSection>,
    pub raw: RawView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderView {
    /// Nothing loaded
    Empty,
    Grouped(GroupedView),
    /// No scheme for this provider, or the payload is not a record list
    Raw(RawView),
}

// ============================================================================
// ENGINE
// ============================================================================

/// Partition records by category, keeping response order within each group.
/// Records with an unrecognised or missing `type` are left out.
pub fn partition<'a>(
    records: &'a [Record],
    scheme: &'static GroupingScheme,
) -> Vec<(&'static Category, Vec<&'a Record>)> {
    let mut groups: Vec<(&'static Category, Vec<&'a Record>)> =
        scheme.categories.iter().map(|c| (c, Vec::new())).collect();

    for record in records {
        if let Some(category) = scheme.category_for(record.record_type.as_deref()) {
            if let Some((_, members)) = groups.iter_mut().find(|(c, _)| *c == category) {
                members.push(record);
            }
        }
    }

    groups
}

/// Build the rendering description for the current session state
pub fn render_view(
    payload: Option<&Payload>,
    provider: Option<Provider>,
    dates: &DateFormat,
) -> RenderView {
    let payload = match payload {
        Some(p) => p,
        None => return RenderView::Empty,
    };

    let scheme = provider.and_then(|p| p.grouping_scheme());

    match (scheme, payload.records()) {
        (Some(scheme), Some(records)) => {
            let groups = partition(records, scheme);

            let totals = groups
                .iter()
                .map(|(category, members)| CategoryTotal {
                    category: *category,
                    count: members.len(),
                })
                .collect();

            let sections = groups
                .into_iter()
                .filter(|(_, members)| !members.is_empty())
                .map(|(category, members)| GroupSection {
                    category,
                    entries: members
                        .into_iter()
                        .map(|r| RecordSummary::from_record(r, dates))
                        .collect(),
                })
                .collect();

            RenderView::Grouped(GroupedView {
                title: scheme.title,
                link_label: scheme.link_label,
                totals,
                sections,
                raw: RawView::of(payload, true),
            })
        }
        _ => RenderView::Raw(RawView::of(payload, false)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
