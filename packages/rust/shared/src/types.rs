//! Core domain types for the BizDir publishing pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback language code when a record or config does not supply one.
pub const DEFAULT_LANG: &str = "en";

// ---------------------------------------------------------------------------
// TabKind
// ---------------------------------------------------------------------------

/// Whether a tab kind was seeded at bootstrap or created by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabOrigin {
    System,
    Custom,
}

impl TabOrigin {
    /// Storage representation, matching the `tab_kinds.origin` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for TabOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown tab origin: {other}")),
        }
    }
}

/// A named content slot a page may include (e.g. "Contact Numbers").
///
/// `tab_id` is unique across the registry. `sort_order` defines the default
/// display sequence and does not need to be contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabKind {
    /// Unique registry identifier (e.g. `contact-numbers`).
    pub tab_id: String,
    /// Display label.
    pub label: String,
    /// Icon name for the rendering layer.
    pub icon: String,
    /// System-seeded or admin-created.
    pub origin: TabOrigin,
    /// Default display position; ties broken by `tab_id` lexical order.
    pub sort_order: i64,
    /// Who created the kind (`system` for seeded entries).
    pub created_by: String,
}

// ---------------------------------------------------------------------------
// PageTabs
// ---------------------------------------------------------------------------

/// The per-page tab map: selected tab kinds and their content bindings.
///
/// A key present with a `None` value is a tab that is configured but has no
/// content attached yet. Content fragments are owned by external
/// collaborators; only their ids are stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTabs {
    /// The owning page (company or category entity).
    pub page_id: String,
    /// `tab_id` to optional content-fragment reference.
    pub tabs: BTreeMap<String, Option<String>>,
}

impl PageTabs {
    /// An empty tab map for a page.
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            tabs: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SeoRecord
// ---------------------------------------------------------------------------

/// Stored SEO metadata for a page or a page+tab combination.
///
/// Uniqueness key: `(page_type, identifier, tab)`. `tab = None` is the
/// page-level record; a tab-specific record overrides it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoRecord {
    /// Page class: `home`, `category`, `company`, `route`, ...
    pub page_type: String,
    /// Page identity within the class (slug, route name, etc.).
    pub identifier: String,
    /// Sub-tab this record applies to, or `None` for the whole page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered keyword list.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Explicit robots directive; derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
    /// Explicit canonical URL; derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_lang() -> String {
    DEFAULT_LANG.into()
}

// ---------------------------------------------------------------------------
// Publishable page records
// ---------------------------------------------------------------------------

/// A business-listing record, sitemap-eligible when active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Parent grouping; determines the `/category/{bucket}/` bucket.
    pub parent: Option<String>,
    pub is_active: bool,
    /// Missing on legacy rows; sitemap falls back to today's date.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A company-profile record, sitemap-eligible regardless of any active flag.
///
/// Enumerated independently of listings: a profile without a matching
/// active listing is still published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// The `{success, data|message}` JSON envelope the web layer forwards.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// A failed response carrying an error message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}
