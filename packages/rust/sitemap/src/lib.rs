//! Sitemap assembly.
//!
//! Enumerates every indexable page from two independently-queried
//! collections (business listings and company profiles) into one ordered
//! artifact, then renders it as XML or JSON over the identical
//! enumeration. The collections are treated as equally authoritative: a
//! company profile with no matching active listing is still published, and
//! no referential integrity between the two is assumed.

mod render;

use bizdir_shared::{BizdirError, Result};
use bizdir_storage::Storage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

pub use render::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, CONTENT_TYPE_XML, render_json, render_xml, robots_txt,
};

/// Priority of the site root entry.
const ROOT_PRIORITY: f64 = 1.0;
/// Priority of the category index entry.
const CATEGORY_INDEX_PRIORITY: f64 = 0.9;
/// Priority of business-listing pages.
const LISTING_PRIORITY: f64 = 0.8;
/// Priority of company-profile pages.
const COMPANY_PRIORITY: f64 = 0.7;

/// Placeholder slug some legacy company rows carry instead of a real one.
const NO_SLUG_PLACEHOLDER: &str = "No slug";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Change frequency hint for a sitemap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

/// A single sitemap URL entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub priority: f64,
    pub changefreq: ChangeFreq,
    /// UTC calendar day (`YYYY-MM-DD`); absent for the static entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// The assembled, ordered enumeration: static pages, then listings, then
/// companies. Both renderers walk this in order, so the XML and JSON
/// outputs always agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

impl Sitemap {
    /// Total emitted URLs, counted after slug filtering.
    pub fn total_urls(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Enumerate every indexable URL into an ordered [`Sitemap`].
///
/// Records with a missing or placeholder slug are skipped, never fatal;
/// a store failure aborts before anything is rendered.
#[instrument(skip(store))]
pub async fn assemble(store: &Storage, base_url: &str) -> Result<Sitemap> {
    let base = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| BizdirError::config(format!("invalid base URL '{base_url}': {e}")))?;

    let mut entries = vec![
        SitemapEntry {
            loc: base.to_string(),
            priority: ROOT_PRIORITY,
            changefreq: ChangeFreq::Daily,
            lastmod: None,
        },
        SitemapEntry {
            loc: page_url(&base, &["category"])?,
            priority: CATEGORY_INDEX_PRIORITY,
            changefreq: ChangeFreq::Weekly,
            lastmod: None,
        },
    ];

    for listing in store.list_active_listings().await? {
        let Some(slug) = normalized_slug(&listing.slug) else {
            debug!(id = %listing.id, "skipping listing without a usable slug");
            continue;
        };
        let bucket = if listing.parent.is_some() {
            "businesses"
        } else {
            "general"
        };
        entries.push(SitemapEntry {
            loc: page_url(&base, &["category", bucket, slug])?,
            priority: LISTING_PRIORITY,
            changefreq: ChangeFreq::Weekly,
            lastmod: Some(calendar_day(listing.updated_at)),
        });
    }

    for company in store.list_companies().await? {
        let slug = match normalized_slug(&company.slug) {
            Some(slug) if slug != NO_SLUG_PLACEHOLDER => slug,
            _ => {
                debug!(id = %company.id, "skipping company without a usable slug");
                continue;
            }
        };
        entries.push(SitemapEntry {
            loc: page_url(&base, &["company", slug])?,
            priority: COMPANY_PRIORITY,
            changefreq: ChangeFreq::Weekly,
            lastmod: Some(calendar_day(company.updated_at)),
        });
    }

    debug!(total = entries.len(), "sitemap assembled");
    Ok(Sitemap { entries })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build an absolute URL from the base plus path segments. Each segment is
/// percent-encoded individually by the `url` crate.
fn page_url(base: &Url, segments: &[&str]) -> Result<String> {
    let mut url = base.clone();
    {
        let mut parts = url.path_segments_mut().map_err(|()| {
            BizdirError::config(format!("base URL '{base}' cannot carry a path"))
        })?;
        parts.clear();
        for segment in segments {
            parts.push(segment);
        }
    }
    Ok(url.to_string())
}

/// Trimmed, non-empty slug or nothing.
fn normalized_slug(raw: &str) -> Option<&str> {
    let slug = raw.trim();
    (!slug.is_empty()).then_some(slug)
}

/// Truncate a timestamp to UTC calendar-day precision; today when absent.
fn calendar_day(updated_at: Option<DateTime<Utc>>) -> String {
    updated_at
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdir_shared::{CompanyRecord, ListingRecord};
    use chrono::TimeZone;
    use uuid::Uuid;

    const BASE: &str = "https://www.citybiz.example";

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("bizdir_sitemap_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn listing(id: &str, slug: &str, parent: Option<&str>, active: bool) -> ListingRecord {
        ListingRecord {
            id: id.into(),
            name: slug.into(),
            slug: slug.into(),
            parent: parent.map(String::from),
            is_active: active,
            updated_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap()),
        }
    }

    fn company(id: &str, slug: &str) -> CompanyRecord {
        CompanyRecord {
            id: id.into(),
            name: slug.into(),
            slug: slug.into(),
            updated_at: Some(Utc.with_ymd_and_hms(2025, 5, 15, 8, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn static_entries_always_present() {
        let store = test_storage().await;
        let sitemap = assemble(&store, BASE).await.expect("assemble");

        assert_eq!(sitemap.total_urls(), 2);
        assert_eq!(sitemap.entries[0].loc, "https://www.citybiz.example/");
        assert_eq!(sitemap.entries[0].priority, 1.0);
        assert_eq!(sitemap.entries[0].changefreq, ChangeFreq::Daily);
        assert_eq!(sitemap.entries[1].loc, "https://www.citybiz.example/category");
        assert_eq!(sitemap.entries[1].priority, 0.9);
        assert_eq!(sitemap.entries[1].changefreq, ChangeFreq::Weekly);
    }

    #[tokio::test]
    async fn counts_after_slug_filtering() {
        let store = test_storage().await;

        // 2 active listings, one with an empty slug.
        store.upsert_listing(&listing("l1", "plumbers", None, true)).await.unwrap();
        store.upsert_listing(&listing("l2", "", None, true)).await.unwrap();
        // 3 companies, one carrying the placeholder slug.
        store.upsert_company(&company("c1", "acme")).await.unwrap();
        store.upsert_company(&company("c2", "No slug")).await.unwrap();
        store.upsert_company(&company("c3", "zenith")).await.unwrap();

        let sitemap = assemble(&store, BASE).await.expect("assemble");
        assert_eq!(sitemap.total_urls(), 2 + 1 + 2);

        let locs: Vec<&str> = sitemap.entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            [
                "https://www.citybiz.example/",
                "https://www.citybiz.example/category",
                "https://www.citybiz.example/category/general/plumbers",
                "https://www.citybiz.example/company/acme",
                "https://www.citybiz.example/company/zenith",
            ]
        );
    }

    #[tokio::test]
    async fn bucket_follows_parent_grouping() {
        let store = test_storage().await;
        store
            .upsert_listing(&listing("l1", "florists", Some("retail"), true))
            .await
            .unwrap();
        store.upsert_listing(&listing("l2", "plumbers", None, true)).await.unwrap();
        store.upsert_listing(&listing("l3", "hidden", None, false)).await.unwrap();

        let sitemap = assemble(&store, BASE).await.expect("assemble");
        let locs: Vec<&str> = sitemap.entries.iter().map(|e| e.loc.as_str()).collect();
        assert!(locs.contains(&"https://www.citybiz.example/category/businesses/florists"));
        assert!(locs.contains(&"https://www.citybiz.example/category/general/plumbers"));
        // Inactive listings are not enumerated at all.
        assert!(!locs.iter().any(|l| l.contains("hidden")));
    }

    #[tokio::test]
    async fn lastmod_truncated_to_calendar_day() {
        let store = test_storage().await;
        store.upsert_listing(&listing("l1", "plumbers", None, true)).await.unwrap();

        let mut dateless = company("c1", "acme");
        dateless.updated_at = None;
        store.upsert_company(&dateless).await.unwrap();

        let sitemap = assemble(&store, BASE).await.expect("assemble");
        assert_eq!(sitemap.entries[2].lastmod.as_deref(), Some("2025-06-01"));
        // Missing timestamp falls back to today.
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(sitemap.entries[3].lastmod.as_deref(), Some(today.as_str()));
        // Static entries carry no lastmod.
        assert!(sitemap.entries[0].lastmod.is_none());
    }

    #[tokio::test]
    async fn slug_segments_are_percent_encoded() {
        let store = test_storage().await;
        store
            .upsert_company(&company("c1", "café bar & grill"))
            .await
            .unwrap();

        let sitemap = assemble(&store, BASE).await.expect("assemble");
        let loc = &sitemap.entries[2].loc;
        assert_eq!(
            loc,
            "https://www.citybiz.example/company/caf%C3%A9%20bar%20&%20grill"
        );
    }

    #[tokio::test]
    async fn invalid_base_url_is_an_error() {
        let store = test_storage().await;
        let err = assemble(&store, "not a url").await.unwrap_err();
        assert!(matches!(err, BizdirError::Config { .. }));
    }
}
