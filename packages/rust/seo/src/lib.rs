//! SEO metadata resolution.
//!
//! Produces the single effective SEO record for a `(page_type, identifier,
//! tab?)` request. Precedence, highest first: the exact tab-specific
//! record, then the page-level record, then a hard-coded baseline. The
//! matched tier wins wholesale for title/description/keywords/lang; there
//! is no field-by-field merging across tiers. Canonical URL and robots
//! directive are always derived, with an explicit value on the matched
//! tier taking precedence over the derived one.

pub mod canonical;
pub mod robots;

use std::sync::LazyLock;

use bizdir_shared::{BizdirError, Result, SeoRecord, SiteConfig};
use bizdir_storage::Storage;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

pub use canonical::generate_canonical_url;
pub use robots::{ROBOTS_INDEX, ROBOTS_NOINDEX, generate_robots_directive};

/// Identifiers are route keys and slugs: non-empty, no whitespace.
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+$").expect("identifier regex")
});

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A page descriptor to resolve metadata for, as parsed from the request
/// by the web layer.
#[derive(Debug, Clone)]
pub struct SeoRequest<'a> {
    pub page_type: &'a str,
    pub identifier: &'a str,
    /// Sub-tab, when the request targets a tab within the page.
    pub tab: Option<&'a str>,
    /// Request path, used for canonical and robots derivation.
    pub path: &'a str,
    /// Raw query string, used for canonical derivation.
    pub query: Option<&'a str>,
}

/// Which tier produced the effective record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Exact `(page_type, identifier, tab)` record.
    Tab,
    /// Page-level `(page_type, identifier)` record.
    Page,
    /// No stored record; empty fields plus derived canonical/robots.
    Baseline,
}

/// The effective SEO metadata for a page, ready to forward as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSeo {
    pub page_type: String,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    /// Always present: explicit on the matched tier, or derived.
    pub robots: String,
    /// Always present: explicit on the matched tier, or derived.
    pub canonical: String,
    pub lang: String,
    pub matched: MatchTier,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the effective SEO record for a request.
///
/// "No record at any tier" is not an error: the baseline tier applies and
/// canonical/robots are still derived. Only store failure surfaces.
#[instrument(skip(store, site))]
pub async fn resolve_seo(
    store: &Storage,
    site: &SiteConfig,
    req: &SeoRequest<'_>,
) -> Result<ResolvedSeo> {
    // Ordered candidates; the first full record wins wholesale.
    let mut matched = MatchTier::Baseline;
    let mut record: Option<SeoRecord> = None;

    if let Some(tab) = req.tab {
        if let Some(found) = store
            .get_seo_record(req.page_type, req.identifier, Some(tab))
            .await?
        {
            matched = MatchTier::Tab;
            record = Some(found);
        }
    }
    if record.is_none() {
        if let Some(found) = store
            .get_seo_record(req.page_type, req.identifier, None)
            .await?
        {
            matched = MatchTier::Page;
            record = Some(found);
        }
    }

    debug!(?matched, page_type = req.page_type, identifier = req.identifier, "seo tier matched");

    let (title, description, keywords, lang, robots_override, canonical_override) = match record {
        Some(r) => (r.title, r.description, r.keywords, r.lang, r.robots, r.canonical),
        None => (
            String::new(),
            String::new(),
            Vec::new(),
            site.default_lang.clone(),
            None,
            None,
        ),
    };

    let canonical = generate_canonical_url(
        &site.base_url,
        req.path,
        req.query,
        canonical_override.as_deref(),
    );
    let robots = generate_robots_directive(
        req.page_type,
        req.identifier,
        req.path,
        robots_override.as_deref(),
    );

    Ok(ResolvedSeo {
        page_type: req.page_type.to_string(),
        identifier: req.identifier.to_string(),
        tab: req.tab.map(String::from),
        title,
        description,
        keywords,
        robots,
        canonical,
        lang,
        matched,
    })
}

// ---------------------------------------------------------------------------
// Admin writes
// ---------------------------------------------------------------------------

/// Upsert an SEO record on its `(page_type, identifier, tab)` key and echo
/// the stored record.
///
/// A blank `tab` is normalized to `None` (the page-level record); a blank
/// `lang` falls back to the site default.
#[instrument(skip(store, record), fields(page_type = %record.page_type, identifier = %record.identifier))]
pub async fn upsert_seo_record(
    store: &Storage,
    site: &SiteConfig,
    mut record: SeoRecord,
) -> Result<SeoRecord> {
    if record.page_type.trim().is_empty() {
        return Err(BizdirError::validation("type must not be empty"));
    }
    if !IDENTIFIER_RE.is_match(&record.identifier) {
        return Err(BizdirError::validation(format!(
            "malformed identifier '{}'",
            record.identifier
        )));
    }

    record.tab = record.tab.filter(|t| !t.trim().is_empty());
    if record.lang.trim().is_empty() {
        record.lang = site.default_lang.clone();
    }

    store.upsert_seo_record(&record).await?;
    Ok(record)
}
