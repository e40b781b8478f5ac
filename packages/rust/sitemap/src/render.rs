//! Sitemap renderers and robots.txt.
//!
//! Both renderers walk the assembled enumeration in order; the XML and
//! JSON documents always list the same URLs in the same positions. XML is
//! built as a whole string after assembly succeeds, so a store failure can
//! never leave a truncated document on the wire.

use std::fmt::Write as _;

use bizdir_shared::{BizdirError, Result};
use serde::Serialize;

use crate::{Sitemap, SitemapEntry};

/// Content type for the XML sitemap endpoint.
pub const CONTENT_TYPE_XML: &str = "text/xml";
/// Content type for the JSON sitemap endpoint.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Content type for robots.txt.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

/// Render the sitemap as a `urlset` XML document.
pub fn render_xml(sitemap: &Sitemap) -> String {
    let mut out = String::with_capacity(128 + sitemap.entries.len() * 160);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for entry in &sitemap.entries {
        out.push_str("  <url>\n");
        let _ = writeln!(out, "    <loc>{}</loc>", xml_escape(&entry.loc));
        if let Some(lastmod) = &entry.lastmod {
            let _ = writeln!(out, "    <lastmod>{}</lastmod>", xml_escape(lastmod));
        }
        let _ = writeln!(
            out,
            "    <changefreq>{}</changefreq>",
            entry.changefreq.as_str()
        );
        let _ = writeln!(out, "    <priority>{:.1}</priority>", entry.priority);
        out.push_str("  </url>\n");
    }

    out.push_str("</urlset>\n");
    out
}

/// Escape the XML special characters in element text.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// The JSON sitemap document: the same ordered list plus a computed total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SitemapJson<'a> {
    total_urls: usize,
    urls: &'a [SitemapEntry],
}

/// Render the sitemap as a JSON document with a computed total count.
pub fn render_json(sitemap: &Sitemap) -> Result<String> {
    let doc = SitemapJson {
        total_urls: sitemap.total_urls(),
        urls: &sitemap.entries,
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| BizdirError::Store(format!("sitemap JSON serialization failed: {e}")))
}

// ---------------------------------------------------------------------------
// robots.txt
// ---------------------------------------------------------------------------

/// Render robots.txt: open the site to all agents, advertise the sitemap,
/// and ask crawlers to pace themselves.
pub fn robots_txt(base_url: &str, crawl_delay_secs: u64) -> String {
    let base = base_url.trim_end_matches('/');
    format!(
        "User-agent: *\n\
         Allow: /\n\
         Crawl-delay: {crawl_delay_secs}\n\
         Sitemap: {base}/sitemap.xml\n"
    )
}
