//! Canonical URL derivation.
//!
//! The canonical for a page is the site base URL plus the request path,
//! with tracking query parameters stripped. Pure and deterministic: the
//! same `(path, query)` always yields the same string.

/// Query keys dropped from canonical URLs.
const TRACKING_PARAMS: [&str; 7] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Build the canonical URL for a request path.
///
/// An explicit override is returned unchanged. Otherwise the base URL is
/// concatenated with `path`, and the query string (if any) is re-appended
/// with tracking keys removed, surviving pairs kept byte-for-byte in their
/// original relative order. The `?` is omitted when nothing survives.
pub fn generate_canonical_url(
    base_url: &str,
    path: &str,
    query: Option<&str>,
    explicit_override: Option<&str>,
) -> String {
    if let Some(explicit) = explicit_override {
        if !explicit.is_empty() {
            return explicit.to_string();
        }
    }

    let base = base_url.trim_end_matches('/');
    let mut canonical = if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };

    if let Some(query) = query {
        let kept = filter_query_pairs(query);
        if !kept.is_empty() {
            canonical.push('?');
            canonical.push_str(&kept.join("&"));
        }
    }

    canonical
}

/// Split a query string into `key=value` pairs and drop tracking keys.
/// Pairs are not decoded or re-encoded.
fn filter_query_pairs(query: &str) -> Vec<&str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or(pair);
            !TRACKING_PARAMS.contains(&key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.citybiz.example";

    #[test]
    fn tracking_params_dropped_others_kept() {
        let url = generate_canonical_url(BASE, "/x", Some("?utm_source=a&ref=b"), None);
        assert_eq!(url, "https://www.citybiz.example/x?ref=b");
    }

    #[test]
    fn question_mark_omitted_when_nothing_survives() {
        let url = generate_canonical_url(
            BASE,
            "/company/acme",
            Some("utm_source=mail&utm_medium=email&gclid=123"),
            None,
        );
        assert_eq!(url, "https://www.citybiz.example/company/acme");
    }

    #[test]
    fn pair_order_preserved() {
        let url = generate_canonical_url(
            BASE,
            "/search",
            Some("b=2&utm_campaign=x&a=1&fbclid=f"),
            None,
        );
        assert_eq!(url, "https://www.citybiz.example/search?b=2&a=1");
    }

    #[test]
    fn no_query_at_all() {
        let url = generate_canonical_url(BASE, "/", None, None);
        assert_eq!(url, "https://www.citybiz.example/");
    }

    #[test]
    fn explicit_override_wins_unchanged() {
        let url = generate_canonical_url(
            BASE,
            "/x",
            Some("ref=b"),
            Some("https://other.example/preferred"),
        );
        assert_eq!(url, "https://other.example/preferred");
    }

    #[test]
    fn trailing_base_slash_and_bare_path_normalized() {
        let url = generate_canonical_url("https://www.citybiz.example/", "category", None, None);
        assert_eq!(url, "https://www.citybiz.example/category");
    }

    #[test]
    fn valueless_and_empty_pairs() {
        let url = generate_canonical_url(BASE, "/x", Some("flag&&utm_source"), None);
        assert_eq!(url, "https://www.citybiz.example/x?flag");
    }

    #[test]
    fn deterministic() {
        let a = generate_canonical_url(BASE, "/x", Some("?b=2&a=1"), None);
        let b = generate_canonical_url(BASE, "/x", Some("?b=2&a=1"), None);
        assert_eq!(a, b);
    }
}
