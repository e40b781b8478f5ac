//! Robots directive inference.
//!
//! Classifies a page as indexable or not from its type, identifier, and
//! request path. Total: every input produces a directive.

/// Directive for publicly indexable pages.
pub const ROBOTS_INDEX: &str = "index,follow";

/// Directive for pages crawlers must stay out of.
pub const ROBOTS_NOINDEX: &str = "noindex,nofollow";

/// Derive the robots directive for a page.
///
/// An explicit override wins. Otherwise type, identifier, and path are
/// checked by substring, in priority order: admin surfaces, then login,
/// then error pages, then private/temp path segments; anything else is
/// indexable.
pub fn generate_robots_directive(
    page_type: &str,
    identifier: &str,
    path: &str,
    explicit_override: Option<&str>,
) -> String {
    if let Some(robots) = explicit_override {
        if !robots.is_empty() {
            return robots.to_string();
        }
    }

    let fields = [page_type, identifier, path];

    let noindex = fields.iter().any(|s| s.contains("admin"))
        || fields
            .iter()
            .any(|s| s.contains("login") || s.contains("signin"))
        || fields
            .iter()
            .any(|s| s.contains("error") || s.contains("404"))
        || path.contains("/private") || path.contains("/temp") || path.contains("/tmp");

    if noindex {
        ROBOTS_NOINDEX.to_string()
    } else {
        ROBOTS_INDEX.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_surfaces_are_noindex() {
        assert_eq!(
            generate_robots_directive("page", "/admin/foo", "/admin/foo", None),
            ROBOTS_NOINDEX
        );
        assert_eq!(
            generate_robots_directive("admin", "dashboard", "/dashboard", None),
            ROBOTS_NOINDEX
        );
    }

    #[test]
    fn login_and_error_surfaces_are_noindex() {
        assert_eq!(
            generate_robots_directive("route", "login", "/login", None),
            ROBOTS_NOINDEX
        );
        assert_eq!(
            generate_robots_directive("route", "signin", "/account/signin", None),
            ROBOTS_NOINDEX
        );
        assert_eq!(
            generate_robots_directive("route", "not-found", "/404", None),
            ROBOTS_NOINDEX
        );
        assert_eq!(
            generate_robots_directive("error", "server", "/oops", None),
            ROBOTS_NOINDEX
        );
    }

    #[test]
    fn private_and_temp_segments_are_noindex() {
        assert_eq!(
            generate_robots_directive("page", "drafts", "/private/drafts", None),
            ROBOTS_NOINDEX
        );
        assert_eq!(
            generate_robots_directive("page", "scratch", "/tmp/scratch", None),
            ROBOTS_NOINDEX
        );
    }

    #[test]
    fn public_pages_are_indexable() {
        assert_eq!(
            generate_robots_directive("page", "home", "/", None),
            ROBOTS_INDEX
        );
        assert_eq!(
            generate_robots_directive("company", "acme", "/company/acme", None),
            ROBOTS_INDEX
        );
        assert_eq!(
            generate_robots_directive("category", "plumbers", "/category/general/plumbers", None),
            ROBOTS_INDEX
        );
    }

    #[test]
    fn explicit_override_wins() {
        assert_eq!(
            generate_robots_directive("page", "/admin/foo", "/admin/foo", Some("index,follow")),
            ROBOTS_INDEX
        );
        // Empty override falls through to derivation.
        assert_eq!(
            generate_robots_directive("page", "home", "/", Some("")),
            ROBOTS_INDEX
        );
    }
}
