//! SQL migration definitions for the BizDir database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: tab_kinds, page_tabs, seo_records, listings, companies",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Tab kind catalog (system-seeded and admin-created)
CREATE TABLE IF NOT EXISTS tab_kinds (
    tab_id     TEXT PRIMARY KEY,
    label      TEXT NOT NULL,
    icon       TEXT NOT NULL,
    origin     TEXT NOT NULL CHECK (origin IN ('system', 'custom')),
    sort_order INTEGER NOT NULL,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Per-page tab map, one JSON document per page:
-- { "<tab_id>": "<content fragment id>" | null, ... }
CREATE TABLE IF NOT EXISTS page_tabs (
    page_id    TEXT PRIMARY KEY,
    tabs_json  TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- SEO records keyed by (page_type, identifier, tab).
-- tab = '' is the page-level record; NULL would make the UNIQUE key
-- admit duplicates, so the empty string stands in for "no tab".
CREATE TABLE IF NOT EXISTS seo_records (
    id            TEXT PRIMARY KEY,
    page_type     TEXT NOT NULL,
    identifier    TEXT NOT NULL,
    tab           TEXT NOT NULL DEFAULT '',
    title         TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    keywords_json TEXT NOT NULL DEFAULT '[]',
    robots        TEXT,
    canonical     TEXT,
    lang          TEXT NOT NULL DEFAULT 'en',
    updated_at    TEXT NOT NULL,
    UNIQUE(page_type, identifier, tab)
);

CREATE INDEX IF NOT EXISTS idx_seo_page ON seo_records(page_type, identifier);

-- Business listings (category pages)
CREATE TABLE IF NOT EXISTS listings (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    slug       TEXT NOT NULL,
    parent     TEXT,
    is_active  INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_listings_active ON listings(is_active);

-- Company profiles (enumerated independently of listings)
CREATE TABLE IF NOT EXISTS companies (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    slug       TEXT NOT NULL,
    updated_at TEXT
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
