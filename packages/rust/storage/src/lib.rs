//! libSQL storage layer for the BizDir document collections.
//!
//! The [`Storage`] struct wraps a libSQL database holding the tab-kind
//! catalog, per-page tab maps, SEO records, business listings, and company
//! profiles. Lookups are case-sensitive string matches; writes are
//! last-writer-wins upserts keyed by the documented uniqueness keys
//! (`tab_id`; `page_id`; `(page_type, identifier, tab)`), each applied as a
//! single statement so a logical write is atomic from the caller's view.
//!
//! **Access rules:**
//! - Admin/CLI surface: read-write via [`Storage::open`]
//! - Request-serving collaborators: read-only via [`Storage::open_readonly`]

mod migrations;

use std::collections::BTreeMap;
use std::path::Path;

use bizdir_shared::{
    BizdirError, CompanyRecord, ListingRecord, PageTabs, Result, SeoRecord, TabKind, TabOrigin,
};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BizdirError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        BizdirError::Store(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(BizdirError::Store(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tab kind operations
    // -----------------------------------------------------------------------

    /// Insert a tab kind iff no kind with that `tab_id` exists.
    ///
    /// Returns `true` when the row was created, `false` when an existing
    /// record was left untouched. Seeding relies on this never overwriting
    /// a customized label or icon.
    pub async fn insert_tab_kind_if_absent(&self, kind: &TabKind) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn
            .execute(
                "INSERT INTO tab_kinds (tab_id, label, icon, origin, sort_order, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(tab_id) DO NOTHING",
                params![
                    kind.tab_id.as_str(),
                    kind.label.as_str(),
                    kind.icon.as_str(),
                    kind.origin.as_str(),
                    kind.sort_order,
                    kind.created_by.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(affected > 0)
    }

    /// Upsert a tab kind (admin mutation; last-writer-wins on `tab_id`).
    pub async fn upsert_tab_kind(&self, kind: &TabKind) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO tab_kinds (tab_id, label, icon, origin, sort_order, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(tab_id) DO UPDATE SET
                   label = excluded.label,
                   icon = excluded.icon,
                   origin = excluded.origin,
                   sort_order = excluded.sort_order,
                   created_by = excluded.created_by",
                params![
                    kind.tab_id.as_str(),
                    kind.label.as_str(),
                    kind.icon.as_str(),
                    kind.origin.as_str(),
                    kind.sort_order,
                    kind.created_by.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(())
    }

    /// Get a tab kind by id.
    pub async fn get_tab_kind(&self, tab_id: &str) -> Result<Option<TabKind>> {
        let mut rows = self
            .conn
            .query(
                "SELECT tab_id, label, icon, origin, sort_order, created_by
                 FROM tab_kinds WHERE tab_id = ?1",
                params![tab_id],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_tab_kind(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(BizdirError::Store(e.to_string())),
        }
    }

    /// List all tab kinds, ordered by `sort_order` then `tab_id`.
    pub async fn list_tab_kinds(&self) -> Result<Vec<TabKind>> {
        let mut rows = self
            .conn
            .query(
                "SELECT tab_id, label, icon, origin, sort_order, created_by
                 FROM tab_kinds ORDER BY sort_order, tab_id",
                params![],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_tab_kind(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Page tab map operations
    // -----------------------------------------------------------------------

    /// Get a page's tab map, or `None` if the page has never selected a tab.
    pub async fn get_page_tabs(&self, page_id: &str) -> Result<Option<PageTabs>> {
        let mut rows = self
            .conn
            .query(
                "SELECT page_id, tabs_json FROM page_tabs WHERE page_id = ?1",
                params![page_id],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let page_id: String = row
                    .get(0)
                    .map_err(|e| BizdirError::Store(e.to_string()))?;
                let tabs_json: String = row
                    .get(1)
                    .map_err(|e| BizdirError::Store(e.to_string()))?;
                let tabs: BTreeMap<String, Option<String>> = serde_json::from_str(&tabs_json)
                    .map_err(|e| {
                        BizdirError::Store(format!("invalid tab map for '{page_id}': {e}"))
                    })?;
                Ok(Some(PageTabs { page_id, tabs }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(BizdirError::Store(e.to_string())),
        }
    }

    /// Upsert a page's tab map (single statement, keyed by `page_id`).
    pub async fn upsert_page_tabs(&self, page: &PageTabs) -> Result<()> {
        self.check_writable()?;
        let tabs_json = serde_json::to_string(&page.tabs)
            .map_err(|e| BizdirError::Store(format!("tab map serialization failed: {e}")))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO page_tabs (page_id, tabs_json, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(page_id) DO UPDATE SET
                   tabs_json = excluded.tabs_json,
                   updated_at = excluded.updated_at",
                params![page.page_id.as_str(), tabs_json.as_str(), now.as_str()],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // SEO record operations
    // -----------------------------------------------------------------------

    /// Get the SEO record for `(page_type, identifier, tab)`.
    ///
    /// `tab = None` fetches the page-level record. Lookups are exact,
    /// case-sensitive string matches.
    pub async fn get_seo_record(
        &self,
        page_type: &str,
        identifier: &str,
        tab: Option<&str>,
    ) -> Result<Option<SeoRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT page_type, identifier, tab, title, description, keywords_json, robots, canonical, lang
                 FROM seo_records WHERE page_type = ?1 AND identifier = ?2 AND tab = ?3",
                params![page_type, identifier, tab.unwrap_or("")],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_seo_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(BizdirError::Store(e.to_string())),
        }
    }

    /// Upsert an SEO record on its `(page_type, identifier, tab)` key.
    pub async fn upsert_seo_record(&self, record: &SeoRecord) -> Result<()> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let keywords_json = serde_json::to_string(&record.keywords)
            .map_err(|e| BizdirError::Store(format!("keyword serialization failed: {e}")))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO seo_records (id, page_type, identifier, tab, title, description, keywords_json, robots, canonical, lang, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(page_type, identifier, tab) DO UPDATE SET
                   title = excluded.title,
                   description = excluded.description,
                   keywords_json = excluded.keywords_json,
                   robots = excluded.robots,
                   canonical = excluded.canonical,
                   lang = excluded.lang,
                   updated_at = excluded.updated_at",
                params![
                    id.as_str(),
                    record.page_type.as_str(),
                    record.identifier.as_str(),
                    record.tab.as_deref().unwrap_or(""),
                    record.title.as_str(),
                    record.description.as_str(),
                    keywords_json.as_str(),
                    record.robots.as_deref(),
                    record.canonical.as_deref(),
                    record.lang.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Listing operations
    // -----------------------------------------------------------------------

    /// Upsert a business listing by id.
    pub async fn upsert_listing(&self, listing: &ListingRecord) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO listings (id, name, slug, parent, is_active, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   slug = excluded.slug,
                   parent = excluded.parent,
                   is_active = excluded.is_active,
                   updated_at = excluded.updated_at",
                params![
                    listing.id.as_str(),
                    listing.name.as_str(),
                    listing.slug.as_str(),
                    listing.parent.as_deref(),
                    listing.is_active as i64,
                    listing.updated_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(())
    }

    /// List active business listings, ordered by `(slug, id)` so repeated
    /// sitemap assemblies over unchanged data are byte-identical.
    pub async fn list_active_listings(&self) -> Result<Vec<ListingRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, slug, parent, is_active, updated_at
                 FROM listings WHERE is_active = 1 ORDER BY slug, id",
                params![],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_listing(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Company operations
    // -----------------------------------------------------------------------

    /// Upsert a company profile by id.
    pub async fn upsert_company(&self, company: &CompanyRecord) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO companies (id, name, slug, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   slug = excluded.slug,
                   updated_at = excluded.updated_at",
                params![
                    company.id.as_str(),
                    company.name.as_str(),
                    company.slug.as_str(),
                    company.updated_at.map(|t| t.to_rfc3339()),
                ],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;
        Ok(())
    }

    /// List all company profiles (no active-flag filter), ordered by
    /// `(slug, id)`.
    pub async fn list_companies(&self) -> Result<Vec<CompanyRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, slug, updated_at FROM companies ORDER BY slug, id",
                params![],
            )
            .await
            .map_err(|e| BizdirError::Store(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_company(&row)?);
        }
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

/// Convert a database row to a [`TabKind`].
fn row_to_tab_kind(row: &libsql::Row) -> Result<TabKind> {
    let origin_raw: String = row
        .get(3)
        .map_err(|e| BizdirError::Store(e.to_string()))?;
    let origin: TabOrigin = origin_raw
        .parse()
        .map_err(|e: String| BizdirError::Store(e))?;

    Ok(TabKind {
        tab_id: row
            .get::<String>(0)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        label: row
            .get::<String>(1)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        icon: row
            .get::<String>(2)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        origin,
        sort_order: row
            .get::<i64>(4)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        created_by: row
            .get::<String>(5)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
    })
}

/// Convert a database row to a [`SeoRecord`]. The `''` tab column value
/// maps back to `None`.
fn row_to_seo_record(row: &libsql::Row) -> Result<SeoRecord> {
    let tab: String = row
        .get(2)
        .map_err(|e| BizdirError::Store(e.to_string()))?;
    let keywords_json: String = row
        .get(5)
        .map_err(|e| BizdirError::Store(e.to_string()))?;
    let keywords: Vec<String> = serde_json::from_str(&keywords_json)
        .map_err(|e| BizdirError::Store(format!("invalid keyword list: {e}")))?;

    Ok(SeoRecord {
        page_type: row
            .get::<String>(0)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        identifier: row
            .get::<String>(1)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        tab: (!tab.is_empty()).then_some(tab),
        title: row
            .get::<String>(3)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        description: row
            .get::<String>(4)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        keywords,
        robots: row.get::<String>(6).ok(),
        canonical: row.get::<String>(7).ok(),
        lang: row
            .get::<String>(8)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
    })
}

/// Convert a database row to a [`ListingRecord`].
fn row_to_listing(row: &libsql::Row) -> Result<ListingRecord> {
    Ok(ListingRecord {
        id: row
            .get::<String>(0)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        name: row
            .get::<String>(1)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        slug: row
            .get::<String>(2)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        parent: row.get::<String>(3).ok(),
        is_active: row
            .get::<i64>(4)
            .map_err(|e| BizdirError::Store(e.to_string()))?
            != 0,
        updated_at: parse_optional_timestamp(row, 5)?,
    })
}

/// Convert a database row to a [`CompanyRecord`].
fn row_to_company(row: &libsql::Row) -> Result<CompanyRecord> {
    Ok(CompanyRecord {
        id: row
            .get::<String>(0)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        name: row
            .get::<String>(1)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        slug: row
            .get::<String>(2)
            .map_err(|e| BizdirError::Store(e.to_string()))?,
        updated_at: parse_optional_timestamp(row, 3)?,
    })
}

/// Parse a nullable RFC 3339 column into an optional UTC timestamp.
fn parse_optional_timestamp(row: &libsql::Row, idx: i32) -> Result<Option<DateTime<Utc>>> {
    match row.get::<String>(idx) {
        Ok(s) => {
            let parsed = DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| BizdirError::Store(format!("invalid date: {e}")))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
