//! Tab composition registry.
//!
//! Owns the catalog of tab kinds (system-defined and custom) and the
//! per-page mapping from tab kind to the content fragment that fills it.
//! Seeding is idempotent and resolution is tolerant: a page render never
//! fails because a kind was removed or not yet seeded; unknown ids and
//! missing bindings degrade to "tab absent".

use bizdir_shared::{BizdirError, PageTabs, Result, TabKind, TabOrigin};
use bizdir_storage::Storage;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// `created_by` value for seeded definitions.
pub const SYSTEM_AUTHOR: &str = "system";

/// The built-in tab definitions seeded at bootstrap.
///
/// Existing records always win over these: reseeding after an
/// administrator relabels a tab must not undo the customization.
pub fn system_tab_definitions() -> Vec<TabKind> {
    let defs = [
        ("about", "About", "info", 10),
        ("contact-numbers", "Contact Numbers", "phone", 20),
        ("products-services", "Products & Services", "box", 30),
        ("gallery", "Photo Gallery", "image", 40),
        ("opening-hours", "Opening Hours", "clock", 50),
        ("directions", "Map & Directions", "map", 60),
    ];

    defs.into_iter()
        .map(|(tab_id, label, icon, sort_order)| TabKind {
            tab_id: tab_id.into(),
            label: label.into(),
            icon: icon.into(),
            origin: TabOrigin::System,
            sort_order,
            created_by: SYSTEM_AUTHOR.into(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Per-definition outcome of a seeding pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    /// Definitions inserted by this pass.
    pub created: Vec<String>,
    /// Definitions that already existed and were left untouched.
    pub skipped: Vec<String>,
}

/// Idempotently seed the registry with the given definitions.
///
/// Each definition is inserted iff no kind with that `tab_id` exists;
/// "already exists" is reported as skipped, never as an error.
#[instrument(skip_all, fields(definitions = definitions.len()))]
pub async fn ensure_system_tabs(store: &Storage, definitions: &[TabKind]) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for definition in definitions {
        if store.insert_tab_kind_if_absent(definition).await? {
            report.created.push(definition.tab_id.clone());
        } else {
            report.skipped.push(definition.tab_id.clone());
        }
    }

    info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        "system tab seeding complete"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// List all tab kinds, ordered by `sort_order` ascending, ties broken by
/// `tab_id` lexical order.
pub async fn list_tab_kinds(store: &Storage) -> Result<Vec<TabKind>> {
    store.list_tab_kinds().await
}

/// Create an admin-defined tab kind. The id must be unused.
#[instrument(skip(store))]
pub async fn create_custom_tab(
    store: &Storage,
    tab_id: &str,
    label: &str,
    icon: &str,
    sort_order: i64,
    created_by: &str,
) -> Result<TabKind> {
    if tab_id.trim().is_empty() {
        return Err(BizdirError::validation("tab_id must not be empty"));
    }
    if label.trim().is_empty() {
        return Err(BizdirError::validation("label must not be empty"));
    }

    let kind = TabKind {
        tab_id: tab_id.into(),
        label: label.into(),
        icon: icon.into(),
        origin: TabOrigin::Custom,
        sort_order,
        created_by: created_by.into(),
    };

    if !store.insert_tab_kind_if_absent(&kind).await? {
        return Err(BizdirError::validation(format!(
            "tab kind '{tab_id}' already exists"
        )));
    }
    Ok(kind)
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Attach a content fragment to a page's tab.
///
/// The fragment is owned by external collaborators; only its id is stored.
/// Fails with `NotFound` when `tab_id` is not in the registry.
#[instrument(skip(store))]
pub async fn bind_tab(
    store: &Storage,
    page_id: &str,
    tab_id: &str,
    content_ref: &str,
) -> Result<()> {
    if page_id.trim().is_empty() {
        return Err(BizdirError::validation("page_id must not be empty"));
    }
    if content_ref.trim().is_empty() {
        return Err(BizdirError::validation("content_ref must not be empty"));
    }
    if store.get_tab_kind(tab_id).await?.is_none() {
        return Err(BizdirError::not_found(format!("tab kind '{tab_id}'")));
    }

    let mut page = store
        .get_page_tabs(page_id)
        .await?
        .unwrap_or_else(|| PageTabs::new(page_id));
    page.tabs.insert(tab_id.into(), Some(content_ref.into()));
    store.upsert_page_tabs(&page).await?;

    debug!(page_id, tab_id, "tab bound");
    Ok(())
}

/// Detach a tab from a page. The underlying content fragment is not
/// deleted; cleanup belongs to whoever owns the fragment. No-op when the
/// tab was never bound.
#[instrument(skip(store))]
pub async fn unbind_tab(store: &Storage, page_id: &str, tab_id: &str) -> Result<()> {
    let Some(mut page) = store.get_page_tabs(page_id).await? else {
        debug!(page_id, tab_id, "page has no tab map, nothing to unbind");
        return Ok(());
    };

    if page.tabs.remove(tab_id).is_none() {
        debug!(page_id, tab_id, "tab not bound, nothing to unbind");
        return Ok(());
    }

    store.upsert_page_tabs(&page).await?;
    debug!(page_id, tab_id, "tab unbound");
    Ok(())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A tab that should render for a page: the kind plus its bound content
/// fragment id, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTab {
    pub kind: TabKind,
    /// `None` for a tab that is configured but has no content attached.
    pub content_ref: Option<String>,
}

/// Compute the ordered, bound tab view for a page.
///
/// The page's stored selection is intersected with the current registry;
/// ids no longer in the registry are dropped silently so a deselected
/// kind never breaks existing pages.
#[instrument(skip(store))]
pub async fn resolve_tabs_for_page(store: &Storage, page_id: &str) -> Result<Vec<ResolvedTab>> {
    let Some(page) = store.get_page_tabs(page_id).await? else {
        return Ok(Vec::new());
    };

    let kinds = store.list_tab_kinds().await?;
    let known: usize = kinds
        .iter()
        .filter(|k| page.tabs.contains_key(&k.tab_id))
        .count();
    if known < page.tabs.len() {
        debug!(
            page_id,
            dropped = page.tabs.len() - known,
            "page references tab kinds no longer in the registry"
        );
    }

    let resolved = kinds
        .into_iter()
        .filter_map(|kind| {
            page.tabs.get(&kind.tab_id).map(|content_ref| ResolvedTab {
                content_ref: content_ref.clone(),
                kind,
            })
        })
        .collect();
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("bizdir_tabs_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = test_storage().await;
        let defs = system_tab_definitions();

        let first = ensure_system_tabs(&store, &defs).await.expect("first seed");
        assert_eq!(first.created.len(), defs.len());
        assert!(first.skipped.is_empty());

        let second = ensure_system_tabs(&store, &defs).await.expect("second seed");
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), defs.len());

        let catalog = list_tab_kinds(&store).await.expect("list");
        assert_eq!(catalog.len(), defs.len());
    }

    #[tokio::test]
    async fn reseeding_preserves_customizations() {
        let store = test_storage().await;
        let defs = system_tab_definitions();
        ensure_system_tabs(&store, &defs).await.expect("seed");

        // Admin relabels a system tab.
        let mut customized = defs[0].clone();
        customized.label = "Our Story".into();
        store.upsert_tab_kind(&customized).await.expect("customize");

        ensure_system_tabs(&store, &defs).await.expect("reseed");

        let catalog = list_tab_kinds(&store).await.expect("list");
        let about = catalog
            .iter()
            .find(|k| k.tab_id == defs[0].tab_id)
            .expect("about tab present");
        assert_eq!(about.label, "Our Story");
    }

    #[tokio::test]
    async fn catalog_ordering() {
        let store = test_storage().await;
        ensure_system_tabs(&store, &system_tab_definitions())
            .await
            .expect("seed");
        create_custom_tab(&store, "awards", "Awards", "trophy", 20, "admin@example.com")
            .await
            .expect("custom tab");

        let catalog = list_tab_kinds(&store).await.expect("list");
        let ids: Vec<&str> = catalog.iter().map(|k| k.tab_id.as_str()).collect();
        // sort_order 20 ties between "awards" and "contact-numbers";
        // lexical tab_id order breaks the tie.
        assert_eq!(
            ids,
            [
                "about",
                "awards",
                "contact-numbers",
                "products-services",
                "gallery",
                "opening-hours",
                "directions"
            ]
        );
    }

    #[tokio::test]
    async fn custom_tab_validation() {
        let store = test_storage().await;

        let err = create_custom_tab(&store, "", "Blank", "circle", 10, "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, BizdirError::Validation { .. }));

        create_custom_tab(&store, "awards", "Awards", "trophy", 70, "admin")
            .await
            .expect("create");
        let err = create_custom_tab(&store, "awards", "Awards Again", "trophy", 70, "admin")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn bind_requires_known_tab_kind() {
        let store = test_storage().await;
        ensure_system_tabs(&store, &system_tab_definitions())
            .await
            .expect("seed");

        let err = bind_tab(&store, "company:acme", "reviews", "frag-1")
            .await
            .unwrap_err();
        assert!(matches!(err, BizdirError::NotFound { .. }));

        let err = bind_tab(&store, "company:acme", "about", "")
            .await
            .unwrap_err();
        assert!(matches!(err, BizdirError::Validation { .. }));

        bind_tab(&store, "company:acme", "about", "frag-1")
            .await
            .expect("bind");
    }

    #[tokio::test]
    async fn bind_then_resolve_in_registry_order() {
        let store = test_storage().await;
        ensure_system_tabs(&store, &system_tab_definitions())
            .await
            .expect("seed");

        // Bound out of display order on purpose.
        bind_tab(&store, "company:acme", "gallery", "frag-g").await.unwrap();
        bind_tab(&store, "company:acme", "about", "frag-a").await.unwrap();

        let tabs = resolve_tabs_for_page(&store, "company:acme")
            .await
            .expect("resolve");
        let ids: Vec<&str> = tabs.iter().map(|t| t.kind.tab_id.as_str()).collect();
        assert_eq!(ids, ["about", "gallery"]);
        assert_eq!(tabs[0].content_ref.as_deref(), Some("frag-a"));

        // Rebinding replaces the fragment reference.
        bind_tab(&store, "company:acme", "about", "frag-a2").await.unwrap();
        let tabs = resolve_tabs_for_page(&store, "company:acme").await.unwrap();
        assert_eq!(tabs[0].content_ref.as_deref(), Some("frag-a2"));
    }

    #[tokio::test]
    async fn unbind_is_a_noop_when_absent() {
        let store = test_storage().await;
        ensure_system_tabs(&store, &system_tab_definitions())
            .await
            .expect("seed");

        // No tab map at all.
        unbind_tab(&store, "company:ghost", "about")
            .await
            .expect("unbind without map");

        bind_tab(&store, "company:acme", "about", "frag-a").await.unwrap();
        // Bound tab id differs from the one being unbound.
        unbind_tab(&store, "company:acme", "gallery")
            .await
            .expect("unbind unbound tab");

        unbind_tab(&store, "company:acme", "about").await.expect("unbind");
        let tabs = resolve_tabs_for_page(&store, "company:acme").await.unwrap();
        assert!(tabs.is_empty());
    }

    #[tokio::test]
    async fn resolution_drops_unknown_tab_ids() {
        let store = test_storage().await;
        ensure_system_tabs(&store, &system_tab_definitions())
            .await
            .expect("seed");

        // A stored selection referencing a kind that was removed from the
        // registry, plus a configured-but-empty tab.
        let mut page = PageTabs::new("company:acme");
        page.tabs.insert("discontinued".into(), Some("frag-x".into()));
        page.tabs.insert("about".into(), Some("frag-a".into()));
        page.tabs.insert("gallery".into(), None);
        store.upsert_page_tabs(&page).await.expect("seed page tabs");

        let tabs = resolve_tabs_for_page(&store, "company:acme")
            .await
            .expect("resolve");
        let ids: Vec<&str> = tabs.iter().map(|t| t.kind.tab_id.as_str()).collect();
        assert_eq!(ids, ["about", "gallery"]);
        assert_eq!(tabs[1].content_ref, None);
    }

    #[tokio::test]
    async fn resolution_of_unknown_page_is_empty() {
        let store = test_storage().await;
        let tabs = resolve_tabs_for_page(&store, "company:ghost")
            .await
            .expect("resolve");
        assert!(tabs.is_empty());
    }
}
