//! Shared types, error model, and configuration for BizDir.
//!
//! This crate is the foundation depended on by all other BizDir crates.
//! It provides:
//! - [`BizdirError`], the unified error type
//! - Domain types ([`TabKind`], [`PageTabs`], [`SeoRecord`], [`ListingRecord`], [`CompanyRecord`])
//! - The [`ApiResponse`] wire envelope forwarded by the web layer
//! - Configuration ([`AppConfig`], config loading, env overrides)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ENV_BASE_URL, ENV_DB_PATH, SiteConfig, StoreConfig, apply_env_overrides,
    config_dir, config_file_path, init_config, load_config, load_config_from, resolve_db_path,
    validate_base_url,
};
pub use error::{BizdirError, Result};
pub use types::{
    ApiResponse, CompanyRecord, DEFAULT_LANG, ListingRecord, PageTabs, SeoRecord, TabKind,
    TabOrigin,
};
