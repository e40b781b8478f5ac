//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use bizdir_seo::{SeoRequest, resolve_seo, upsert_seo_record};
use bizdir_shared::{
    ApiResponse, AppConfig, SeoRecord, config_file_path, init_config, load_config,
    resolve_db_path, validate_base_url,
};
use bizdir_storage::Storage;
use bizdir_tabs::{
    bind_tab, create_custom_tab, ensure_system_tabs, list_tab_kinds, resolve_tabs_for_page,
    system_tab_definitions, unbind_tab,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BizDir — business directory publishing core.
#[derive(Parser)]
#[command(
    name = "bizdir",
    version,
    about = "Seed tab kinds, resolve SEO metadata, and generate sitemap artifacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Sitemap output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum SitemapFormat {
    Xml,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Seed the built-in system tab kinds (idempotent).
    SeedTabs,

    /// Tab registry operations.
    Tabs {
        #[command(subcommand)]
        action: TabsAction,
    },

    /// SEO metadata operations.
    Seo {
        #[command(subcommand)]
        action: SeoAction,
    },

    /// Generate the sitemap document.
    Sitemap {
        /// Output format.
        #[arg(long, default_value = "xml")]
        format: SitemapFormat,

        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate robots.txt.
    Robots,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Tab registry subcommands.
#[derive(Subcommand)]
pub(crate) enum TabsAction {
    /// List all tab kinds in display order.
    List,
    /// Create an admin-defined tab kind.
    Create {
        /// Tab kind id (must be unused).
        #[arg(long)]
        id: String,
        /// Display label.
        #[arg(long)]
        label: String,
        /// Icon name for the rendering layer.
        #[arg(long, default_value = "circle")]
        icon: String,
        /// Display position.
        #[arg(long, default_value_t = 100)]
        order: i64,
        /// Creating administrator.
        #[arg(long, default_value = "admin")]
        by: String,
    },
    /// Attach a content fragment to a page's tab.
    Bind {
        /// Page identifier (e.g. company:acme).
        #[arg(long)]
        page: String,
        /// Tab kind id.
        #[arg(long)]
        tab: String,
        /// Content fragment id.
        #[arg(long)]
        content: String,
    },
    /// Detach a tab from a page.
    Unbind {
        /// Page identifier.
        #[arg(long)]
        page: String,
        /// Tab kind id.
        #[arg(long)]
        tab: String,
    },
    /// Show the ordered, bound tab view for a page.
    Resolve {
        /// Page identifier.
        #[arg(long)]
        page: String,
    },
}

/// SEO subcommands.
#[derive(Subcommand)]
pub(crate) enum SeoAction {
    /// Resolve the effective SEO record for a page descriptor.
    Resolve {
        /// Page type: home, category, company, route, ...
        #[arg(long = "type")]
        page_type: String,
        /// Page identity within the type.
        #[arg(long)]
        identifier: String,
        /// Sub-tab within the page.
        #[arg(long)]
        tab: Option<String>,
        /// Request path used for canonical/robots derivation.
        #[arg(long, default_value = "/")]
        path: String,
        /// Raw query string used for canonical derivation.
        #[arg(long)]
        query: Option<String>,
    },
    /// Create or update an SEO record.
    Set {
        #[arg(long = "type")]
        page_type: String,
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        tab: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated keyword list.
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long)]
        robots: Option<String>,
        #[arg(long)]
        canonical: Option<String>,
        #[arg(long, default_value = "")]
        lang: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bizdir=info",
        1 => "bizdir=debug",
        _ => "bizdir=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::SeedTabs => cmd_seed_tabs().await,
        Command::Tabs { action } => match action {
            TabsAction::List => cmd_tabs_list().await,
            TabsAction::Create {
                id,
                label,
                icon,
                order,
                by,
            } => cmd_tabs_create(&id, &label, &icon, order, &by).await,
            TabsAction::Bind { page, tab, content } => cmd_tabs_bind(&page, &tab, &content).await,
            TabsAction::Unbind { page, tab } => cmd_tabs_unbind(&page, &tab).await,
            TabsAction::Resolve { page } => cmd_tabs_resolve(&page).await,
        },
        Command::Seo { action } => match action {
            SeoAction::Resolve {
                page_type,
                identifier,
                tab,
                path,
                query,
            } => cmd_seo_resolve(&page_type, &identifier, tab.as_deref(), &path, query.as_deref()).await,
            SeoAction::Set {
                page_type,
                identifier,
                tab,
                title,
                description,
                keywords,
                robots,
                canonical,
                lang,
            } => {
                cmd_seo_set(SeoRecord {
                    page_type,
                    identifier,
                    tab,
                    title,
                    description,
                    keywords: keywords
                        .map(|list| {
                            list.split(',')
                                .map(|k| k.trim().to_string())
                                .filter(|k| !k.is_empty())
                                .collect()
                        })
                        .unwrap_or_default(),
                    robots,
                    canonical,
                    lang,
                })
                .await
            }
        },
        Command::Sitemap { format, out } => cmd_sitemap(format, out.as_deref()).await,
        Command::Robots => cmd_robots().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Store access
// ---------------------------------------------------------------------------

/// Load config, validate it, and open the store read-write.
async fn open_store() -> Result<(AppConfig, Storage)> {
    let config = load_config()?;
    validate_base_url(&config)?;
    let db_path = resolve_db_path(&config)?;
    let store = Storage::open(&db_path).await?;
    Ok((config, store))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_seed_tabs() -> Result<()> {
    let (_, store) = open_store().await?;
    let report = ensure_system_tabs(&store, &system_tab_definitions()).await?;

    println!("System tab seeding complete.");
    println!("  Created: {}", report.created.join(", "));
    println!("  Skipped: {}", report.skipped.join(", "));
    Ok(())
}

async fn cmd_tabs_list() -> Result<()> {
    let (_, store) = open_store().await?;
    let kinds = list_tab_kinds(&store).await?;

    if kinds.is_empty() {
        println!("No tab kinds registered. Run `bizdir seed-tabs` first.");
        return Ok(());
    }

    for kind in kinds {
        println!(
            "  {:<20} {:<24} [{}] order={}",
            kind.tab_id,
            kind.label,
            kind.origin.as_str(),
            kind.sort_order
        );
    }
    Ok(())
}

async fn cmd_tabs_create(id: &str, label: &str, icon: &str, order: i64, by: &str) -> Result<()> {
    let (_, store) = open_store().await?;
    let kind = create_custom_tab(&store, id, label, icon, order, by).await?;
    println!("Created custom tab '{}' ({}).", kind.tab_id, kind.label);
    Ok(())
}

async fn cmd_tabs_bind(page: &str, tab: &str, content: &str) -> Result<()> {
    let (_, store) = open_store().await?;
    bind_tab(&store, page, tab, content).await?;
    info!(page, tab, content, "tab bound");
    println!("Bound '{tab}' on '{page}' to fragment '{content}'.");
    Ok(())
}

async fn cmd_tabs_unbind(page: &str, tab: &str) -> Result<()> {
    let (_, store) = open_store().await?;
    unbind_tab(&store, page, tab).await?;
    println!("Unbound '{tab}' on '{page}'.");
    Ok(())
}

async fn cmd_tabs_resolve(page: &str) -> Result<()> {
    let (_, store) = open_store().await?;
    let tabs = resolve_tabs_for_page(&store, page).await?;
    println!("{}", serde_json::to_string_pretty(&tabs)?);
    Ok(())
}

async fn cmd_seo_resolve(
    page_type: &str,
    identifier: &str,
    tab: Option<&str>,
    path: &str,
    query: Option<&str>,
) -> Result<()> {
    let (config, store) = open_store().await?;
    let request = SeoRequest {
        page_type,
        identifier,
        tab,
        path,
        query,
    };

    // Print the same envelope the web layer forwards.
    let envelope = match resolve_seo(&store, &config.site, &request).await {
        Ok(resolved) => ApiResponse::ok(resolved),
        Err(e) => ApiResponse::err(e.to_string()),
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

async fn cmd_seo_set(record: SeoRecord) -> Result<()> {
    let (config, store) = open_store().await?;
    let stored = upsert_seo_record(&store, &config.site, record).await?;
    println!("{}", serde_json::to_string_pretty(&ApiResponse::ok(stored))?);
    Ok(())
}

async fn cmd_sitemap(format: SitemapFormat, out: Option<&std::path::Path>) -> Result<()> {
    let (config, store) = open_store().await?;
    let sitemap = bizdir_sitemap::assemble(&store, &config.site.base_url).await?;

    info!(total = sitemap.total_urls(), "sitemap assembled");

    let body = match format {
        SitemapFormat::Xml => bizdir_sitemap::render_xml(&sitemap),
        SitemapFormat::Json => bizdir_sitemap::render_json(&sitemap)?,
    };

    match out {
        Some(path) => {
            std::fs::write(path, &body)
                .map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;
            println!("Wrote {} URLs to {}", sitemap.total_urls(), path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

async fn cmd_robots() -> Result<()> {
    let config = load_config()?;
    validate_base_url(&config)?;
    print!(
        "{}",
        bizdir_sitemap::robots_txt(&config.site.base_url, config.site.crawl_delay_secs)
    );
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    println!("# {}", config_file_path()?.display());
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
