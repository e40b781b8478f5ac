//! BizDir CLI — operational surface for the directory publishing core.
//!
//! Seeds the tab registry, inspects SEO resolution, and generates the
//! sitemap and robots.txt payloads the web layer serves.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
