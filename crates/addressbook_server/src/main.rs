//! Address Book server
//!
//! Serves the contacts API over the configured PII and general stores

use addressbook_server::{ServerConfig, start_server};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "addressbook-server")]
#[command(about = "Region-aware address book server")]
#[command(version)]
struct Cli {
    /// Path to the server config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .with_syntax_highlighting(miette::highlighters::SyntectHighlighter::default())
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("addressbook_core=debug,addressbook_api=debug,addressbook_server=debug,tower_http=debug")
    } else {
        EnvFilter::new("addressbook_core=info,addressbook_api=info,addressbook_server=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .pretty()
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading config from: {:?}", path);
            ServerConfig::load(path).await?
        }
        None => {
            tracing::info!("No config file given, using defaults");
            ServerConfig::default().with_env_overrides()
        }
    };

    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    start_server(config).await?;

    Ok(())
}
