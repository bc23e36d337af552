//! Framedash web server entry point.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use framedash_core::FramedashConfig;
use framedash_web::logging::init_logging;
use framedash_web::ShellServer;

/// Serve a dashboard shell for one dashboard document.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server settings file (TOML)
    #[arg(short, long, env = "FRAMEDASH_SETTINGS")]
    settings: Option<PathBuf>,

    /// Dashboard document: file path or http(s) URL
    #[arg(short, long, env = "FRAMEDASH_DOCUMENT")]
    document: Option<String>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under /_shell/assets
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Do not reload the document when the file changes
    #[arg(long, default_value_t = false)]
    no_watch: bool,

    /// Logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Main entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = FramedashConfig::load_or_default(args.settings.as_deref())?;
    if let Some(document) = args.document {
        config.document.source = document;
    }
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(dir) = args.assets_dir {
        config.document.assets_dir = Some(dir);
    }
    if args.no_watch {
        config.document.watch = false;
    }

    init_logging(&config.logging, args.verbose);
    info!("Starting Framedash web server...");

    ShellServer::new(config).await?.run().await?;
    Ok(())
}
