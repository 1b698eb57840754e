//! mdpreview - markdown preview in the browser.
//!
//! Usage:
//!   mdpreview open README.md [--no-browser]   # Render and open in the browser
//!   mdpreview serve [--port 3000]             # Start an empty preview server

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mdpreview::{browser, render, PreviewServer, ServerConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mdpreview")]
#[command(about = "Preview markdown files in your browser over a local server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render markdown files and open them in the browser
    Open {
        /// Markdown files to preview
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        server: ServerArgs,

        /// Print preview URLs without launching a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Start an empty preview server
    Serve {
        #[command(flatten)]
        server: ServerArgs,
    },
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Preferred port to listen on (falls back to the next free one)
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Maximum number of concurrent preview sessions
    #[arg(long, default_value = "50")]
    max_sessions: usize,

    /// Minutes of inactivity before a session expires
    #[arg(long, default_value = "30")]
    session_timeout: u64,
}

impl ServerArgs {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            max_sessions: self.max_sessions,
            session_timeout_minutes: self.session_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Commands::Open {
            files,
            server,
            no_browser,
        } => open(files, server.into_config(), no_browser).await,
        Commands::Serve { server } => serve(server.into_config()).await,
    }
}

async fn open(files: Vec<PathBuf>, config: ServerConfig, no_browser: bool) -> anyhow::Result<()> {
    let server = PreviewServer::new(config);
    server.start().await?;

    for file in &files {
        let source = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        let html = render::render_document(&source);
        let id = server.register_preview(html, file).await;
        let url = server.preview_url(&id).await;
        println!("{}  {}", url, file.display());

        if !no_browser {
            if let Err(err) = browser::open_in_browser(&url) {
                warn!(%err, "could not launch a browser, open the URL above manually");
            }
        }
    }

    wait_for_shutdown(&server).await
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = PreviewServer::new(config);
    server.start().await?;
    println!("{}", serde_json::to_string_pretty(&server.status().await)?);
    wait_for_shutdown(&server).await
}

async fn wait_for_shutdown(server: &PreviewServer) -> anyhow::Result<()> {
    info!("press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    server.stop().await;
    Ok(())
}
