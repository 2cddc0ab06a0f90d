//! chatsearch CLI and REST API entry point.
//!
//! Binary name: `chatsearch`
//!
//! Parses CLI arguments, loads configuration, initializes tracing, then
//! dispatches to a command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use chatsearch_infra::config::load_service_config;
use chatsearch_infra::store::ChatStore;
use chatsearch_observe::tracing_setup::{LogFormat, bootstrap_dispatch, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "chatsearch", &mut std::io::stdout());
        return Ok(());
    }

    let format = match (&cli.command, cli.json) {
        (Commands::Serve { .. }, true) => LogFormat::Json,
        _ => LogFormat::Pretty,
    };

    // Config decides the final log level, so loading it logs through a
    // temporary subscriber driven by -v and RUST_LOG.
    let mut config = {
        let bootstrap = bootstrap_dispatch(verbosity_level(cli.verbose).unwrap_or("info"), format);
        let _default = tracing::dispatcher::set_default(&bootstrap);
        load_service_config(cli.config.as_deref()).await?
    };

    let level = verbosity_level(cli.verbose)
        .map(str::to_string)
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, format, config.logging.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(config).await
        }

        Commands::Ask { user, chat, question } => {
            let state = AppState::init(config).await?;
            cli::chat::ask(&state, &user, &chat, &question.join(" "), cli.json).await
        }

        Commands::List { user, title } => {
            let store = open_store(&config).await?;
            cli::chat::list_chats(&store, &user, title.as_deref(), cli.json).await
        }

        Commands::Show { user, chat } => {
            let store = open_store(&config).await?;
            cli::chat::show_chat(&store, &user, &chat, cli.json).await
        }

        Commands::Delete { user, chat } => {
            let store = open_store(&config).await?;
            cli::chat::delete_chats(&store, &user, chat.as_deref(), cli.json).await
        }

        Commands::Stats => {
            let store = open_store(&config).await?;
            cli::chat::stats(&store, cli.json).await
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

/// Log level forced by `-v` flags, if any.
fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

async fn open_store(config: &chatsearch_types::config::ServiceConfig) -> anyhow::Result<ChatStore> {
    ChatStore::open(&config.storage)
        .await
        .with_context(|| format!("failed to open {} chat store", config.storage.backend))
}

async fn serve(config: chatsearch_types::config::ServiceConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::init(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!(
        "  {} chatsearch API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
