//! Wallet ledger server binary.
//!
//! One binary covers the whole container lifecycle: the entrypoint that
//! prepares the database and static assets, and the HTTP server it hands over
//! to.
//!
//! # Usage
//!
//! ```bash
//! # Serve with the in-memory repository
//! wallet-server serve --bind 127.0.0.1:8000
//!
//! # Container entrypoint: migrate, collect static files, then exec the command
//! DATABASE_URL=postgres://user:pass@db:5432/wallets \
//!   wallet-server entrypoint -- wallet-server serve --bind 0.0.0.0:8000
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` / `PORT`: Bind address when `--bind` is not given (default: 0.0.0.0:8000)
//! - `DATABASE_URL` or `POSTGRES_*` / `DB_HOST` / `DB_PORT`: Postgres connection
//! - `REPOSITORY_TYPE`: `postgres` or `local`
//! - `STATIC_SOURCE_DIR` / `STATIC_ROOT`: static asset source and served directory
//! - `PAGE_SIZE`: default list page size
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use b2b_wallet::config::ServerConfig;
use b2b_wallet::db::{self, services, FullRepository, RepositoryFactory};
use b2b_wallet::entrypoint::{self, Handoff};
use b2b_wallet::http::{create_router, shutdown_signal, AppState};
use b2b_wallet::logging::init_logging;

/// B2B wallet ledger: JSON:API server and container entrypoint
#[derive(Parser, Debug)]
#[command(name = "wallet-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Copy static assets into the served directory
    Collectstatic {
        /// Directory to copy from (default: STATIC_SOURCE_DIR or ./static)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Directory to copy into (default: STATIC_ROOT or ./staticfiles)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Migrate, collect static files, then exec the given command
    Entrypoint {
        /// Command and arguments to hand over to
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

async fn open_repository() -> anyhow::Result<Arc<dyn FullRepository>> {
    let repository = RepositoryFactory::from_env()
        .await
        .context("Failed to initialize repository")?;
    info!(backend = ?db::RepositoryType::from_env(), "Repository initialized");
    Ok(repository)
}

async fn serve(config: ServerConfig, repository: Arc<dyn FullRepository>) -> anyhow::Result<()> {
    let state = AppState::from_config(repository, &config);
    let app = create_router(state);

    info!("Server listening on http://{}", config.bind);
    info!("API schema: http://{}/api/schema/", config.bind);

    let shutdown = shutdown_signal().context("Failed to install signal handlers")?;
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut config = ServerConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            info!("Starting wallet server");
            let repository = open_repository().await?;
            serve(config, repository).await
        }
        Commands::Migrate => {
            let repository = open_repository().await?;
            let applied = services::migrate(repository.as_ref()).await?;
            info!(count = applied.len(), "Migrate finished");
            Ok(())
        }
        Commands::Collectstatic { source, root } => {
            let source = source.unwrap_or(config.static_source);
            let root = root.unwrap_or(config.static_root);
            let copied = entrypoint::collect_static(&source, &root)?;
            info!(copied, root = %root.display(), "Collectstatic finished");
            Ok(())
        }
        Commands::Entrypoint { command } => {
            let repository = open_repository().await?;
            let handoff = entrypoint::run_entrypoint(
                repository.as_ref(),
                &config.static_source,
                &config.static_root,
                &command,
            )
            .await?;

            match handoff {
                Handoff::ServeInProcess => serve(config, repository).await,
            }
        }
    }
}
