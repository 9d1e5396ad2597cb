//! Container start-up: migrate, collect static assets, hand over.
//!
//! The steps run strictly in order and the first failure aborts the rest, so
//! the server never starts against an unmigrated schema or without its
//! assets.

pub mod process;
pub mod static_files;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::repository::MigrationRepository;

pub use process::exec_command;
pub use static_files::collect_static;

/// What the entrypoint did before handing over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preparation {
    /// Migration versions applied in this run
    pub migrations: Vec<String>,
    /// Number of static files copied
    pub static_files: usize,
}

/// Apply pending migrations, then collect static assets.
pub async fn prepare<M: MigrationRepository + ?Sized>(
    migrator: &M,
    static_source: &Path,
    static_root: &Path,
) -> Result<Preparation> {
    info!("Applying database migrations");
    let migrations = migrator
        .run_migrations()
        .await
        .context("Database migration failed")?;
    info!(applied = migrations.len(), "Migrations complete");

    info!(
        source = %static_source.display(),
        root = %static_root.display(),
        "Collecting static files"
    );
    let static_files =
        collect_static(static_source, static_root).context("Static file collection failed")?;
    info!(copied = static_files, "Static files collected");

    Ok(Preparation {
        migrations,
        static_files,
    })
}

/// How control continues after preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// No command was given: serve in this process
    ServeInProcess,
}

/// Run the full entrypoint: [`prepare`], then exec `argv`.
///
/// With a command this only returns on error. With an empty `argv` it returns
/// [`Handoff::ServeInProcess`] and the caller starts the server itself.
pub async fn run_entrypoint<M: MigrationRepository + ?Sized>(
    migrator: &M,
    static_source: &Path,
    static_root: &Path,
    argv: &[String],
) -> Result<Handoff> {
    prepare(migrator, static_source, static_root).await?;

    if argv.is_empty() {
        return Ok(Handoff::ServeInProcess);
    }
    Err(exec_command(argv))
}
