//! Schema migration trait.

use async_trait::async_trait;

use super::error::RepositoryResult;

/// Backends that own a schema apply their pending migrations here.
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Apply all pending migrations, returning the versions that were applied.
    ///
    /// Running it again once the schema is current applies nothing.
    async fn run_migrations(&self) -> RepositoryResult<Vec<String>>;
}
