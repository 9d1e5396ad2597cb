//! Repository trait definitions for ledger storage.
//!
//! Responsibilities are split across focused traits:
//!
//! - [`error`]: Error types for repository operations
//! - [`wallet`]: Wallet CRUD and health checks
//! - [`transaction`]: Balance-affecting transaction operations
//! - [`migration`]: Schema migrations run by the container entrypoint
//!
//! # Convenience Trait Bound
//!
//! Functions that need every capability take a [`FullRepository`]:
//!
//! ```ignore
//! async fn deposit<R: FullRepository + ?Sized>(repo: &R, tx: NewTransaction) -> RepositoryResult<()> {
//!     repo.create_transaction(tx).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod migration;
pub mod transaction;
pub mod wallet;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use migration::MigrationRepository;
pub use transaction::TransactionRepository;
pub use wallet::WalletRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository: WalletRepository + TransactionRepository + MigrationRepository {}

// Blanket implementation: anything implementing all three traits is a FullRepository
impl<T> FullRepository for T where T: WalletRepository + TransactionRepository + MigrationRepository {}
