//! Wallet repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewWallet, Wallet, WalletId};
use crate::query::{Page, PageRequest, WalletQuery};

/// Storage operations for wallets.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Create a wallet.
    ///
    /// # Returns
    /// * `Ok(Wallet)` - The stored wallet with its assigned id
    /// * `Err(RepositoryError::ValidationError)` - If the label is already taken
    ///   or the opening balance is negative
    async fn create_wallet(&self, wallet: NewWallet) -> RepositoryResult<Wallet>;

    /// Retrieve a wallet by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the wallet doesn't exist
    async fn get_wallet(&self, wallet_id: WalletId) -> RepositoryResult<Wallet>;

    /// List wallets matching `query`, ordered and paginated.
    async fn list_wallets(
        &self,
        query: &WalletQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Wallet>>;

    /// Change a wallet's label. The balance is never touched.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the wallet doesn't exist
    /// * `Err(RepositoryError::ValidationError)` - If the label is already taken
    async fn rename_wallet(&self, wallet_id: WalletId, label: String) -> RepositoryResult<Wallet>;

    /// Delete a wallet together with all of its transactions.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the wallet doesn't exist
    async fn delete_wallet(&self, wallet_id: WalletId) -> RepositoryResult<()>;
}
