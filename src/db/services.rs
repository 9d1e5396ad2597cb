//! High-level ledger service layer.
//!
//! Repository-agnostic operations used by the HTTP handlers. Request-level
//! validation (required fields, lengths, amount precision) happens here, so
//! every backend only ever sees well-formed input; the balance rules
//! themselves are enforced atomically inside the repositories.
//!
//! # Usage
//!
//! ```no_run
//! use b2b_wallet::db::{services, repositories::LocalRepository};
//! use b2b_wallet::query::{PageRequest, WalletQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!
//!     let wallet = services::create_wallet(&repo, Some("Treasury")).await?;
//!     services::create_transaction(&repo, Some(wallet.id), Some("tx-1"), Some("100.5")).await?;
//!
//!     let page = services::list_wallets(&repo, &WalletQuery::default(), PageRequest::default()).await?;
//!     println!("Found {} wallets", page.total);
//!     Ok(())
//! }
//! ```

use tracing::{debug, info};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::validation::{validate_amount, validate_label, validate_txid, FieldError};
use crate::models::{NewTransaction, NewWallet, Transaction, TransactionId, Wallet, WalletId};
use crate::query::{Page, PageRequest, QueryError, TransactionQuery, WalletQuery};

/// Reject pages past the last one.
fn in_range<T>(page: Page<T>, operation: &str) -> RepositoryResult<Page<T>> {
    if page.is_out_of_range() {
        return Err(
            RepositoryError::not_found(QueryError::InvalidPage.to_string()).with_operation(operation),
        );
    }
    Ok(page)
}

// ==================== Health & Connection ====================

/// Check if the storage backend is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Wallet Operations ====================

/// Create a wallet with a zero balance.
///
/// # Errors
/// * Validation error on `label` when it is missing, blank, too long or taken
pub async fn create_wallet<R: FullRepository + ?Sized>(
    repo: &R,
    label: Option<&str>,
) -> RepositoryResult<Wallet> {
    let label = validate_label(label)?;
    let wallet = repo.create_wallet(NewWallet::new(label)).await?;
    info!(wallet_id = %wallet.id, label = %wallet.label, "Created wallet");
    Ok(wallet)
}

/// Fetch one wallet.
pub async fn get_wallet<R: FullRepository + ?Sized>(
    repo: &R,
    wallet_id: WalletId,
) -> RepositoryResult<Wallet> {
    debug!(wallet_id = %wallet_id, "Fetching wallet");
    repo.get_wallet(wallet_id).await
}

/// List wallets. A page past the last one is `NotFound("Invalid page.")`.
pub async fn list_wallets<R: FullRepository + ?Sized>(
    repo: &R,
    query: &WalletQuery,
    page: PageRequest,
) -> RepositoryResult<Page<Wallet>> {
    debug!(?query, page = page.number, size = page.size, "Listing wallets");
    in_range(repo.list_wallets(query, page).await?, "list_wallets")
}

/// Change a wallet's label.
///
/// A `None` label leaves the wallet untouched, matching a PATCH that carries
/// no attributes.
pub async fn rename_wallet<R: FullRepository + ?Sized>(
    repo: &R,
    wallet_id: WalletId,
    label: Option<&str>,
) -> RepositoryResult<Wallet> {
    let Some(label) = label else {
        return repo.get_wallet(wallet_id).await;
    };
    let label = validate_label(Some(label))?;
    let wallet = repo.rename_wallet(wallet_id, label).await?;
    info!(wallet_id = %wallet.id, label = %wallet.label, "Renamed wallet");
    Ok(wallet)
}

/// Delete a wallet and, with it, all of its transactions.
pub async fn delete_wallet<R: FullRepository + ?Sized>(
    repo: &R,
    wallet_id: WalletId,
) -> RepositoryResult<()> {
    repo.delete_wallet(wallet_id).await?;
    info!(wallet_id = %wallet_id, "Deleted wallet");
    Ok(())
}

// ==================== Transaction Operations ====================

/// Record a transaction against a wallet.
///
/// The amount is taken in its decimal string form so no precision is lost.
///
/// # Errors
/// Validation errors, first failing field wins:
/// * `wallet`: missing, or no such wallet
/// * `txid`: missing, blank, too long or already recorded
/// * `amount`: missing, malformed, too precise, or overdrawing the wallet
pub async fn create_transaction<R: FullRepository + ?Sized>(
    repo: &R,
    wallet_id: Option<WalletId>,
    txid: Option<&str>,
    amount: Option<&str>,
) -> RepositoryResult<Transaction> {
    let wallet_id = wallet_id.ok_or_else(|| FieldError::new("wallet", "This field is required."))?;
    let txid = validate_txid(txid)?;
    let amount = validate_amount(amount)?;

    let tx = repo
        .create_transaction(NewTransaction {
            wallet_id,
            txid,
            amount,
        })
        .await?;
    info!(
        transaction_id = %tx.id,
        wallet_id = %tx.wallet_id,
        txid = %tx.txid,
        amount = %tx.amount,
        "Recorded transaction"
    );
    Ok(tx)
}

/// Fetch one transaction.
pub async fn get_transaction<R: FullRepository + ?Sized>(
    repo: &R,
    transaction_id: TransactionId,
) -> RepositoryResult<Transaction> {
    debug!(transaction_id = %transaction_id, "Fetching transaction");
    repo.get_transaction(transaction_id).await
}

/// List transactions. A page past the last one is `NotFound("Invalid page.")`.
pub async fn list_transactions<R: FullRepository + ?Sized>(
    repo: &R,
    query: &TransactionQuery,
    page: PageRequest,
) -> RepositoryResult<Page<Transaction>> {
    debug!(?query, page = page.number, size = page.size, "Listing transactions");
    in_range(repo.list_transactions(query, page).await?, "list_transactions")
}

/// Delete a transaction, reverting its amount from the wallet balance.
pub async fn delete_transaction<R: FullRepository + ?Sized>(
    repo: &R,
    transaction_id: TransactionId,
) -> RepositoryResult<()> {
    repo.delete_transaction(transaction_id).await?;
    info!(transaction_id = %transaction_id, "Deleted transaction");
    Ok(())
}

// ==================== Maintenance ====================

/// Apply pending schema migrations.
pub async fn migrate<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<String>> {
    let applied = repo.run_migrations().await?;
    if applied.is_empty() {
        info!("No pending migrations");
    } else {
        info!(count = applied.len(), versions = ?applied, "Applied migrations");
    }
    Ok(applied)
}
