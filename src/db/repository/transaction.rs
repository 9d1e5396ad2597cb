//! Transaction repository trait.
//!
//! Transactions are immutable once recorded: they can be created and deleted,
//! never updated. Both mutations adjust the owning wallet's balance in the same
//! atomic unit of work, under an exclusive lock on the wallet.

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::error::{RepositoryError, RepositoryResult};
use crate::models::decimal::{fits_column, zero};
use crate::models::{NewTransaction, Transaction, TransactionId};
use crate::query::{Page, PageRequest, TransactionQuery};

/// Message for a transaction that would overdraw its wallet.
pub const NEGATIVE_BALANCE_ON_CREATE: &str =
    "Transaction would lead to a negative wallet balance.";

/// Message for a deletion that would overdraw the wallet.
pub const NEGATIVE_BALANCE_ON_DELETE: &str =
    "Deleting this transaction would lead to a negative wallet balance.";

/// Message for a balance that would no longer fit its column.
pub const BALANCE_TOO_LARGE: &str =
    "Transaction would lead to a wallet balance with more than 12 digits before the decimal point.";

/// Message for a txid that is already recorded.
pub const DUPLICATE_TXID: &str = "Transaction with this txid already exists.";

/// Message for a relationship pointing at a wallet that does not exist.
pub fn missing_wallet_message(wallet_id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", wallet_id)
}

/// Check the balance a wallet would have after a mutation.
///
/// A negative result is reported with `negative_message`; a result that
/// overflows `NUMERIC(30, 18)` with [`BALANCE_TOO_LARGE`]. Both point at `field`.
pub fn check_prospective_balance(
    operation: &str,
    field: &str,
    prospective: &BigDecimal,
    negative_message: &str,
) -> RepositoryResult<()> {
    if *prospective < zero() {
        return Err(RepositoryError::invalid_field(operation, field, negative_message));
    }
    if !fits_column(prospective) {
        return Err(RepositoryError::invalid_field(operation, field, BALANCE_TOO_LARGE));
    }
    Ok(())
}

/// Storage operations for transactions.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Record a transaction and apply its amount to the wallet balance.
    ///
    /// Fails with a validation error, leaving everything unchanged, when:
    /// - the wallet does not exist (field `wallet`)
    /// - the txid is already recorded (field `txid`)
    /// - `balance + amount` would be negative (field `amount`)
    async fn create_transaction(&self, tx: NewTransaction) -> RepositoryResult<Transaction>;

    /// Retrieve a transaction by id.
    async fn get_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<Transaction>;

    /// List transactions matching `query`, ordered and paginated.
    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Transaction>>;

    /// Delete a transaction and revert its amount from the wallet balance.
    ///
    /// Fails with a non-field validation error when `balance - amount` would
    /// be negative.
    async fn delete_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<()>;
}
