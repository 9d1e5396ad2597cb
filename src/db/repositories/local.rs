//! In-memory local repository implementation.
//!
//! Stores wallets and transactions in ordered maps behind a single lock.
//! Every balance-changing operation takes the write lock for its whole
//! check-then-apply sequence, which gives the same atomicity the Postgres
//! backend gets from `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::transaction::{
    check_prospective_balance, missing_wallet_message, DUPLICATE_TXID,
    NEGATIVE_BALANCE_ON_CREATE, NEGATIVE_BALANCE_ON_DELETE,
};
use crate::db::repository::*;
use crate::models::decimal::{zero, AMOUNT_SCALE};
use crate::models::validation::NON_FIELD_ERRORS;
use crate::models::{NewTransaction, NewWallet, Transaction, TransactionId, Wallet, WalletId};
use crate::query::{Page, PageRequest, TransactionQuery, WalletQuery};

/// Message for a wallet label that is already taken.
pub const DUPLICATE_LABEL: &str = "Wallet with this label already exists.";

/// In-memory local repository.
///
/// # Example
/// ```
/// use b2b_wallet::db::repositories::LocalRepository;
/// use b2b_wallet::db::repository::WalletRepository;
/// use b2b_wallet::models::NewWallet;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     let wallet = repo.create_wallet(NewWallet::new("Treasury")).await.unwrap();
///     assert_eq!(wallet.label, "Treasury");
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    wallets: BTreeMap<WalletId, Wallet>,
    transactions: BTreeMap<TransactionId, Transaction>,

    // ID counters
    next_wallet_id: i64,
    next_transaction_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            wallets: BTreeMap::new(),
            transactions: BTreeMap::new(),
            next_wallet_id: 1,
            next_transaction_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn label_taken(&self, label: &str, except: Option<WalletId>) -> bool {
        self.wallets
            .values()
            .any(|w| w.label == label && Some(w.id) != except)
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn wallet_count(&self) -> usize {
        self.data.read().wallets.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.data.read().transactions.len()
    }

    /// Overwrite a transaction's timestamp, for arranging time-based fixtures.
    pub fn set_transaction_timestamp(
        &self,
        transaction_id: TransactionId,
        timestamp: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let tx = data
            .transactions
            .get_mut(&transaction_id)
            .ok_or_else(|| transaction_not_found(transaction_id, "set_transaction_timestamp"))?;
        tx.timestamp = timestamp;
        Ok(())
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn wallet_not_found(wallet_id: WalletId, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Wallet {} not found", wallet_id),
        ErrorContext::new(operation)
            .with_entity("wallet")
            .with_entity_id(wallet_id),
    )
}

fn transaction_not_found(transaction_id: TransactionId, operation: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Transaction {} not found", transaction_id),
        ErrorContext::new(operation)
            .with_entity("transaction")
            .with_entity_id(transaction_id),
    )
}

/// Postgres stores microseconds; keep the in-memory clock at the same resolution.
fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

#[async_trait]
impl WalletRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn create_wallet(&self, wallet: NewWallet) -> RepositoryResult<Wallet> {
        self.check_health()?;
        if wallet.balance < zero() {
            return Err(RepositoryError::invalid_field(
                "create_wallet",
                "balance",
                "Wallet balance cannot be negative.",
            ));
        }

        let mut data = self.data.write();
        if data.label_taken(&wallet.label, None) {
            return Err(RepositoryError::invalid_field(
                "create_wallet",
                "label",
                DUPLICATE_LABEL,
            ));
        }

        let id = WalletId::new(data.next_wallet_id);
        data.next_wallet_id += 1;

        let stored = Wallet {
            id,
            label: wallet.label,
            balance: wallet.balance.with_scale(AMOUNT_SCALE),
        };
        data.wallets.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_wallet(&self, wallet_id: WalletId) -> RepositoryResult<Wallet> {
        self.check_health()?;
        self.data
            .read()
            .wallets
            .get(&wallet_id)
            .cloned()
            .ok_or_else(|| wallet_not_found(wallet_id, "get_wallet"))
    }

    async fn list_wallets(
        &self,
        query: &WalletQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Wallet>> {
        self.check_health()?;
        let data = self.data.read();
        let mut matching: Vec<&Wallet> = data.wallets.values().filter(|w| query.matches(w)).collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let items = page.slice(&matching).into_iter().cloned().collect();
        Ok(Page::new(items, matching.len() as u64, page))
    }

    async fn rename_wallet(&self, wallet_id: WalletId, label: String) -> RepositoryResult<Wallet> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.wallets.contains_key(&wallet_id) {
            return Err(wallet_not_found(wallet_id, "rename_wallet"));
        }
        if data.label_taken(&label, Some(wallet_id)) {
            return Err(RepositoryError::invalid_field(
                "rename_wallet",
                "label",
                DUPLICATE_LABEL,
            ));
        }

        let wallet = data
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| wallet_not_found(wallet_id, "rename_wallet"))?;
        wallet.label = label;
        Ok(wallet.clone())
    }

    async fn delete_wallet(&self, wallet_id: WalletId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.wallets.remove(&wallet_id).is_none() {
            return Err(wallet_not_found(wallet_id, "delete_wallet"));
        }
        data.transactions.retain(|_, tx| tx.wallet_id != wallet_id);
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for LocalRepository {
    async fn create_transaction(&self, tx: NewTransaction) -> RepositoryResult<Transaction> {
        self.check_health()?;
        let mut data = self.data.write();

        let balance = match data.wallets.get(&tx.wallet_id) {
            Some(wallet) => wallet.balance.clone(),
            None => {
                return Err(RepositoryError::invalid_field(
                    "create_transaction",
                    "wallet",
                    missing_wallet_message(tx.wallet_id.value()),
                ))
            }
        };

        if data.transactions.values().any(|t| t.txid == tx.txid) {
            return Err(RepositoryError::invalid_field(
                "create_transaction",
                "txid",
                DUPLICATE_TXID,
            ));
        }

        let prospective: BigDecimal = &balance + &tx.amount;
        check_prospective_balance(
            "create_transaction",
            "amount",
            &prospective,
            NEGATIVE_BALANCE_ON_CREATE,
        )?;

        let id = TransactionId::new(data.next_transaction_id);
        data.next_transaction_id += 1;

        let stored = Transaction {
            id,
            wallet_id: tx.wallet_id,
            txid: tx.txid,
            amount: tx.amount.with_scale(AMOUNT_SCALE),
            timestamp: now_micros(),
        };
        data.transactions.insert(id, stored.clone());
        if let Some(wallet) = data.wallets.get_mut(&stored.wallet_id) {
            wallet.balance = prospective.with_scale(AMOUNT_SCALE);
        }
        Ok(stored)
    }

    async fn get_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<Transaction> {
        self.check_health()?;
        self.data
            .read()
            .transactions
            .get(&transaction_id)
            .cloned()
            .ok_or_else(|| transaction_not_found(transaction_id, "get_transaction"))
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Transaction>> {
        self.check_health()?;
        let data = self.data.read();
        let mut matching: Vec<&Transaction> = data
            .transactions
            .values()
            .filter(|t| query.matches(t))
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let items = page.slice(&matching).into_iter().cloned().collect();
        Ok(Page::new(items, matching.len() as u64, page))
    }

    async fn delete_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();

        let tx = data
            .transactions
            .get(&transaction_id)
            .cloned()
            .ok_or_else(|| transaction_not_found(transaction_id, "delete_transaction"))?;

        let wallet = data.wallets.get_mut(&tx.wallet_id).ok_or_else(|| {
            RepositoryError::internal_with_context(
                format!("Transaction {} references a missing wallet", transaction_id),
                ErrorContext::new("delete_transaction").with_entity_id(tx.wallet_id),
            )
        })?;

        let prospective: BigDecimal = &wallet.balance - &tx.amount;
        check_prospective_balance(
            "delete_transaction",
            NON_FIELD_ERRORS,
            &prospective,
            NEGATIVE_BALANCE_ON_DELETE,
        )?;

        wallet.balance = prospective.with_scale(AMOUNT_SCALE);
        data.transactions.remove(&transaction_id);
        Ok(())
    }
}

#[async_trait]
impl MigrationRepository for LocalRepository {
    async fn run_migrations(&self) -> RepositoryResult<Vec<String>> {
        // Nothing to migrate in memory.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decimal::parse_amount;

    fn amount(raw: &str) -> BigDecimal {
        parse_amount(raw).unwrap()
    }

    #[tokio::test]
    async fn test_unhealthy_repository_rejects_operations() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.create_wallet(NewWallet::new("x")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    }

    #[tokio::test]
    async fn test_negative_opening_balance_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .create_wallet(NewWallet::with_balance("x", amount("-1")))
            .await
            .unwrap_err();
        assert_eq!(err.context().field.as_deref(), Some("balance"));
    }

    #[tokio::test]
    async fn test_clear_resets_ids() {
        let repo = LocalRepository::new();
        repo.create_wallet(NewWallet::new("a")).await.unwrap();
        repo.clear();
        assert_eq!(repo.wallet_count(), 0);
        let wallet = repo.create_wallet(NewWallet::new("b")).await.unwrap();
        assert_eq!(wallet.id, WalletId::new(1));
    }

    #[tokio::test]
    async fn test_set_transaction_timestamp() {
        let repo = LocalRepository::new();
        let wallet = repo.create_wallet(NewWallet::new("a")).await.unwrap();
        let tx = repo
            .create_transaction(NewTransaction {
                wallet_id: wallet.id,
                txid: "t1".to_string(),
                amount: amount("1"),
            })
            .await
            .unwrap();

        let earlier = tx.timestamp - chrono::Duration::days(2);
        repo.set_transaction_timestamp(tx.id, earlier).unwrap();
        assert_eq!(repo.get_transaction(tx.id).await.unwrap().timestamp, earlier);
        assert!(repo
            .set_transaction_timestamp(TransactionId::new(99), earlier)
            .is_err());
    }
}
