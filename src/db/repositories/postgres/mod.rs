//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Row-level locking of wallets for balance changes
//! - Embedded migrations, applied by the container entrypoint
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string. When neither is
//!   set the URL is composed from `POSTGRES_DB`, `POSTGRES_USER`,
//!   `POSTGRES_PASSWORD`, `DB_HOST` and `DB_PORT`.
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::transaction::{
    check_prospective_balance, missing_wallet_message, DUPLICATE_TXID,
    NEGATIVE_BALANCE_ON_CREATE, NEGATIVE_BALANCE_ON_DELETE,
};
use crate::db::repository::{
    ErrorContext, MigrationRepository, RepositoryError, RepositoryResult, TransactionRepository,
    WalletRepository,
};
use crate::models::decimal::{zero, AMOUNT_SCALE};
use crate::models::validation::NON_FIELD_ERRORS;
use crate::models::{NewTransaction, NewWallet, Transaction, TransactionId, Wallet, WalletId};
use crate::query::{
    Page, PageRequest, TransactionQuery, TransactionSortField, WalletQuery, WalletSortField,
};

mod models;
#[allow(clippy::all)]
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = crate::config::database_url_from_env()?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_parse("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_parse("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_parse(
                "PG_CONN_TIMEOUT_SEC",
                defaults.connection_timeout_sec,
            ),
            idle_timeout_sec: env_parse("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_parse("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_parse("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository backed by a connection pool.
    ///
    /// The schema is not touched here; call
    /// [`MigrationRepository::run_migrations`] first on a fresh database.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        debug!("Postgres pool ready (max_size={})", config.max_pool_size);

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times when the error is retryable
    /// (connection errors, timeouts, serialization failures), doubling the
    /// delay between attempts.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            warn!("Connection attempt {} failed: {}", attempt + 1, err);
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        warn!("Retrying after transient failure: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

macro_rules! filter_range {
    ($query:ident, $column:expr, $range:expr) => {
        if let Some(bound) = $range.gt.clone() {
            $query = $query.filter($column.gt(bound));
        }
        if let Some(bound) = $range.lt.clone() {
            $query = $query.filter($column.lt(bound));
        }
        if let Some(bound) = $range.gte.clone() {
            $query = $query.filter($column.ge(bound));
        }
        if let Some(bound) = $range.lte.clone() {
            $query = $query.filter($column.le(bound));
        }
    };
}

fn filtered_wallets(query: &WalletQuery) -> wallets::BoxedQuery<'static, Pg> {
    let mut q = wallets::table.into_boxed();
    if let Some(label) = query.label.as_deref() {
        q = q.filter(wallets::label.ilike(contains_pattern(label)));
    }
    if let Some(search) = query.search.as_deref() {
        q = q.filter(wallets::label.ilike(contains_pattern(search)));
    }
    filter_range!(q, wallets::balance, query.balance);
    q
}

fn filtered_transactions(query: &TransactionQuery) -> transactions::BoxedQuery<'static, Pg> {
    let mut q = transactions::table.into_boxed();
    if let Some(wallet) = query.wallet {
        q = q.filter(transactions::wallet_id.eq(wallet.value()));
    }
    if let Some(txid) = query.txid.as_deref() {
        q = q.filter(transactions::txid.ilike(contains_pattern(txid)));
    }
    if let Some(search) = query.search.as_deref() {
        q = q.filter(transactions::txid.ilike(contains_pattern(search)));
    }
    filter_range!(q, transactions::amount, query.amount);
    if let Some(from) = query.timestamp_gte {
        q = q.filter(transactions::created_at.ge(from));
    }
    if let Some(until) = query.timestamp_lte {
        q = q.filter(transactions::created_at.le(until));
    }
    q
}

fn ordered_wallets(query: &WalletQuery) -> wallets::BoxedQuery<'static, Pg> {
    let mut q = filtered_wallets(query);
    if query.sort.is_empty() {
        q = q.then_order_by(wallets::label.asc());
    }
    for key in &query.sort {
        q = match (key.field, key.descending) {
            (WalletSortField::Label, false) => q.then_order_by(wallets::label.asc()),
            (WalletSortField::Label, true) => q.then_order_by(wallets::label.desc()),
            (WalletSortField::Balance, false) => q.then_order_by(wallets::balance.asc()),
            (WalletSortField::Balance, true) => q.then_order_by(wallets::balance.desc()),
        };
    }
    q.then_order_by(wallets::wallet_id.asc())
}

fn ordered_transactions(query: &TransactionQuery) -> transactions::BoxedQuery<'static, Pg> {
    let q = filtered_transactions(query);
    if query.sort.is_empty() {
        return q
            .then_order_by(transactions::wallet_id.asc())
            .then_order_by(transactions::created_at.desc())
            .then_order_by(transactions::transaction_id.desc());
    }

    let mut q = q;
    for key in &query.sort {
        q = match (key.field, key.descending) {
            (TransactionSortField::Txid, false) => q.then_order_by(transactions::txid.asc()),
            (TransactionSortField::Txid, true) => q.then_order_by(transactions::txid.desc()),
            (TransactionSortField::Amount, false) => q.then_order_by(transactions::amount.asc()),
            (TransactionSortField::Amount, true) => q.then_order_by(transactions::amount.desc()),
            (TransactionSortField::Timestamp, false) => {
                q.then_order_by(transactions::created_at.asc())
            }
            (TransactionSortField::Timestamp, true) => {
                q.then_order_by(transactions::created_at.desc())
            }
        };
    }
    q.then_order_by(transactions::transaction_id.asc())
}

/// Load a wallet row under `FOR UPDATE`, holding the lock until the
/// surrounding transaction ends.
fn lock_wallet(conn: &mut PgConnection, wallet_id: i64) -> QueryResult<Option<WalletRow>> {
    wallets::table
        .find(wallet_id)
        .for_update()
        .get_result::<WalletRow>(conn)
        .optional()
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

#[async_trait]
impl WalletRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_wallet(&self, wallet: NewWallet) -> RepositoryResult<Wallet> {
        if wallet.balance < zero() {
            return Err(RepositoryError::invalid_field(
                "create_wallet",
                "balance",
                "Wallet balance cannot be negative.",
            ));
        }

        let row = NewWalletRow {
            label: wallet.label,
            balance: wallet.balance.with_scale(AMOUNT_SCALE),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(wallets::table)
                .values(&row)
                .get_result::<WalletRow>(conn)
                .map(Wallet::from)
                .map_err(|e| map_diesel_error(e).with_operation("create_wallet"))
        })
        .await
    }

    async fn get_wallet(&self, wallet_id: WalletId) -> RepositoryResult<Wallet> {
        self.with_conn(move |conn| {
            wallets::table
                .find(wallet_id.value())
                .get_result::<WalletRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Wallet::from)
                .ok_or_else(|| wallet_not_found(wallet_id, "get_wallet"))
        })
        .await
    }

    async fn list_wallets(
        &self,
        query: &WalletQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Wallet>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let total = filtered_wallets(&query)
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)?;

            let rows = ordered_wallets(&query)
                .offset(page.offset() as i64)
                .limit(page.size as i64)
                .load::<WalletRow>(conn)
                .map_err(map_diesel_error)?;

            let items = rows.into_iter().map(Wallet::from).collect();
            Ok(Page::new(items, total as u64, page))
        })
        .await
    }

    async fn rename_wallet(&self, wallet_id: WalletId, label: String) -> RepositoryResult<Wallet> {
        self.with_conn(move |conn| {
            diesel::update(wallets::table.find(wallet_id.value()))
                .set(wallets::label.eq(&label))
                .get_result::<WalletRow>(conn)
                .optional()
                .map_err(|e| map_diesel_error(e).with_operation("rename_wallet"))?
                .map(Wallet::from)
                .ok_or_else(|| wallet_not_found(wallet_id, "rename_wallet"))
        })
        .await
    }

    async fn delete_wallet(&self, wallet_id: WalletId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            // Transactions go with it through ON DELETE CASCADE.
            let deleted = diesel::delete(wallets::table.find(wallet_id.value()))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(wallet_not_found(wallet_id, "delete_wallet"));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TransactionRepository for PostgresRepository {
    async fn create_transaction(&self, tx: NewTransaction) -> RepositoryResult<Transaction> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|conn| {
                let wallet_id = tx.wallet_id.value();
                let wallet = lock_wallet(conn, wallet_id)
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| {
                        RepositoryError::invalid_field(
                            "create_transaction",
                            "wallet",
                            missing_wallet_message(wallet_id),
                        )
                    })?;

                let txid_taken = diesel::select(diesel::dsl::exists(
                    transactions::table.filter(transactions::txid.eq(&tx.txid)),
                ))
                .get_result::<bool>(conn)
                .map_err(map_diesel_error)?;
                if txid_taken {
                    return Err(RepositoryError::invalid_field(
                        "create_transaction",
                        "txid",
                        DUPLICATE_TXID,
                    ));
                }

                let prospective: BigDecimal = &wallet.balance + &tx.amount;
                check_prospective_balance(
                    "create_transaction",
                    "amount",
                    &prospective,
                    NEGATIVE_BALANCE_ON_CREATE,
                )?;

                let inserted = diesel::insert_into(transactions::table)
                    .values(&NewTransactionRow {
                        wallet_id,
                        txid: tx.txid.clone(),
                        amount: tx.amount.with_scale(AMOUNT_SCALE),
                    })
                    .get_result::<TransactionRow>(conn)
                    .map_err(|e| map_diesel_error(e).with_operation("create_transaction"))?;

                diesel::update(wallets::table.find(wallet_id))
                    .set(wallets::balance.eq(prospective.with_scale(AMOUNT_SCALE)))
                    .execute(conn)
                    .map_err(map_diesel_error)?;

                Ok(Transaction::from(inserted))
            })
        })
        .await
    }

    async fn get_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<Transaction> {
        self.with_conn(move |conn| {
            transactions::table
                .find(transaction_id.value())
                .get_result::<TransactionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Transaction::from)
                .ok_or_else(|| transaction_not_found(transaction_id, "get_transaction"))
        })
        .await
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> RepositoryResult<Page<Transaction>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let total = filtered_transactions(&query)
                .count()
                .get_result::<i64>(conn)
                .map_err(map_diesel_error)?;

            let rows = ordered_transactions(&query)
                .offset(page.offset() as i64)
                .limit(page.size as i64)
                .load::<TransactionRow>(conn)
                .map_err(map_diesel_error)?;

            let items = rows.into_iter().map(Transaction::from).collect();
            Ok(Page::new(items, total as u64, page))
        })
        .await
    }

    async fn delete_transaction(&self, transaction_id: TransactionId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|conn| {
                let tx = transactions::table
                    .find(transaction_id.value())
                    .get_result::<TransactionRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| transaction_not_found(transaction_id, "delete_transaction"))?;

                let wallet = lock_wallet(conn, tx.wallet_id)
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| transaction_not_found(transaction_id, "delete_transaction"))?;

                let prospective: BigDecimal = &wallet.balance - &tx.amount;
                check_prospective_balance(
                    "delete_transaction",
                    NON_FIELD_ERRORS,
                    &prospective,
                    NEGATIVE_BALANCE_ON_DELETE,
                )?;

                // A concurrent delete may have won the wallet lock first.
                let deleted = diesel::delete(transactions::table.find(tx.transaction_id))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
                if deleted == 0 {
                    return Err(transaction_not_found(transaction_id, "delete_transaction"));
                }

                diesel::update(wallets::table.find(tx.wallet_id))
                    .set(wallets::balance.eq(prospective.with_scale(AMOUNT_SCALE)))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl MigrationRepository for PostgresRepository {
    async fn run_migrations(&self) -> RepositoryResult<Vec<String>> {
        let applied = self
            .with_conn(|conn| {
                let versions = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                    RepositoryError::internal_with_context(
                        format!("Migration failed: {}", e),
                        ErrorContext::new("run_migrations"),
                    )
                })?;
                Ok(versions
                    .into_iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>())
            })
            .await?;

        let stats = self.get_pool_stats();
        info!(
            "Applied {} migration(s); pool {}/{} connections",
            applied.len(),
            stats.total_connections,
            stats.max_size
        );
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("abc"), "%abc%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_config_with_url_uses_defaults() {
        let config = PostgresConfig::with_url("postgres://u:p@localhost/db");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.database_url, "postgres://u:p@localhost/db");
    }
}
