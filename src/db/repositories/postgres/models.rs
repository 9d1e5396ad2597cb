use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{transactions, wallets};
use crate::models::{Transaction, TransactionId, Wallet, WalletId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = wallets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WalletRow {
    pub wallet_id: i64,
    pub label: String,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = wallets)]
pub struct NewWalletRow {
    pub label: String,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionRow {
    pub transaction_id: i64,
    pub wallet_id: i64,
    pub txid: String,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRow {
    pub wallet_id: i64,
    pub txid: String,
    pub amount: BigDecimal,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Wallet {
            id: WalletId::new(row.wallet_id),
            label: row.label,
            balance: row.balance,
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: TransactionId::new(row.transaction_id),
            wallet_id: WalletId::new(row.wallet_id),
            txid: row.txid,
            amount: row.amount,
            timestamp: row.created_at,
        }
    }
}
