//! Ledger domain types.

pub mod decimal;
pub mod validation;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId(pub i64);

/// Transaction identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl WalletId {
    pub fn new(value: i64) -> Self {
        WalletId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TransactionId {
    pub fn new(value: i64) -> Self {
        TransactionId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wallet and its current balance.
///
/// The balance is the opening balance plus the sum of all transaction amounts
/// recorded against the wallet. It is never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: WalletId,
    pub label: String,
    pub balance: BigDecimal,
}

/// Data needed to create a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub label: String,
    /// Opening balance. Wallets created through the API always start at zero.
    pub balance: BigDecimal,
}

impl NewWallet {
    /// A wallet with a zero opening balance.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            balance: BigDecimal::from(0),
        }
    }

    /// A wallet seeded with an opening balance.
    pub fn with_balance(label: impl Into<String>, balance: BigDecimal) -> Self {
        Self {
            label: label.into(),
            balance,
        }
    }
}

/// A deposit (positive amount) or withdrawal (negative amount).
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    /// Unique external transaction identifier
    pub txid: String,
    pub amount: BigDecimal,
    pub timestamp: DateTime<Utc>,
}

/// Data needed to record a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub txid: String,
    pub amount: BigDecimal,
}
