//! Public types shared by the service layer, the HTTP API and library users.

pub use crate::models::decimal::{format_decimal, parse_amount, AMOUNT_SCALE};
pub use crate::models::{NewTransaction, NewWallet, Transaction, TransactionId, Wallet, WalletId};
pub use crate::query::{
    DecimalRange, ListParams, Page, PageRequest, QueryError, SortKey, TransactionQuery,
    TransactionSortField, WalletQuery, WalletSortField,
};
