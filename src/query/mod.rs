//! List request parsing: filters, sorting and pagination.
//!
//! Query strings follow the JSON:API conventions:
//!
//! ```text
//! /api/wallets/?filter[label]=alpha&filter[balance_gte]=100&sort=-balance&page[number]=2&page[size]=20
//! ```
//!
//! [`ListParams`] splits the raw pairs into filter, sort and page parts and
//! rejects anything else. [`WalletQuery`] and [`TransactionQuery`] turn the
//! filter and sort parts into typed predicates that repositories evaluate
//! either in memory ([`WalletQuery::matches`]) or as SQL.

pub mod filters;
pub mod pagination;
pub mod params;

pub use filters::{
    DecimalRange, SortKey, TransactionQuery, TransactionSortField, WalletQuery, WalletSortField,
};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use params::{ListParams, QueryError};
