//! Typed filters and sort orders for wallet and transaction listings.

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::params::{ListParams, QueryError};
use crate::models::{Transaction, Wallet, WalletId};

/// Open bounds on a decimal column (`_gt`, `_lt`, `_gte`, `_lte` filters).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecimalRange {
    pub gt: Option<BigDecimal>,
    pub lt: Option<BigDecimal>,
    pub gte: Option<BigDecimal>,
    pub lte: Option<BigDecimal>,
}

impl DecimalRange {
    pub fn contains(&self, value: &BigDecimal) -> bool {
        self.gt.as_ref().map_or(true, |b| value > b)
            && self.lt.as_ref().map_or(true, |b| value < b)
            && self.gte.as_ref().map_or(true, |b| value >= b)
            && self.lte.as_ref().map_or(true, |b| value <= b)
    }

    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.lt.is_none() && self.gte.is_none() && self.lte.is_none()
    }

    /// Assign the bound named by `suffix` (`gt`, `lt`, `gte`, `lte`).
    fn set(&mut self, suffix: &str, value: BigDecimal) -> bool {
        let slot = match suffix {
            "gt" => &mut self.gt,
            "lt" => &mut self.lt,
            "gte" => &mut self.gte,
            "lte" => &mut self.lte,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// One `sort` entry: a field and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> SortKey<F> {
    fn apply(&self, ordering: Ordering) -> Ordering {
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSortField {
    Label,
    Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSortField {
    Txid,
    Amount,
    Timestamp,
}

fn parse_sort<F>(
    raw: Option<&str>,
    field: impl Fn(&str) -> Option<F>,
) -> Result<Vec<SortKey<F>>, QueryError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (descending, name) = match entry.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, entry),
            };
            field(name)
                .map(|field| SortKey { field, descending })
                .ok_or_else(|| QueryError::UnknownSortField(name.to_string()))
        })
        .collect()
}

fn parse_number(name: &str, value: &str) -> Result<BigDecimal, QueryError> {
    BigDecimal::from_str(value.trim())
        .map_err(|_| QueryError::invalid(format!("filter[{}]", name), "Enter a number."))
}

fn parse_datetime(name: &str, value: &str) -> Result<DateTime<Utc>, QueryError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(QueryError::invalid(
        format!("filter[{}]", name),
        "Enter a valid date/time.",
    ))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Filters and ordering for wallet listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletQuery {
    /// Case-insensitive substring of the label
    pub label: Option<String>,
    /// Free-text search over the label
    pub search: Option<String>,
    pub balance: DecimalRange,
    /// Explicit ordering; empty means label ascending
    pub sort: Vec<SortKey<WalletSortField>>,
}

impl WalletQuery {
    pub fn from_params(params: &ListParams) -> Result<Self, QueryError> {
        let mut query = WalletQuery::default();

        for (name, value) in &params.filters {
            match name.as_str() {
                "label" => query.label = Some(value.clone()),
                "search" => query.search = Some(value.clone()),
                other => match other.strip_prefix("balance_") {
                    Some(suffix) => {
                        let bound = parse_number(name, value)?;
                        if !query.balance.set(suffix, bound) {
                            return Err(QueryError::UnknownFilter(name.clone()));
                        }
                    }
                    None => return Err(QueryError::UnknownFilter(name.clone())),
                },
            }
        }

        query.sort = parse_sort(params.sort.as_deref(), |name| match name {
            "label" => Some(WalletSortField::Label),
            "balance" => Some(WalletSortField::Balance),
            _ => None,
        })?;

        Ok(query)
    }

    pub fn matches(&self, wallet: &Wallet) -> bool {
        self.label
            .as_deref()
            .map_or(true, |needle| contains_ignore_case(&wallet.label, needle))
            && self
                .search
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&wallet.label, needle))
            && self.balance.contains(&wallet.balance)
    }

    /// Ordering used for listings; ties fall back to the wallet id.
    pub fn compare(&self, a: &Wallet, b: &Wallet) -> Ordering {
        let default = [SortKey {
            field: WalletSortField::Label,
            descending: false,
        }];
        let keys: &[SortKey<WalletSortField>] = if self.sort.is_empty() {
            &default
        } else {
            &self.sort
        };

        keys.iter()
            .map(|key| {
                key.apply(match key.field {
                    WalletSortField::Label => a.label.cmp(&b.label),
                    WalletSortField::Balance => a.balance.cmp(&b.balance),
                })
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

/// Filters and ordering for transaction listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionQuery {
    pub wallet: Option<WalletId>,
    /// Case-insensitive substring of the txid
    pub txid: Option<String>,
    /// Free-text search over the txid
    pub search: Option<String>,
    pub amount: DecimalRange,
    pub timestamp_gte: Option<DateTime<Utc>>,
    pub timestamp_lte: Option<DateTime<Utc>>,
    /// Explicit ordering; empty means wallet ascending, newest first
    pub sort: Vec<SortKey<TransactionSortField>>,
}

impl TransactionQuery {
    pub fn from_params(params: &ListParams) -> Result<Self, QueryError> {
        let mut query = TransactionQuery::default();

        for (name, value) in &params.filters {
            match name.as_str() {
                "wallet" => {
                    let id = value.trim().parse::<i64>().map_err(|_| {
                        QueryError::invalid("filter[wallet]", "Enter a number.")
                    })?;
                    query.wallet = Some(WalletId::new(id));
                }
                "txid" => query.txid = Some(value.clone()),
                "search" => query.search = Some(value.clone()),
                "timestamp_gte" => query.timestamp_gte = Some(parse_datetime(name, value)?),
                "timestamp_lte" => query.timestamp_lte = Some(parse_datetime(name, value)?),
                other => match other.strip_prefix("amount_") {
                    Some(suffix) => {
                        let bound = parse_number(name, value)?;
                        if !query.amount.set(suffix, bound) {
                            return Err(QueryError::UnknownFilter(name.clone()));
                        }
                    }
                    None => return Err(QueryError::UnknownFilter(name.clone())),
                },
            }
        }

        query.sort = parse_sort(params.sort.as_deref(), |name| match name {
            "txid" => Some(TransactionSortField::Txid),
            "amount" => Some(TransactionSortField::Amount),
            "timestamp" => Some(TransactionSortField::Timestamp),
            _ => None,
        })?;

        Ok(query)
    }

    /// Restrict the query to one wallet.
    pub fn for_wallet(wallet: WalletId) -> Self {
        Self {
            wallet: Some(wallet),
            ..Default::default()
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.wallet.map_or(true, |w| tx.wallet_id == w)
            && self
                .txid
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&tx.txid, needle))
            && self
                .search
                .as_deref()
                .map_or(true, |needle| contains_ignore_case(&tx.txid, needle))
            && self.amount.contains(&tx.amount)
            && self.timestamp_gte.map_or(true, |t| tx.timestamp >= t)
            && self.timestamp_lte.map_or(true, |t| tx.timestamp <= t)
    }

    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        if self.sort.is_empty() {
            return a
                .wallet_id
                .cmp(&b.wallet_id)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| b.id.cmp(&a.id));
        }

        self.sort
            .iter()
            .map(|key| {
                key.apply(match key.field {
                    TransactionSortField::Txid => a.txid.cmp(&b.txid),
                    TransactionSortField::Amount => a.amount.cmp(&b.amount),
                    TransactionSortField::Timestamp => a.timestamp.cmp(&b.timestamp),
                })
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}
