//! Raw query-string handling.

use std::collections::BTreeMap;

/// Errors raised while interpreting list query parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query parameter: {0}")]
    UnknownParameter(String),
    #[error("repeated query parameter not allowed: {0}")]
    RepeatedParameter(String),
    #[error("invalid filter[{0}]")]
    UnknownFilter(String),
    #[error("invalid sort parameter: {0}")]
    UnknownSortField(String),
    #[error("{parameter}: {message}")]
    InvalidValue { parameter: String, message: String },
    #[error("Invalid page.")]
    InvalidPage,
}

impl QueryError {
    /// The offending query parameter, for error source reporting.
    pub fn parameter(&self) -> String {
        match self {
            QueryError::UnknownParameter(p) | QueryError::RepeatedParameter(p) => p.clone(),
            QueryError::UnknownFilter(name) => format!("filter[{}]", name),
            QueryError::UnknownSortField(_) => "sort".to_string(),
            QueryError::InvalidValue { parameter, .. } => parameter.clone(),
            QueryError::InvalidPage => "page[number]".to_string(),
        }
    }

    pub(crate) fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidValue {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

/// Query parameters of a list request, split by purpose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// `filter[name]=value` pairs keyed by `name`
    pub filters: BTreeMap<String, String>,
    /// Raw `sort` value, e.g. `-balance,label`
    pub sort: Option<String>,
    /// Raw `page[number]` value
    pub page_number: Option<String>,
    /// Raw `page[size]` value
    pub page_size: Option<String>,
}

impl ListParams {
    /// Split raw query pairs, rejecting unknown or repeated parameters.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = ListParams::default();

        for (key, value) in pairs {
            let key: String = key.into();
            let value: String = value.into();

            let slot = if key == "sort" {
                &mut params.sort
            } else if key == "page[number]" {
                &mut params.page_number
            } else if key == "page[size]" {
                &mut params.page_size
            } else if let Some(name) = key
                .strip_prefix("filter[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                if name.is_empty() {
                    return Err(QueryError::UnknownParameter(key.clone()));
                }
                if params.filters.insert(name.to_string(), value).is_some() {
                    return Err(QueryError::RepeatedParameter(key.clone()));
                }
                continue;
            } else {
                return Err(QueryError::UnknownParameter(key));
            };

            if slot.replace(value).is_some() {
                return Err(QueryError::RepeatedParameter(key));
            }
        }

        Ok(params)
    }

    /// Rebuild the non-page parameters as pairs, for pagination links.
    pub fn base_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| (format!("filter[{}]", k), v.clone()))
            .collect();
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(size) = &self.page_size {
            pairs.push(("page[size]".to_string(), size.clone()));
        }
        pairs
    }
}
