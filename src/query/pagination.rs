//! Page-number pagination.

use super::params::{ListParams, QueryError};

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Largest page number accepted; keeps every offset representable as a SQL `BIGINT`.
pub const MAX_PAGE_NUMBER: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// A requested page (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number: number.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Read `page[number]` and `page[size]`.
    ///
    /// A page number that is not a positive integer, or exceeds
    /// [`MAX_PAGE_NUMBER`], is an invalid page. A
    /// malformed page size falls back to `default_size`; an oversized one is
    /// clamped to [`MAX_PAGE_SIZE`].
    pub fn from_params(params: &ListParams, default_size: u64) -> Result<Self, QueryError> {
        let number = match params.page_number.as_deref() {
            None => 1,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) if (1..=MAX_PAGE_NUMBER).contains(&n) => n,
                _ => return Err(QueryError::InvalidPage),
            },
        };

        let size = params
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|s| *s >= 1)
            .unwrap_or(default_size);

        Ok(Self::new(number, size))
    }

    /// Rows to skip, saturating at `i64::MAX`.
    pub fn offset(&self) -> u64 {
        self.number
            .saturating_sub(1)
            .saturating_mul(self.size)
            .min(i64::MAX as u64)
    }

    /// Cut this page out of an already ordered slice.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset() as usize)
            .take(self.size as usize)
            .cloned()
            .collect()
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(self.request.size).max(1)
    }

    pub fn is_out_of_range(&self) -> bool {
        self.request.number > self.pages()
    }

    pub fn next_number(&self) -> Option<u64> {
        (self.request.number < self.pages()).then_some(self.request.number + 1)
    }

    pub fn prev_number(&self) -> Option<u64> {
        (self.request.number > 1).then_some(self.request.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = PageRequest::from_params(&ListParams::default(), 10).unwrap();
        assert_eq!(request, PageRequest::new(1, 10));
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_size_clamped_and_fallback() {
        let params = ListParams {
            page_size: Some("1000".to_string()),
            ..Default::default()
        };
        assert_eq!(PageRequest::from_params(&params, 10).unwrap().size, MAX_PAGE_SIZE);

        let params = ListParams {
            page_size: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(PageRequest::from_params(&params, 7).unwrap().size, 7);
    }

    #[test]
    fn test_invalid_page_number() {
        for raw in ["0", "-1", "first", "18446744073709551615", "92233720368547759"] {
            let params = ListParams {
                page_number: Some(raw.to_string()),
                ..Default::default()
            };
            assert_eq!(
                PageRequest::from_params(&params, 10),
                Err(QueryError::InvalidPage)
            );
        }
    }

    #[test]
    fn test_largest_page_number_has_bigint_offset() {
        let params = ListParams {
            page_number: Some(MAX_PAGE_NUMBER.to_string()),
            page_size: Some("100".to_string()),
            ..Default::default()
        };
        let request = PageRequest::from_params(&params, 10).unwrap();
        assert!(request.offset() <= i64::MAX as u64);

        let huge = PageRequest::new(u64::MAX, MAX_PAGE_SIZE);
        assert_eq!(huge.offset(), i64::MAX as u64);
        assert!(huge.slice(&[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_page_navigation() {
        let items: Vec<u32> = (1..=25).collect();
        let request = PageRequest::new(3, 10);
        let page = Page::new(request.slice(&items), items.len() as u64, request);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.pages(), 3);
        assert_eq!(page.next_number(), None);
        assert_eq!(page.prev_number(), Some(2));
        assert!(!page.is_out_of_range());

        let empty: Page<u32> = Page::new(vec![], 0, PageRequest::new(1, 10));
        assert_eq!(empty.pages(), 1);
        assert!(!empty.is_out_of_range());

        let beyond: Page<u32> = Page::new(vec![], 5, PageRequest::new(2, 10));
        assert!(beyond.is_out_of_range());
    }
}
