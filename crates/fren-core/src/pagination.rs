//! Page/limit parsing for list endpoints.
//!
//! Clients send `page` (1-indexed) and an optional `limit`. Both are clamped
//! to a minimum of 1; an absent limit means the listing is unbounded. The
//! resolved [`Pagination`] carries the row offset the store should skip.
//!
//! ```ignore
//! let pagination = PaginationParams::parse(Some("3"), Some("10"))?.resolve();
//! assert_eq!(pagination.offset, 20);
//! ```

use serde::Serialize;

use crate::errors::AppError;

/// Raw pagination values as received from the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Parses an optional query value, treating an empty string as absent.
fn parse_optional_i64(name: &'static str, value: Option<&str>) -> Result<Option<i64>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::invalid_parameter(name)),
    }
}

impl PaginationParams {
    /// Parses `page` and `limit`. Non-numeric values are rejected with
    /// `InvalidParameter` naming the offending parameter.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        Ok(Self {
            page: parse_optional_i64("page", page)?,
            limit: parse_optional_i64("limit", limit)?,
        })
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|limit| limit.max(1))
    }

    pub fn offset(&self) -> i64 {
        match self.limit() {
            Some(limit) => (self.page() - 1).saturating_mul(limit),
            None => 0,
        }
    }

    pub fn resolve(&self) -> Pagination {
        Pagination {
            page: self.page(),
            limit: self.limit(),
            offset: self.offset(),
        }
    }
}

/// Validated pagination for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    /// `None` means no upper bound on returned rows.
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        PaginationParams::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_defaults_when_absent() {
        let pagination = PaginationParams::parse(None, None).unwrap().resolve();
        assert_eq!(
            pagination,
            Pagination {
                page: 1,
                limit: None,
                offset: 0
            }
        );
    }

    #[test]
    fn test_page_and_limit() {
        let pagination = PaginationParams::parse(Some("3"), Some("10"))
            .unwrap()
            .resolve();
        assert_eq!(pagination.page, 3);
        assert_eq!(pagination.limit, Some(10));
        assert_eq!(pagination.offset, 20);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let pagination = PaginationParams::parse(Some("0"), Some("0")).unwrap().resolve();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, Some(1));
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let params = PaginationParams::parse(Some("-4"), Some("-10")).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), Some(1));
    }

    #[test]
    fn test_empty_strings_treated_as_absent() {
        let params = PaginationParams::parse(Some(""), Some("")).unwrap();
        assert_eq!(params, PaginationParams::default());
    }

    #[test]
    fn test_page_without_limit_has_no_offset() {
        let pagination = PaginationParams::parse(Some("5"), None).unwrap().resolve();
        assert_eq!(pagination.page, 5);
        assert_eq!(pagination.limit, None);
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn test_non_numeric_page_rejected() {
        let err = PaginationParams::parse(Some("abc"), Some("10")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
        assert_eq!(err.details_str(), Some("page"));
    }

    #[test]
    fn test_non_numeric_limit_rejected() {
        let err = PaginationParams::parse(Some("1"), Some("ten")).unwrap_err();
        assert_eq!(err.details_str(), Some("limit"));
    }

    #[test]
    fn test_large_page_does_not_overflow() {
        let params = PaginationParams {
            page: Some(i64::MAX),
            limit: Some(100),
        };
        assert_eq!(params.offset(), i64::MAX);
    }
}
