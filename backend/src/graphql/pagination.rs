//! Page/limit pagination types for GraphQL
//!
//! List queries take an optional zero-based `{ page, limit }` input and
//! answer with [`PageInfo`] built from the unpaginated match count.

use async_graphql::SimpleObject;

use super::types::PaginationInput;
use crate::db::Pagination;
use crate::error::{ServiceError, ServiceResult};

/// Information about pagination in a list response
#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based page that was returned
    pub current_page: i64,
    /// Effective page size, null when the query was not paginated
    pub limit: Option<i64>,
    /// Rows matching the filter, independent of the page
    pub total_count: i64,
    /// `ceil(total_count / limit)`
    pub total_pages: i64,
    /// Whether rows remain after this page
    pub has_next_page: bool,
}

impl PageInfo {
    pub fn new(pagination: Option<Pagination>, total: i64) -> Self {
        match pagination {
            Some(page) => Self {
                current_page: page.page,
                limit: Some(page.limit),
                total_count: total,
                total_pages: page.total_pages(total),
                has_next_page: page.has_next_page(total),
            },
            None => Self {
                current_page: 0,
                limit: None,
                total_count: total,
                total_pages: i64::from(total > 0),
                has_next_page: false,
            },
        }
    }
}

/// Validate pagination input, capping the limit at `max_page_size`
pub fn resolve_pagination(
    input: Option<PaginationInput>,
    max_page_size: i32,
) -> ServiceResult<Option<Pagination>> {
    let Some(input) = input else {
        return Ok(None);
    };

    if input.page < 0 {
        return Err(ServiceError::validation("pagination page must be 0 or greater"));
    }
    if input.limit < 1 {
        return Err(ServiceError::validation("pagination limit must be at least 1"));
    }

    let limit = input.limit.min(max_page_size.max(1));
    Ok(Some(Pagination::new(i64::from(input.page), i64::from(limit))))
}
