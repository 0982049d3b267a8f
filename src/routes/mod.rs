// # Routes Module
//
// - HTTP route handlers, one submodule per API area.
// - Handlers translate requests into Auth Flow / Costing Engine / Store calls
//   and answer with the `ApiResponse` envelope.
//
//  ## Available Route Modules
// - `health`: Health check endpoint
// - `auth`: Magic-link submission and redemption
// - `inventory`: Inventory catalog CRUD
// - `recipe`: Recipe creation, listing and re-costing

use serde::{Deserialize, Serialize};

use crate::database::ListFilter;

/// Health check endpoint
pub mod health;

/// Magic-link endpoints (unauthenticated)
pub mod auth;

/// Inventory catalog endpoints
pub mod inventory;

/// Recipe endpoints
pub mod recipe;

/// `?page=&limit=&search=` as sent by the client.
///
/// Kept as raw strings so that malformed numbers fall back to the defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

impl From<ListQuery> for ListFilter {
    fn from(query: ListQuery) -> Self {
        ListFilter {
            page: positive_or(query.page.as_deref(), ListFilter::DEFAULT_PAGE),
            limit: positive_or(query.limit.as_deref(), ListFilter::DEFAULT_LIMIT),
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Paging fields shared by every list payload.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(filter: &ListFilter, total_items: i64) -> Self {
        let limit = i64::from(filter.limit.max(1));
        Self {
            page: filter.page,
            limit: filter.limit,
            total_items,
            total_pages: (total_items + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>, search: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
            search: search.map(String::from),
        }
    }

    #[test]
    fn invalid_paging_falls_back_to_defaults() {
        for (page, limit) in [(None, None), (Some("abc"), Some("-3")), (Some("0"), Some("0")), (Some(""), Some("1.5"))] {
            let filter = ListFilter::from(query(page, limit, None));
            assert_eq!(filter.page, 1, "{page:?}");
            assert_eq!(filter.limit, 10, "{limit:?}");
        }
    }

    #[test]
    fn keeps_valid_paging_and_search() {
        let filter = ListFilter::from(query(Some("3"), Some("25"), Some("milk")));
        assert_eq!((filter.page, filter.limit), (3, 25));
        assert_eq!(filter.search.as_deref(), Some("milk"));

        let blank = ListFilter::from(query(None, None, Some("  ")));
        assert!(blank.search.is_none());
    }

    #[test]
    fn total_pages_rounds_up() {
        let filter = ListFilter { page: 1, limit: 10, search: None };
        assert_eq!(PageMeta::new(&filter, 0).total_pages, 0);
        assert_eq!(PageMeta::new(&filter, 10).total_pages, 1);
        assert_eq!(PageMeta::new(&filter, 11).total_pages, 2);
    }
}
