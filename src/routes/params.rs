use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20, at most 100
    pub per_page: Option<i64>,
}

const MAX_PER_PAGE: i64 = 100;
/// Highest page whose offset still fits in an `i64`.
const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

/// A normalized page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn first(per_page: i64) -> Self {
        Self { page: 1, per_page }
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(0)) as u64
    }
}

impl Pagination {
    pub fn normalize(&self) -> PageRequest {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, MAX_PER_PAGE);
        PageRequest { page, per_page }
    }
}

/// Returns the text filter only when it carries something to match on.
pub fn text_filter(q: Option<&str>) -> Option<&str> {
    q.map(str::trim).filter(|s| !s.is_empty())
}

/// Wraps a filter into a `%...%` pattern for case-insensitive LIKE queries.
pub fn like_pattern(filter: &str) -> String {
    format!("%{filter}%")
}

// Query strings are decoded by serde_urlencoded, which cannot parse numbers
// inside `#[serde(flatten)]` structs, so paging fields are repeated per query.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct SearchQuery {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20, at most 100
    pub per_page: Option<i64>,
    /// Case-insensitive substring filter
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn page_request(&self) -> PageRequest {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
        .normalize()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20, at most 100
    pub per_page: Option<i64>,
    /// Case-insensitive filter on the customer's full name
    pub q: Option<String>,
    /// Only orders due strictly after this date
    pub due_after: Option<NaiveDate>,
    /// Include orders due before yesterday when no `due_after` is given
    #[serde(default)]
    pub include_past: bool,
}

impl OrderListQuery {
    pub fn page_request(&self) -> PageRequest {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
        .normalize()
    }

    /// The effective due-date filter: an explicit date wins, otherwise
    /// orders due today or later unless past orders were asked for.
    pub fn effective_due_after(&self, today: NaiveDate) -> Option<NaiveDate> {
        match (self.due_after, self.include_past) {
            (Some(date), _) => Some(date),
            (None, true) => None,
            (None, false) => today.pred_opt(),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct DashboardQuery {
    /// Month 1-12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let page = Pagination::default().normalize();
        assert_eq!(page, PageRequest { page: 1, per_page: 20 });

        let page = Pagination {
            page: Some(0),
            per_page: Some(1_000),
        }
        .normalize();
        assert_eq!(page, PageRequest { page: 1, per_page: 100 });
        assert_eq!(page.offset(), 0);

        let page = Pagination {
            page: Some(3),
            per_page: Some(10),
        }
        .normalize();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);

        let page = SearchQuery {
            page: Some(i64::MAX),
            per_page: Some(20),
            q: None,
        }
        .page_request();
        assert_eq!(page.page, MAX_PAGE);
        assert_eq!(page.offset(), ((MAX_PAGE - 1) * 20) as u64);
    }

    #[test]
    fn blank_filters_count_as_absent() {
        assert_eq!(text_filter(None), None);
        assert_eq!(text_filter(Some("")), None);
        assert_eq!(text_filter(Some("   ")), None);
        assert_eq!(text_filter(Some(" rye ")), Some("rye"));
        assert_eq!(like_pattern("rye"), "%rye%");
    }

    #[test]
    fn storefront_defaults_to_orders_from_yesterday_on() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let query = OrderListQuery::default();
        assert_eq!(
            query.effective_due_after(today),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );

        let query = OrderListQuery {
            include_past: true,
            ..Default::default()
        };
        assert_eq!(query.effective_due_after(today), None);

        let explicit = NaiveDate::from_ymd_opt(2023, 12, 24).unwrap();
        let query = OrderListQuery {
            due_after: Some(explicit),
            include_past: true,
            ..Default::default()
        };
        assert_eq!(query.effective_due_after(today), Some(explicit));
    }
}
