//! Pagination wire types shared by the server and the client.
//!
//! A [`PaginationQuery`] describes one page request (page, size, search,
//! sort, per-field filters) and a [`PaginatedResponse`] carries the page
//! back together with the totals needed to render pagination controls.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reserved page size meaning "return every matching row, unpaginated".
pub const ALL_ROWS: i64 = -1;

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for a single page; larger requests are clamped.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Filter value that clears the filter for its field.
pub const CLEAR_FILTER: &str = "all";

/// Sort direction for a single-column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Unknown sort order '{other}', expected asc or desc")),
        }
    }
}

/// Value of a per-field filter: one scalar, or a list matched with `ANY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<serde_json::Value>),
    Scalar(serde_json::Value),
}

impl FilterValue {
    /// `"all"` and the empty list leave the field unconstrained.
    pub fn is_cleared(&self) -> bool {
        match self {
            FilterValue::Scalar(serde_json::Value::String(s)) => s == CLEAR_FILTER,
            FilterValue::List(values) => values.is_empty(),
            FilterValue::Scalar(_) => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(serde_json::Value::String(value.to_string()))
    }
}

/// One page request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, FilterValue>,
}

fn first_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            sort_by: None,
            sort_order: None,
            filters: BTreeMap::new(),
        }
    }
}

impl PaginationQuery {
    /// A query for every row, bypassing pagination.
    pub fn all() -> Self {
        Self {
            page_size: ALL_ROWS,
            ..Self::default()
        }
    }

    pub fn is_unpaginated(&self) -> bool {
        self.page_size < 0
    }

    /// Row offset of the requested page. Zero for unpaginated queries.
    pub fn offset(&self) -> i64 {
        if self.is_unpaginated() {
            0
        } else {
            (self.page.max(1) - 1) * self.page_size
        }
    }

    /// Clamp page and size into range, drop blank search terms and cleared filters.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = match self.page_size {
            0 => DEFAULT_PAGE_SIZE,
            size if size < 0 => ALL_ROWS,
            size => size.min(MAX_PAGE_SIZE),
        };
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.sort_by = self.sort_by.filter(|s| !s.trim().is_empty());
        self.filters.retain(|_, value| !value.is_cleared());
        self
    }
}

/// One page of results plus the totals the client needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub item_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub page_count: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, item_count: i64, page: i64, page_size: i64) -> Self {
        Self {
            items,
            item_count,
            page,
            page_size,
            page_count: page_count(item_count, page_size),
        }
    }

    /// Wrap a full, unpaginated result set as a single page.
    pub fn unpaginated(items: Vec<T>) -> Self {
        let count = items.len() as i64;
        Self::new(items, count, 1, count)
    }
}

/// `ceil(item_count / page_size)`, zero when either side is not positive.
pub fn page_count(item_count: i64, page_size: i64) -> i64 {
    if item_count <= 0 || page_size <= 0 {
        return 0;
    }
    (item_count + page_size - 1) / page_size
}
