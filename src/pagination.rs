//! Page-based listing parameters shared by listing endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u64 = 1;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// `?page&pageSize` query parameters. Both are 1-based and clamped to 1.
#[derive(Clone, Copy, Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct Params {
    #[serde(default = "default_page")]
    #[param(default = 1, minimum = 1)]
    page: u64,

    #[serde(default = "default_page_size")]
    #[param(default = 10, minimum = 1)]
    page_size: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

impl Params {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.max(1)
    }

    /// Number of records preceding the requested page.
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Summary returned alongside a page of records.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_count: u64,
    pub page_size: u64,
    pub count: u64,
}

impl Pagination {
    pub fn new(params: Params, count: u64) -> Self {
        let page_size = params.page_size();
        Self {
            page: params.page(),
            page_count: count.div_ceil(page_size),
            page_size,
            count,
        }
    }
}
