use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
}

impl PaginationQuery {
    pub fn limit_offset(&self) -> (i64, i64) {
        page_window(self.page, self.limit)
    }
}

/// Zero-based page number and page size into LIMIT / OFFSET.
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(50).clamp(1, 100);
    let offset = page.unwrap_or(0).max(0).saturating_mul(limit);
    (limit, offset)
}
