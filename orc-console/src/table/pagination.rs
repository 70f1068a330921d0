//! Pagination utilities for the paper table

/// Rows per table page
pub const PAGE_SIZE: usize = 25;

/// Pagination metadata calculated from total rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    pub total_pages: usize,
    /// Index of the first row on the page
    pub offset: usize,
}

impl Pagination {
    /// Slice of `rows` shown on this page
    pub fn slice<'r, T>(&self, rows: &'r [T]) -> &'r [T] {
        let start = self.offset.min(rows.len());
        let end = (self.offset + PAGE_SIZE).min(rows.len());
        &rows[start..end]
    }
}

/// Calculate pagination from total rows and requested page
///
/// The page is clamped to `[1, total_pages]`; an empty table has zero pages
/// and shows page 1.
///
/// # Examples
/// ```
/// use orc_console::table::calculate_pagination;
///
/// // 60 rows = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Out-of-range pages are clamped
/// let p = calculate_pagination(60, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(total_rows: usize, requested_page: usize) -> Pagination {
    let total_pages = total_rows.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
