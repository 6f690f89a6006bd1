use super::types::Page;

pub const DEFAULT_PAGE_SIZE: usize = 200;
pub const MAX_PAGE_SIZE: usize = 1000;

/// Slice one page out of an ordered set using the stock limits.
pub fn paginate<T>(items: Vec<T>, page: Option<i64>, page_size: Option<i64>) -> Page<T> {
    paginate_with_limits(items, page, page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Page numbers floor at 1; page size falls back to `default_size` and is
/// clamped to `[1, max_size]`. Pages past the end are empty.
pub fn paginate_with_limits<T>(
    items: Vec<T>,
    page: Option<i64>,
    page_size: Option<i64>,
    default_size: usize,
    max_size: usize,
) -> Page<T> {
    let max_size = max_size.max(1);
    let page = page.unwrap_or(1).max(1) as usize;
    let page_size = match page_size {
        Some(n) => n.clamp(1, max_size as i64) as usize,
        None => default_size.clamp(1, max_size),
    };

    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page { total, page, page_size, items }
}
