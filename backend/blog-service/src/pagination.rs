/// Page slicing for listings
///
/// Page-number pagination backs the site surface: requested numbers are
/// clamped into range instead of failing. Limit/offset pagination backs the
/// REST listings.
use serde::{Deserialize, Serialize};

/// The resolved slice of an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub total_pages: i64,
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    /// Clamp `requested` into `1..=total_pages`. An empty sequence still has
    /// one (empty) page.
    pub fn resolve(total: i64, page_size: i64, requested: i64) -> Self {
        let page_size = page_size.max(1);
        let total = total.max(0);
        let total_pages = ((total + page_size - 1) / page_size).max(1);
        let number = requested.clamp(1, total_pages);

        Self {
            number,
            total_pages,
            offset: (number - 1) * page_size,
            limit: page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub total_pages: i64,
    /// Length of the whole sequence, not of this page
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Wrap items already fetched for `window`.
    pub fn from_window(items: Vec<T>, window: PageWindow, count: i64) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            count,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    pub fn empty() -> Self {
        Self::from_window(Vec::new(), PageWindow::resolve(0, 1, 1), 0)
    }
}

/// Slice an in-memory sequence.
pub fn paginate<T>(items: Vec<T>, page_size: i64, page_number: i64) -> Page<T> {
    let count = items.len() as i64;
    let window = PageWindow::resolve(count, page_size, page_number);
    let items = items
        .into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .collect();
    Page::from_window(items, window, count)
}

/// `?page=` as sent by the site surface. Anything that is not an integer
/// means the first page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        parse_page_number(self.page.as_deref())
    }
}

pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1)
        .max(1)
}

// ============================================================================
// Limit / offset
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitOffsetQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Upper bound on `limit` for a single REST page.
pub const MAX_LIMIT: i64 = 100;

impl LimitOffsetQuery {
    /// `None` when the caller did not ask for pagination. A `limit` that is
    /// not a positive integer counts as absent; a bad `offset` reads as 0.
    pub fn window(&self) -> Option<(i64, i64)> {
        let limit = parse_int(self.limit.as_deref())
            .filter(|l| *l > 0)?
            .min(MAX_LIMIT);
        let offset = parse_int(self.offset.as_deref()).unwrap_or(0).max(0);
        Some((limit, offset))
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitOffsetPage<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> LimitOffsetPage<T> {
    /// `base` is the request path; links carry `limit`/`offset` only.
    pub fn new(results: Vec<T>, count: i64, limit: i64, offset: i64, base: &str) -> Self {
        let next = (offset + limit < count)
            .then(|| format!("{}?limit={}&offset={}", base, limit, offset + limit));

        let previous = if offset <= 0 {
            None
        } else if offset - limit <= 0 {
            Some(format!("{}?limit={}", base, limit))
        } else {
            Some(format!("{}?limit={}&offset={}", base, limit, offset - limit))
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}
