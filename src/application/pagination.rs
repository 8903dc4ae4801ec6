//! Page-number pagination shared by every listing.

use serde::Serialize;
use thiserror::Error;

/// Listing pages show this many entries.
pub const PAGE_SIZE: u32 = 10;

/// Page requested through the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelector {
    #[default]
    First,
    Number(u32),
    Last,
}

impl PageSelector {
    /// Parse the raw query value. A missing or empty value selects the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, PaginationError> {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(PageSelector::First);
        };
        if raw == "last" {
            return Ok(PageSelector::Last);
        }
        match raw.parse::<u32>() {
            Ok(0) => Err(PaginationError::InvalidPage(raw.to_string())),
            Ok(number) => Ok(PageSelector::Number(number)),
            Err(_) => Err(PaginationError::InvalidPage(raw.to_string())),
        }
    }
}

/// Offset and limit of one page within a listing of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub per_page: u32,
}

impl PageWindow {
    /// Resolve a selector against the listing size. An empty listing still has one page.
    pub fn resolve(
        selector: PageSelector,
        total_items: u64,
        per_page: u32,
    ) -> Result<Self, PaginationError> {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        let number = match selector {
            PageSelector::First => 1,
            PageSelector::Last => total_pages,
            PageSelector::Number(number) if number <= total_pages => number,
            PageSelector::Number(number) => return Err(PaginationError::EmptyPage(number)),
        };

        Ok(Self {
            number,
            total_pages,
            total_items,
            per_page,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

/// One page of a listing plus the numbers a template needs to link neighbours.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn previous_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page `{0}` is not a positive integer")]
    InvalidPage(String),
    #[error("page {0} contains no results")]
    EmptyPage(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parsing() {
        assert_eq!(PageSelector::parse(None), Ok(PageSelector::First));
        assert_eq!(PageSelector::parse(Some("")), Ok(PageSelector::First));
        assert_eq!(PageSelector::parse(Some("3")), Ok(PageSelector::Number(3)));
        assert_eq!(PageSelector::parse(Some("last")), Ok(PageSelector::Last));
        assert!(PageSelector::parse(Some("0")).is_err());
        assert!(PageSelector::parse(Some("-1")).is_err());
        assert!(PageSelector::parse(Some("two")).is_err());
    }

    #[test]
    fn window_offsets() {
        let window = PageWindow::resolve(PageSelector::Number(3), 25, PAGE_SIZE).unwrap();
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.offset(), 20);
        assert_eq!(window.limit(), 10);

        let last = PageWindow::resolve(PageSelector::Last, 25, PAGE_SIZE).unwrap();
        assert_eq!(last.number, 3);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let window = PageWindow::resolve(PageSelector::Last, 20, PAGE_SIZE).unwrap();
        assert_eq!(window.total_pages, 2);
        assert_eq!(
            PageWindow::resolve(PageSelector::Number(3), 20, PAGE_SIZE),
            Err(PaginationError::EmptyPage(3))
        );
    }

    #[test]
    fn empty_listing_has_one_page() {
        let window = PageWindow::resolve(PageSelector::First, 0, PAGE_SIZE).unwrap();
        assert_eq!(window.number, 1);
        assert_eq!(window.total_pages, 1);
        assert!(PageWindow::resolve(PageSelector::Number(2), 0, PAGE_SIZE).is_err());
    }

    #[test]
    fn neighbours() {
        let window = PageWindow::resolve(PageSelector::Number(2), 30, PAGE_SIZE).unwrap();
        let page = Paginated::new(vec![1, 2, 3], window);
        assert_eq!(page.previous_number(), Some(1));
        assert_eq!(page.next_number(), Some(3));
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
    }
}
