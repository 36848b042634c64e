//! Page-shaped query results.
//!
//! A [`Page`] is what the persistence layer hands to the resolver when it
//! caches a paginated query: the rows of one page plus enough metadata to
//! rebuild the paging controls without re-running the count query.

use serde::{Deserialize, Serialize};

/// A request for one page of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (0-indexed).
    pub page: usize,
    /// The number of rows per page.
    pub size: usize,
}

impl PageRequest {
    /// The default page size.
    pub const DEFAULT_SIZE: usize = 20;
    /// The maximum allowed page size.
    pub const MAX_SIZE: usize = 1000;

    /// Creates a new page request, clamping the size to [`Self::MAX_SIZE`].
    #[must_use]
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.min(Self::MAX_SIZE),
        }
    }

    /// Row offset of the first row on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page * self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// Paging metadata stored alongside the rows of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// The current page number (0-indexed).
    pub page: usize,
    /// The number of rows per page.
    pub size: usize,
    /// Total rows across all pages.
    pub total_rows: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PageInfo {
    /// Computes paging metadata for a page of `size` rows out of `total_rows`.
    #[must_use]
    pub fn new(page: usize, size: usize, total_rows: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_rows.div_ceil(size as u64)
        };

        Self {
            page,
            size,
            total_rows,
            total_pages,
        }
    }

    /// Whether this is the first page.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.page == 0
    }

    /// Whether this is the last page (an empty result is its own last page).
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.page as u64 + 1 >= self.total_pages
    }
}

/// One page of query results, generic over the row type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Paging metadata.
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Creates a page from its rows and the total row count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_rows: u64) -> Self {
        Self {
            items,
            info: PageInfo::new(request.page, request.size, total_rows),
        }
    }

    /// Creates an empty page.
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Maps the rows to a different type, keeping the metadata.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }

    /// Returns true if the page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if a following page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.info.is_last()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
