//! Growing display window for "load more" style pagination.

use serde::{Deserialize, Serialize};

/// Default number of items revealed per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Maximum page size.
const MAX_PAGE_SIZE: usize = 200;

/// A window over a filtered list, always starting at offset 0.
///
/// `load_more` extends the window by one page; `reset` collapses it back
/// to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// Number of items per page.
    page_size: usize,
    /// Number of pages currently revealed (at least one).
    pages: usize,
}

impl PageWindow {
    /// Create a window showing the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            pages: 1,
        }
    }

    /// Maximum number of visible items.
    pub fn limit(&self) -> usize {
        self.page_size.saturating_mul(self.pages)
    }

    /// Number of items per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reveal one more page.
    pub fn load_more(&mut self) {
        self.pages = self.pages.saturating_add(1);
    }

    /// Collapse back to the first page.
    pub fn reset(&mut self) {
        self.pages = 1;
    }

    /// Whether items beyond the window exist in a set of `total` items.
    pub fn has_more(&self, total: usize) -> bool {
        self.visible(total) < total
    }

    /// Number of items the window shows out of `total`.
    pub fn visible(&self, total: usize) -> usize {
        total.min(self.limit())
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Slice `items` to `[offset, offset + limit)`, clamped to the bounds.
pub fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    let start = offset.min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    items[start..end].to_vec()
}
