//! Page window over a reader.

use serde::Serialize;

use crate::error::{LoadError, Result};

/// Default number of documents per bulk request.
pub const DEFAULT_MAX_ELEMENTS: i64 = 500;

/// Immutable `(page, size)` cursor describing the next read window.
///
/// `start_at = page * size` and `until = start_at + size - 1`, both inclusive
/// element offsets. Advancing produces a new value; the old one is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagingCriteria {
    page: i64,
    size: i64,
}

impl PagingCriteria {
    /// Create a cursor, rejecting a negative page or a non-positive size.
    pub fn new(page: i64, size: i64) -> Result<Self> {
        if page < 0 {
            return Err(LoadError::Config(format!(
                "page must be zero or greater, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(LoadError::Config(format!(
                "page size must be at least 1, got {}",
                size
            )));
        }
        Ok(Self { page, size })
    }

    /// Cursor for the first page of `size` elements.
    pub fn from_beginning(size: i64) -> Result<Self> {
        Self::new(0, size)
    }

    /// Zero-based page number.
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Maximum number of elements in the window.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Offset of the first element in the window.
    pub fn start_at(&self) -> i64 {
        self.page * self.size
    }

    /// Offset of the last element in the window (inclusive).
    pub fn until(&self) -> i64 {
        self.start_at() + self.size - 1
    }

    /// Cursor for the following page.
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }
}
