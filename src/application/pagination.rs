//! Offset pagination shared by every listing endpoint.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid page request: {0}")]
    InvalidArgument(String),
}

/// One-based page request. Both fields must be at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: u32,
    pub current_page: u32,
}

impl PageRequest {
    pub const fn new(page_size: u32, current_page: u32) -> Self {
        Self {
            page_size,
            current_page,
        }
    }

    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.page_size == 0 {
            return Err(PaginationError::InvalidArgument(
                "pageSize must be at least 1".to_string(),
            ));
        }
        if self.current_page == 0 {
            return Err(PaginationError::InvalidArgument(
                "currentPage must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of records to skip. Only meaningful after `validate` succeeded.
    pub fn offset(&self) -> u64 {
        u64::from(self.current_page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub total_pages: u64,
    pub results: Vec<T>,
}

impl<T> PageResult<T> {
    /// Builds a page from a total record count. `page_size` is non-zero.
    pub fn from_total(total_count: u64, page_size: u32, results: Vec<T>) -> Self {
        Self {
            total_pages: total_pages(total_count, page_size),
            results,
        }
    }
}

fn total_pages(total_count: u64, page_size: u32) -> u64 {
    match u64::from(page_size) {
        0 => 0,
        size => total_count.div_ceil(size),
    }
}
