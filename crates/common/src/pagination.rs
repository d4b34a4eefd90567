//! Offset/limit pagination shared by the service and HTTP layers.
//!
//! `skip` is unsigned so it can never go negative; `limit` is bounded by
//! [`MAX_LIMIT`] and rejected (not clamped) when it exceeds it.

use thiserror::Error;

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 500;
/// Largest offset SQL backends accept (a signed 64-bit bind).
pub const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("limit must be less than or equal to {max}, got {got}")]
    LimitTooLarge { got: u64, max: u64 },
}

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// rows to skip before the page starts
    pub skip: u64,
    /// max rows in the page
    pub limit: u64,
}

impl Pagination {
    pub fn new(skip: u64, limit: u64) -> Self { Self { skip, limit } }

    /// Rejects an oversized `limit`. An offset past [`MAX_SKIP`] is clamped:
    /// no table holds that many rows, so the page is empty either way.
    pub fn validate(self) -> Result<Self, PaginationError> {
        if self.limit > MAX_LIMIT {
            return Err(PaginationError::LimitTooLarge { got: self.limit, max: MAX_LIMIT });
        }
        Ok(Self { skip: self.offset(), limit: self.limit })
    }

    /// `skip` bounded to what a SQL `OFFSET` bind can carry.
    pub fn offset(&self) -> u64 {
        self.skip.min(MAX_SKIP)
    }

    /// Apply to an in-memory sequence.
    pub fn slice<T: Clone>(&self, rows: &[T]) -> Vec<T> {
        rows.iter()
            .skip(usize::try_from(self.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { skip: 0, limit: DEFAULT_LIMIT } }
}
