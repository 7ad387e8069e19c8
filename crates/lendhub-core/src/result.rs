//! Convenience result type alias for LendHub.

use crate::error::AppError;

/// A specialized `Result` type for LendHub operations.
pub type AppResult<T> = Result<T, AppError>;
