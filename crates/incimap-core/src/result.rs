//! Convenience result type alias for Incimap.

use crate::error::AppError;

/// A specialized `Result` type for Incimap operations.
pub type AppResult<T> = Result<T, AppError>;
