//! Result type alias for client operations.

use super::context::ErrorContext;
use super::spark_error::SparkError;

/// Type alias for Results using SparkError.
pub type SparkResult<T> = Result<T, SparkError>;

/// Extension trait for Result types to add context to errors.
///
/// ```ignore
/// use spark_cloud::error::{ErrorContext, ResultExt};
///
/// let value = fetch_variable(&id, "temp")
///     .await
///     .context(ErrorContext::new("get_variable").with_device_id(&id))?;
/// ```
pub trait ResultExt<T> {
    fn context(self, ctx: ErrorContext) -> SparkResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> SparkResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<SparkError>,
{
    fn context(self, ctx: ErrorContext) -> SparkResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> SparkResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
