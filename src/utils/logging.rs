use anyhow::Error;
use tracing::span::Span;

/// Logs an error inside of a span, so that the log line carries the span's fields
/// (event, repository) even when the span has already been exited.
pub trait LogError {
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Error: {error:?}");
        });
    }
}
