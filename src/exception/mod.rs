use crate::error::JsonToolsError;
use axum::response::Response;

pub mod http;

/// The ExceptionFilter trait
///
/// Filters turn errors raised while dispatching a view request into a
/// response. They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an error and return a response
    fn catch(&self, error: JsonToolsError) -> Response;
}

impl<F> ExceptionFilter for F
where
    F: Fn(JsonToolsError) -> Response + Send + Sync + 'static,
{
    fn catch(&self, error: JsonToolsError) -> Response {
        self(error)
    }
}
