//! Explicit "a write happened" marker carried on responses.
//!
//! Handlers that write while serving a read-only method (a `GET` that bumps a
//! counter, for instance) attach [`DbWrite`] so the recorder propagates the
//! pin anyway. The marker is never inferred.

use axum::response::{IntoResponse, Response};
use http::response::Parts;

/// Response extension declaring that handling performed a database write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbWrite;

/// Flag `response` as having written
pub fn mark_as_write<B>(response: &mut http::Response<B>) {
    response.extensions_mut().insert(DbWrite);
}

/// Whether the response carries [`DbWrite`]; absence means no write
pub fn has_write_marker(parts: &Parts) -> bool {
    parts.extensions.get::<DbWrite>().is_some()
}

/// Response wrapper that sets [`DbWrite`] on whatever `T` renders to
#[derive(Debug, Clone)]
pub struct Wrote<T>(pub T);

impl<T: IntoResponse> IntoResponse for Wrote<T> {
    fn into_response(self) -> Response {
        let mut response = self.0.into_response();
        mark_as_write(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarked_response() {
        let (parts, _) = http::Response::new(()).into_parts();
        assert!(!has_write_marker(&parts));
    }

    #[test]
    fn test_mark_as_write() {
        let mut response = http::Response::new(());
        mark_as_write(&mut response);
        let (parts, _) = response.into_parts();
        assert!(has_write_marker(&parts));
    }

    #[test]
    fn test_wrote_wrapper_marks_response() {
        let response = Wrote("ok").into_response();
        let (parts, _) = response.into_parts();
        assert!(has_write_marker(&parts));
    }
}
