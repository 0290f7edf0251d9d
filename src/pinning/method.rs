//! Read/write classification of request methods.

use http::Method;

/// Methods presumed not to mutate state
pub const READ_ONLY_METHODS: [Method; 4] = [Method::GET, Method::TRACE, Method::HEAD, Method::OPTIONS];

/// Returns `true` if `method` is in [`READ_ONLY_METHODS`]
///
/// Anything else, extension methods included, counts as a write.
pub fn is_read_only(method: &Method) -> bool {
    READ_ONLY_METHODS.contains(method)
}
