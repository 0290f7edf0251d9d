use super::{PIN_VALUE, PropagationChannel};
use async_trait::async_trait;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, request, response};
use std::time::Duration;
use tracing::warn;

/// Keeps pinning evidence in a client-held cookie
#[derive(Debug, Clone)]
pub struct CookieChannel {
    name: String,
}

impl CookieChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn has_cookie(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(COOKIE)
            .iter()
            .flat_map(|value| value.as_bytes().split(|&b| b == b';'))
            .any(|pair| cookie_name(pair) == Some(self.name.as_bytes()))
    }

    fn set_cookie_value(&self, ttl: Duration) -> Option<HeaderValue> {
        let raw = format!("{}={}; Max-Age={}", self.name, PIN_VALUE, ttl.as_secs());
        match HeaderValue::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(cookie = %self.name, %err, "cannot encode pinning cookie");
                None
            }
        }
    }
}

// Works on raw bytes: other cookies' values may hold non-ASCII bytes. A chunk
// without `=` has no name.
fn cookie_name(pair: &[u8]) -> Option<&[u8]> {
    let eq = pair.iter().position(|&b| b == b'=')?;
    Some(pair[..eq].trim_ascii())
}

#[async_trait]
impl PropagationChannel for CookieChannel {
    async fn lookup(&self, request: &request::Parts) -> bool {
        self.has_cookie(&request.headers)
    }

    async fn record(&self, _request: &request::Parts, response: &mut response::Parts, ttl: Duration) {
        let Some(value) = self.set_cookie_value(ttl) else {
            return;
        };

        // Drop any earlier Set-Cookie for our name so the refreshed one wins.
        let others: Vec<HeaderValue> = response
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .filter(|existing| {
                let first = existing.as_bytes().split(|&b| b == b';').next();
                first.and_then(cookie_name) != Some(self.name.as_bytes())
            })
            .cloned()
            .collect();

        response.headers.remove(SET_COOKIE);
        for other in others {
            response.headers.append(SET_COOKIE, other);
        }
        response.headers.append(SET_COOKIE, value);
    }
}
