//! Cookie jar abstraction.
//!
//! A **cookie jar** is what an HTTP client talks to: it hands over the cookies a
//! response delivered and asks which cookies to attach to the next request.
//!
//! [`CookieJar`] works on parsed [`Cookie`] values. Its provided methods
//! [`store_response_cookies`](CookieJar::store_response_cookies) and
//! [`get_request_cookies`](CookieJar::get_request_cookies) add the header-level
//! plumbing on top (`Set-Cookie` in, `Cookie` out) for clients that deal in raw
//! [`HeaderMap`]s.
//!
//! [`ClearableCookieJar`] adds the two reset operations a persistent jar needs.

use http::HeaderMap;
use time::OffsetDateTime;
use url::Url;

use crate::cookies::{cookie_header, Cookie};
use crate::errors::Result;

/// A jar keeps the cookies of one client.
///
/// Implementations are shared between threads and must synchronize internally.
pub trait CookieJar: Send + Sync {
    /// Stores the cookies a response from `url` delivered.
    ///
    /// Cookies replace stored cookies with the same identity ("last write wins").
    fn save_from_response(&self, url: &Url, cookies: &[Cookie]) -> Result<()>;

    /// Returns the stored, unexpired cookies that apply to a request to `url`.
    fn load_for_request(&self, url: &Url) -> Result<Vec<Cookie>>;

    /// Current time as seen by this jar. Anchors `Max-Age` when parsing headers.
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Parses all `Set-Cookie` headers in `headers` and stores the result.
    ///
    /// Headers that fail to parse are skipped.
    fn store_response_cookies(&self, url: &Url, headers: &HeaderMap) -> Result<()> {
        let cookies = Cookie::parse_all(url, headers, self.now());
        if cookies.is_empty() {
            return Ok(());
        }
        self.save_from_response(url, &cookies)
    }

    /// Returns the `Cookie` request header value to send for `url`, if any.
    fn get_request_cookies(&self, url: &Url) -> Result<Option<String>> {
        Ok(cookie_header(&self.load_for_request(url)?))
    }
}

/// A [`CookieJar`] that can drop its session state or everything it holds.
pub trait ClearableCookieJar: CookieJar {
    /// Drops session cookies and reloads the persisted ones.
    fn clear_session(&self) -> Result<()>;

    /// Drops all cookies, persisted ones included.
    fn clear(&self) -> Result<()>;
}
