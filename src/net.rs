//! HTTP client integration.
//!
//! [`PersistentCookieJar`] implements [`reqwest::cookie::CookieStore`], so it can be
//! plugged straight into a `reqwest` client:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use persistent_cookiejar::cookies::{JsonCookiePersistor, PersistentCookieJar, SetCookieCache};
//!
//! let jar = PersistentCookieJar::new(
//!     SetCookieCache::new(),
//!     JsonCookiePersistor::open("cookies.json").unwrap(),
//! ).unwrap();
//!
//! let client = persistent_cookiejar::net::client_builder(Arc::new(jar)).build().unwrap();
//! ```
//!
//! The reqwest trait cannot report errors. Persistence failures are logged and the
//! affected request simply goes out without (or with stale) cookies.
use std::sync::Arc;

use http::HeaderValue;
use log::error;
use url::Url;

use crate::cookies::{cookie_header, Cookie, CookieJar, PersistentCookieJar};

/// Returns a `reqwest` client builder that reads and writes cookies through `jar`.
pub fn client_builder(jar: Arc<PersistentCookieJar>) -> reqwest::ClientBuilder {
    reqwest::Client::builder().cookie_provider(jar)
}

impl reqwest::cookie::CookieStore for PersistentCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let now = CookieJar::now(self);
        let cookies: Vec<Cookie> = cookie_headers
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(url, value, now))
            .collect();

        if cookies.is_empty() {
            return;
        }

        if let Err(e) = self.save_from_response(url, &cookies) {
            error!("Cannot store cookies for {}: {}", url, e);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = match self.load_for_request(url) {
            Ok(cookies) => cookies,
            Err(e) => {
                error!("Cannot load cookies for {}: {}", url, e);
                return None;
            }
        };

        HeaderValue::from_str(&cookie_header(&cookies)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{InMemoryCookiePersistor, SetCookieCache};
    use reqwest::cookie::CookieStore;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid URL")
    }

    fn in_memory_jar() -> PersistentCookieJar {
        PersistentCookieJar::new(SetCookieCache::new(), InMemoryCookiePersistor::new()).unwrap()
    }

    #[test]
    fn round_trips_through_reqwest_trait() {
        let persistor = InMemoryCookiePersistor::new();
        let jar = PersistentCookieJar::new(SetCookieCache::new(), persistor.clone()).unwrap();
        let u = url("https://example.com/app/");

        let headers = [
            HeaderValue::from_static("sid=abc; Max-Age=3600; Path=/"),
            HeaderValue::from_static("theme=dark"),
            HeaderValue::from_static("garbage"),
        ];
        jar.set_cookies(&mut headers.iter(), &u);

        // only the Max-Age cookie is persistent
        assert_eq!(persistor.len(), 1);

        let header = jar.cookies(&url("https://example.com/app/page")).unwrap();
        assert_eq!(header.to_str().unwrap(), "theme=dark; sid=abc");

        // theme was scoped to /app by default
        let header = jar.cookies(&url("https://example.com/")).unwrap();
        assert_eq!(header.to_str().unwrap(), "sid=abc");
    }

    #[test]
    fn no_matching_cookies_yields_no_header() {
        let jar = in_memory_jar();
        assert!(jar.cookies(&url("https://example.com/")).is_none());
    }

    #[test]
    fn client_builder_accepts_jar() {
        let jar = in_memory_jar();
        assert!(client_builder(Arc::new(jar)).build().is_ok());
    }
}
