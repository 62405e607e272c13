//! The [`Cookie`] value type.
//!
//! A cookie is an immutable record received from a server. The jar, caches and
//! persistors only ever clone, compare and match cookies; nothing mutates one
//! after it has been built or parsed.
//!
//! This module also carries the small amount of RFC 6265 behavior the jar relies
//! on:
//! - [`Cookie::parse`] turns a `Set-Cookie` header value into a cookie,
//! - [`Cookie::matches`] decides whether a cookie applies to a request URL,
//! - [`cookie_header`] renders the `Cookie` request header.
//!
//! It is **not** a full RFC 6265 implementation: there is no public suffix list,
//! no size limits and no per-domain caps.
//!
//! ```rust
//! use persistent_cookiejar::cookies::Cookie;
//! use time::OffsetDateTime;
//!
//! let url = url::Url::parse("https://example.com/account/login").unwrap();
//! let now = OffsetDateTime::now_utc();
//!
//! let cookie = Cookie::parse(&url, "sid=abc123; Max-Age=3600; HttpOnly", now).unwrap();
//! assert_eq!(cookie.path, "/account");
//! assert!(cookie.is_persistent());
//! assert!(cookie.matches(&url));
//! ```

use std::net::IpAddr;

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc2822;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use url::Url;

/// `Expires` layouts accepted besides RFC 2822. The first one is the IMF-fixdate
/// servers are supposed to send, the second the legacy Netscape form.
const EXPIRES_FORMATS: [&[BorrowedFormatItem<'static>]; 2] = [
    format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    ),
    format_description!(
        "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
    ),
];

/// SameSite policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Parses the attribute value case-insensitively. Unknown values yield `None`.
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("strict") {
            Some(SameSite::Strict)
        } else if value.eq_ignore_ascii_case("lax") {
            Some(SameSite::Lax)
        } else if value.eq_ignore_ascii_case("none") {
            Some(SameSite::None)
        } else {
            None
        }
    }
}

/// Identity of a cookie.
///
/// Two cookies with the same key are "the same cookie": storing the second one
/// replaces the first, and removing either removes the stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub host_only: bool,
}

/// A cookie as received from a server and handed out for requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Domain scoping. For host-only cookies this is the exact host that set it.
    pub domain: String,

    /// Path scoping, always starting with `/`.
    pub path: String,

    /// Absolute expiry. Session cookies have `None`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,

    /// If `true`, cookie only matches `domain` exactly and never its subdomains.
    pub host_only: bool,

    /// SameSite policy, if the server sent one.
    #[serde(default)]
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// Starts building a host-only session cookie with path `/`.
    pub fn builder(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> CookieBuilder {
        CookieBuilder {
            cookie: Cookie {
                name: name.into(),
                value: value.into(),
                domain: domain.into().to_ascii_lowercase(),
                path: "/".to_string(),
                expires_at: None,
                secure: false,
                http_only: false,
                host_only: true,
                same_site: None,
            },
        }
    }

    /// Returns the identity used to deduplicate and remove this cookie.
    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
            secure: self.secure,
            host_only: self.host_only,
        }
    }

    /// A cookie is persistent when it carries an explicit expiry.
    pub fn is_persistent(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Returns `true` once the expiry is no longer in the future.
    ///
    /// A cookie expiring exactly at `now` is expired. Session cookies never expire.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    /// Returns `true` if this cookie should be sent with a request to `url`.
    ///
    /// Applies host/domain matching, path prefix matching and the `Secure` flag.
    /// Expiry is not considered here.
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(host, &self.domain)
        };
        if !domain_ok {
            return false;
        }

        if !path_matches(url.path(), &self.path) {
            return false;
        }

        !self.secure || url.scheme() == "https"
    }

    /// Parses a single `Set-Cookie` header value received from `url`.
    ///
    /// Returns `None` when the header has no `name=value` pair, when the name is
    /// empty, or when a `Domain` attribute does not cover the request host.
    /// `now` anchors `Max-Age`.
    pub fn parse(url: &Url, header: &str, now: OffsetDateTime) -> Option<Cookie> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut expires: Option<OffsetDateTime> = None;
        let mut max_age: Option<OffsetDateTime> = None;
        let mut domain_attr: Option<String> = None;
        let mut path: Option<String> = None;
        let mut secure = false;
        let mut http_only = false;
        let mut same_site = None;

        for part in parts {
            let part = part.trim();
            let (attr, attr_value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (part, ""),
            };

            match attr.to_ascii_lowercase().as_str() {
                "expires" => {
                    if let Some(at) = parse_expires(attr_value) {
                        expires = Some(at);
                    }
                }
                "max-age" => {
                    if let Ok(seconds) = attr_value.parse::<i64>() {
                        max_age = Some(expiry_from_max_age(seconds, now));
                    }
                }
                "domain" => {
                    let domain = attr_value.trim_start_matches('.').to_ascii_lowercase();
                    if !domain.is_empty() {
                        domain_attr = Some(domain);
                    }
                }
                "path" => {
                    if attr_value.starts_with('/') {
                        path = Some(attr_value.to_string());
                    }
                }
                "secure" => secure = true,
                "httponly" => http_only = true,
                "samesite" => same_site = SameSite::parse(attr_value),
                _ => {}
            }
        }

        let host = url.host_str()?.to_ascii_lowercase();
        let (domain, host_only) = match domain_attr {
            Some(domain) => {
                if !domain_matches(&host, &domain) {
                    return None;
                }
                (domain, false)
            }
            None => (host, true),
        };

        Some(Cookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            domain,
            path: path.unwrap_or_else(|| default_path(url).to_string()),
            expires_at: max_age.or(expires),
            secure,
            http_only,
            host_only,
            same_site,
        })
    }

    /// Parses every `Set-Cookie` header in `headers`, skipping rejected ones.
    pub fn parse_all(url: &Url, headers: &HeaderMap, now: OffsetDateTime) -> Vec<Cookie> {
        headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(url, value, now))
            .collect()
    }
}

/// Builder returned by [`Cookie::builder`].
#[derive(Debug, Clone)]
pub struct CookieBuilder {
    cookie: Cookie,
}

impl CookieBuilder {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Makes the cookie persistent.
    pub fn expires_at(mut self, expires_at: OffsetDateTime) -> Self {
        self.cookie.expires_at = Some(expires_at);
        self
    }

    pub fn secure(mut self) -> Self {
        self.cookie.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.cookie.http_only = true;
        self
    }

    /// Lets the cookie match subdomains of its domain as well.
    pub fn domain_wide(mut self) -> Self {
        self.cookie.host_only = false;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = Some(same_site);
        self
    }

    pub fn build(self) -> Cookie {
        self.cookie
    }
}

/// Renders the `Cookie` request header value for `cookies`.
///
/// Returns `None` when there is nothing to send.
pub fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    Some(
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }

    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
        && !is_ip_address(host)
}

fn is_ip_address(host: &str) -> bool {
    host.starts_with('[') || host.parse::<IpAddr>().is_ok()
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Directory of the request path, used when the server sends no usable `Path`.
fn default_path(url: &Url) -> &str {
    url.path()
        .rsplit_once('/')
        .map_or("/", |(dir, _)| if dir.is_empty() { "/" } else { dir })
}

fn expiry_from_max_age(seconds: i64, now: OffsetDateTime) -> OffsetDateTime {
    if seconds <= 0 {
        return OffsetDateTime::UNIX_EPOCH;
    }

    now.checked_add(Duration::seconds(seconds))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

fn parse_expires(value: &str) -> Option<OffsetDateTime> {
    for format in EXPIRES_FORMATS {
        if let Ok(parsed) = PrimitiveDateTime::parse(value, format) {
            return Some(parsed.assume_utc());
        }
    }

    OffsetDateTime::parse(value, &Rfc2822).ok()
}
