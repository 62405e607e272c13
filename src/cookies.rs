//! Cookies: [`PersistentCookieJar`], [`CookieCache`], [`CookiePersistor`] and backends.

mod cache;
mod clock;
mod cookie;
mod cookie_jar;
mod persistent_cookie_jar;
mod persistor;

pub use cookie::cookie_header;
pub use cookie::Cookie;
pub use cookie::CookieBuilder;
pub use cookie::CookieKey;
pub use cookie::SameSite;

pub use cache::CookieCache;
pub use cache::SetCookieCache;

pub use clock::Clock;
pub use clock::SystemClock;

pub use cookie_jar::ClearableCookieJar;
pub use cookie_jar::CookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use persistor::CookiePersistor;
pub use persistor::InMemoryCookiePersistor;
pub use persistor::JsonCookiePersistor;
#[cfg(feature = "sqlite_cookie_store")]
pub use persistor::SqliteCookiePersistor;
