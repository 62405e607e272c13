//! A persistent, thread-safe cookie jar for HTTP clients.
//!
//! [`PersistentCookieJar`](cookies::PersistentCookieJar) keeps an in-memory
//! [`CookieCache`](cookies::CookieCache) and a durable
//! [`CookiePersistor`](cookies::CookiePersistor) in step: session cookies live
//! only in memory, persistent cookies are written through, and expired cookies
//! are evicted from both the next time a request would have seen them.

pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;

pub use config::{CookieJarConfig, PersistenceConfig};
pub use errors::{CookieError, Result};
