//! Cookie persistence infrastructure.
//!
//! A **cookie persistor** is the durable side of a jar. It holds exactly the
//! persistent cookies (those with an explicit expiry) that were saved and not
//! yet removed or cleared, keyed by [`CookieKey`](crate::cookies::CookieKey).
//! After a restart, the persistor is the source of truth the jar's cache is
//! rebuilt from.
//!
//! This module exports three implementations:
//! - [`InMemoryCookiePersistor`]: no durability, for tests and private sessions.
//! - [`JsonCookiePersistor`]: a single JSON file (good for simple setups).
//! - [`SqliteCookiePersistor`]: a SQLite database (good for large jars), behind
//!   the default `sqlite_cookie_store` feature.
//!
//! ## Design notes
//! - Persistors are owned by exactly one [`PersistentCookieJar`], which only calls
//!   them while holding its lock. The methods therefore take `&mut self` and
//!   implementations need no locking of their own.
//! - Each backend defines its own atomicity. The jar only assumes that a call
//!   either completes or returns an error.
//!
//! ## Example
//! ```rust,no_run
//! use persistent_cookiejar::cookies::{JsonCookiePersistor, PersistentCookieJar, SetCookieCache};
//!
//! let persistor = JsonCookiePersistor::open("cookies.json").unwrap();
//! let jar = PersistentCookieJar::new(SetCookieCache::new(), persistor).unwrap();
//! ```
//!
//! [`PersistentCookieJar`]: crate::cookies::PersistentCookieJar
mod in_memory;
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use crate::cookies::Cookie;
use crate::errors::Result;

/// Non-durable persistor; clones share the same storage.
pub use in_memory::InMemoryCookiePersistor;
/// File-backed JSON persistor.
pub use json::JsonCookiePersistor;
/// SQLite-backed persistor.
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteCookiePersistor;

/// Durable storage for persistent cookies.
///
/// All operations are synchronous: the jar does not continue until a call has
/// returned. Errors are handed back to the caller of the jar operation that
/// triggered them.
pub trait CookiePersistor: Send {
    /// Returns every cookie currently stored.
    fn load_all(&mut self) -> Result<Vec<Cookie>>;

    /// Inserts or replaces each cookie by identity.
    ///
    /// The jar only passes cookies whose [`is_persistent`](Cookie::is_persistent)
    /// is `true`.
    fn save_all(&mut self, cookies: &[Cookie]) -> Result<()>;

    /// Deletes each cookie by identity. Unknown identities are ignored.
    fn remove_all(&mut self, cookies: &[Cookie]) -> Result<()>;

    /// Deletes everything.
    fn clear(&mut self) -> Result<()>;
}
