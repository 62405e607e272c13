use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, trace};
use time::OffsetDateTime;
use url::Url;

use crate::cookies::{
    ClearableCookieJar, Clock, Cookie, CookieCache, CookieJar, CookiePersistor, SystemClock,
};
use crate::errors::{CookieError, Result};

/// Cache and persistor, only ever reached through the jar's lock.
struct JarState {
    cache: Box<dyn CookieCache>,
    persistor: Box<dyn CookiePersistor>,
}

/// A cookie jar that keeps an in-memory cache and a durable persistor in step.
///
/// Every operation holds one lock for its whole body, including the call into the
/// persistor, so no other jar call ever sees the cache updated while the
/// persistor is not (or the other way around). Persistence I/O therefore blocks
/// other jar calls while it runs.
///
/// - Session cookies (no expiry) only live in the cache.
/// - Persistent cookies are written through to the persistor.
/// - Expired cookies are evicted lazily, from both sides, by the next
///   [`load_for_request`](Self::load_for_request) that scans them.
///
/// If the persistor fails, the error is returned to the caller and the cache
/// mutation that preceded it stays applied.
pub struct PersistentCookieJar {
    state: Mutex<JarState>,
    clock: Arc<dyn Clock>,
}

impl PersistentCookieJar {
    /// Creates a jar and fills its cache from everything `persistor` holds.
    pub fn new(
        cache: impl CookieCache + 'static,
        persistor: impl CookiePersistor + 'static,
    ) -> Result<Self> {
        Self::with_clock(cache, persistor, Arc::new(SystemClock))
    }

    /// Like [`new`](Self::new), reading the current time from `clock`.
    pub fn with_clock(
        cache: impl CookieCache + 'static,
        persistor: impl CookiePersistor + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut state = JarState {
            cache: Box::new(cache),
            persistor: Box::new(persistor),
        };

        let persisted = state.persistor.load_all()?;
        debug!("Loaded {} persisted cookies", persisted.len());
        state.cache.add_all(persisted);

        Ok(Self {
            state: Mutex::new(state),
            clock,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, JarState>> {
        self.state.lock().map_err(|_| CookieError::Poisoned)
    }

    /// Stores `cookies` in the cache and writes the persistent ones through.
    ///
    /// Does not evict expired cookies.
    pub fn save_from_response(&self, url: &Url, cookies: &[Cookie]) -> Result<()> {
        trace!("Saving {} cookies from {}", cookies.len(), url);

        let persistent: Vec<Cookie> = cookies
            .iter()
            .filter(|c| c.is_persistent())
            .cloned()
            .collect();

        let mut state = self.lock()?;
        state.cache.add_all(cookies.to_vec());
        state.persistor.save_all(&persistent)
    }

    /// Returns the unexpired cookies matching `url`, evicting expired ones.
    ///
    /// Expired cookies are never returned, even when they match. They are removed
    /// from the cache during the scan and from the persistor right after it.
    /// The result is sorted by path length (longest first), then by name.
    pub fn load_for_request(&self, url: &Url) -> Result<Vec<Cookie>> {
        let mut expired = Vec::new();
        let mut valid = Vec::new();

        {
            let mut state = self.lock()?;
            // after the lock: time spent waiting on another call counts
            let now = self.clock.now();
            state.cache.retain(&mut |cookie| {
                if cookie.is_expired(now) {
                    expired.push(cookie.clone());
                    false
                } else {
                    if cookie.matches(url) {
                        valid.push(cookie.clone());
                    }
                    true
                }
            });

            if !expired.is_empty() {
                debug!("Evicting {} expired cookies", expired.len());
            }
            state.persistor.remove_all(&expired)?;
        }

        valid.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then_with(|| a.name.cmp(&b.name)));
        Ok(valid)
    }

    /// Drops session cookies by rebuilding the cache from the persistor.
    ///
    /// The persistor itself is left untouched.
    pub fn clear_session(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.cache.clear();
        let persisted = state.persistor.load_all()?;
        debug!("Session cleared, {} persisted cookies restored", persisted.len());
        state.cache.add_all(persisted);
        Ok(())
    }

    /// Drops every cookie from both the cache and the persistor.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.cache.clear();
        debug!("Clearing all cookies");
        state.persistor.clear()
    }

    /// Returns a copy of every cached cookie, expired ones included.
    ///
    /// This is primarily intended for diagnostics/inspection and never evicts.
    pub fn all_cookies(&self) -> Result<Vec<Cookie>> {
        let state = self.lock()?;
        Ok(state.cache.iter().cloned().collect())
    }
}

impl CookieJar for PersistentCookieJar {
    fn save_from_response(&self, url: &Url, cookies: &[Cookie]) -> Result<()> {
        PersistentCookieJar::save_from_response(self, url, cookies)
    }

    fn load_for_request(&self, url: &Url) -> Result<Vec<Cookie>> {
        PersistentCookieJar::load_for_request(self, url)
    }

    fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

impl ClearableCookieJar for PersistentCookieJar {
    fn clear_session(&self) -> Result<()> {
        PersistentCookieJar::clear_session(self)
    }

    fn clear(&self) -> Result<()> {
        PersistentCookieJar::clear(self)
    }
}
