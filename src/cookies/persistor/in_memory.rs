use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::warn;

use crate::cookies::persistor::CookiePersistor;
use crate::cookies::{Cookie, CookieKey};
use crate::errors::{CookieError, Result};

/// In-memory persistor (no durability).
///
/// Clones share their storage, so a second jar built from a clone sees what the
/// first one persisted. That makes it a stand-in for "the same database after a
/// restart" in tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCookiePersistor {
    cookies: Arc<RwLock<HashMap<CookieKey, Cookie>>>,
}

impl InMemoryCookiePersistor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cookies.
    ///
    /// Still counts the entries after a writer panicked; the map is only ever
    /// changed one whole entry at a time.
    pub fn len(&self) -> usize {
        let cookies = self.cookies.read().unwrap_or_else(|poisoned| {
            warn!("In-memory cookie store lock is poisoned");
            PoisonError::into_inner(poisoned)
        });
        cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookiePersistor for InMemoryCookiePersistor {
    fn load_all(&mut self) -> Result<Vec<Cookie>> {
        let cookies = self.cookies.read().map_err(|_| CookieError::Poisoned)?;
        Ok(cookies.values().cloned().collect())
    }

    fn save_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        let mut stored = self.cookies.write().map_err(|_| CookieError::Poisoned)?;
        for cookie in cookies {
            stored.insert(cookie.key(), cookie.clone());
        }
        Ok(())
    }

    fn remove_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        let mut stored = self.cookies.write().map_err(|_| CookieError::Poisoned)?;
        for cookie in cookies {
            stored.remove(&cookie.key());
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.cookies.write().map_err(|_| CookieError::Poisoned)?.clear();
        Ok(())
    }
}
