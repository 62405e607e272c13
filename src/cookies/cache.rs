//! In-memory cookie cache.
//!
//! A **cookie cache** is the fast, in-process view of the cookies a jar knows
//! about. It is keyed by [`CookieKey`], so it never holds two cookies with the
//! same identity.
//!
//! The cache is a plain data structure and is **not** internally synchronized.
//! [`PersistentCookieJar`](crate::cookies::PersistentCookieJar) owns it behind
//! its own lock, together with the persistor, and is the only thing that ever
//! touches it.

use hashbrown::HashMap;

use crate::cookies::{Cookie, CookieKey};

/// Deduplicated collection of cookies, keyed by identity.
pub trait CookieCache: Send {
    /// Inserts every cookie, replacing any entry with the same identity.
    fn add_all(&mut self, cookies: Vec<Cookie>);

    /// Visits every entry once and removes the ones for which `keep` returns `false`.
    ///
    /// This is the scan-with-removal the jar uses to evict expired cookies and
    /// collect matching ones in a single pass.
    fn retain(&mut self, keep: &mut dyn FnMut(&Cookie) -> bool);

    /// Iterates over the current entries in no particular order.
    fn iter(&self) -> Box<dyn Iterator<Item = &Cookie> + '_>;

    /// Number of cached cookies.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all cookies.
    fn clear(&mut self);
}

/// Default [`CookieCache`] backed by a hash map.
#[derive(Debug, Default, Clone)]
pub struct SetCookieCache {
    cookies: HashMap<CookieKey, Cookie>,
}

impl SetCookieCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieCache for SetCookieCache {
    fn add_all(&mut self, cookies: Vec<Cookie>) {
        for cookie in cookies {
            self.cookies.insert(cookie.key(), cookie);
        }
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&Cookie) -> bool) {
        self.cookies.retain(|_, cookie| keep(cookie));
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Cookie> + '_> {
        Box::new(self.cookies.values())
    }

    fn len(&self) -> usize {
        self.cookies.len()
    }

    fn clear(&mut self) {
        self.cookies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, value: &str) -> Cookie {
        Cookie::builder(name, value, "example.com").build()
    }

    #[test]
    fn add_all_replaces_by_identity() {
        let mut cache = SetCookieCache::new();
        assert!(cache.is_empty());

        cache.add_all(vec![cookie("a", "1"), cookie("b", "2")]);
        assert_eq!(cache.len(), 2);

        // same identity, new value
        cache.add_all(vec![cookie("a", "ONE")]);
        assert_eq!(cache.len(), 2);

        let a = cache.iter().find(|c| c.name == "a").unwrap();
        assert_eq!(a.value, "ONE");
    }

    #[test]
    fn last_duplicate_in_one_batch_wins() {
        let mut cache = SetCookieCache::new();
        cache.add_all(vec![cookie("a", "1"), cookie("a", "2")]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.iter().next().unwrap().value, "2");
    }

    #[test]
    fn different_paths_are_different_cookies() {
        let mut cache = SetCookieCache::new();
        cache.add_all(vec![
            cookie("a", "1"),
            Cookie::builder("a", "2", "example.com").path("/docs").build(),
        ]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn retain_removes_during_scan() {
        let mut cache = SetCookieCache::new();
        cache.add_all(vec![cookie("a", "1"), cookie("b", "2"), cookie("c", "3")]);

        let mut visited = 0;
        cache.retain(&mut |c| {
            visited += 1;
            c.name != "b"
        });

        assert_eq!(visited, 3);
        assert_eq!(cache.len(), 2);
        assert!(cache.iter().all(|c| c.name != "b"));
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = SetCookieCache::new();
        cache.add_all(vec![cookie("a", "1")]);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
    }
}
