use time::OffsetDateTime;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC. Used unless a jar is built with [`PersistentCookieJar::with_clock`].
///
/// [`PersistentCookieJar::with_clock`]: crate::cookies::PersistentCookieJar::with_clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
