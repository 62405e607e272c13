//! SQLite-backed cookie persistor.
//!
//! `SqliteCookiePersistor` stores one row per persistent cookie in a single
//! SQLite database.
//!
//! ## Design
//! - One **table** (`cookies`), primary key = cookie identity
//!   `(name, domain, path, secure, host_only)`.
//! - `save_all` upserts and `remove_all` deletes, each batch inside one
//!   transaction, so a batch is applied completely or not at all.
//! - Database access goes through an `r2d2` pool. The jar serializes calls, but
//!   the pool lets several persistors (or tools) open the same file.
//! - Connections run in WAL mode with a short busy timeout.
//! - `expires_at` is stored as RFC 3339 text; session cookies store `NULL`.
use std::path::Path;
use std::time::Duration;

use log::debug;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::types::Type;
use r2d2_sqlite::rusqlite::{self, params, OpenFlags, Row};
use r2d2_sqlite::SqliteConnectionManager;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cookies::persistor::CookiePersistor;
use crate::cookies::{Cookie, SameSite};
use crate::errors::{CookieError, Result};

/// Pool size used by [`SqliteCookiePersistor::open`].
const DEFAULT_POOL_SIZE: u32 = 4;

/// A SQLite-based persistor that keeps cookies across restarts.
pub struct SqliteCookiePersistor {
    /// Connection pool for the SQLite database
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCookiePersistor {
    /// Opens (or creates) a SQLite database at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_pool_size(path, DEFAULT_POOL_SIZE)
    }

    /// Like [`open`](Self::open) with an explicit maximum number of pooled connections.
    pub fn open_with_pool_size(path: impl AsRef<Path>, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|c| {
                c.busy_timeout(Duration::from_millis(500))?;
                c.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        pool.get()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS cookies (
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                domain TEXT NOT NULL,
                path TEXT NOT NULL,
                secure INTEGER NOT NULL,
                host_only INTEGER NOT NULL,
                http_only INTEGER NOT NULL,
                same_site TEXT,
                expires_at TEXT,
                PRIMARY KEY (name, domain, path, secure, host_only)
            );",
        )?;

        debug!("Opened SQLite cookie database {}", path.as_ref().display());
        Ok(Self { pool })
    }

    /// Borrows a pooled SQLite connection.
    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

impl CookiePersistor for SqliteCookiePersistor {
    fn load_all(&mut self) -> Result<Vec<Cookie>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, value, domain, path, secure, host_only, http_only, same_site, expires_at
             FROM cookies",
        )?;

        let rows = stmt.query_map([], cookie_from_row)?;
        let cookies = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cookies)
    }

    fn save_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut stmt = tx.prepare(
            "INSERT INTO cookies
                 (name, value, domain, path, secure, host_only, http_only, same_site, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(name, domain, path, secure, host_only) DO UPDATE
             SET value=excluded.value, http_only=excluded.http_only,
                 same_site=excluded.same_site, expires_at=excluded.expires_at",
        )?;

        for cookie in cookies {
            stmt.execute(params![
                cookie.name,
                cookie.value,
                cookie.domain,
                cookie.path,
                cookie.secure,
                cookie.host_only,
                cookie.http_only,
                cookie.same_site.map(same_site_to_str),
                expires_to_text(cookie.expires_at)?,
            ])?;
        }

        drop(stmt);

        tx.commit()?;
        Ok(())
    }

    fn remove_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut stmt = tx.prepare(
            "DELETE FROM cookies
             WHERE name=?1 AND domain=?2 AND path=?3 AND secure=?4 AND host_only=?5",
        )?;

        for cookie in cookies {
            stmt.execute(params![
                cookie.name,
                cookie.domain,
                cookie.path,
                cookie.secure,
                cookie.host_only,
            ])?;
        }

        drop(stmt);

        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn()?.execute("DELETE FROM cookies", [])?;
        Ok(())
    }
}

fn cookie_from_row(row: &Row<'_>) -> rusqlite::Result<Cookie> {
    let same_site: Option<String> = row.get(7)?;
    let expires_at: Option<String> = row.get(8)?;

    let expires_at = match expires_at {
        Some(text) => Some(OffsetDateTime::parse(&text, &Rfc3339).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(Cookie {
        name: row.get(0)?,
        value: row.get(1)?,
        domain: row.get(2)?,
        path: row.get(3)?,
        secure: row.get(4)?,
        host_only: row.get(5)?,
        http_only: row.get(6)?,
        same_site: same_site.as_deref().and_then(same_site_from_str),
        expires_at,
    })
}

fn expires_to_text(expires_at: Option<OffsetDateTime>) -> Result<Option<String>> {
    expires_at
        .map(|at| at.format(&Rfc3339))
        .transpose()
        .map_err(|e| CookieError::Timestamp(e.to_string()))
}

fn same_site_to_str(same_site: SameSite) -> &'static str {
    match same_site {
        SameSite::Strict => "Strict",
        SameSite::Lax => "Lax",
        SameSite::None => "None",
    }
}

fn same_site_from_str(s: &str) -> Option<SameSite> {
    match s {
        "Strict" => Some(SameSite::Strict),
        "Lax" => Some(SameSite::Lax),
        "None" => Some(SameSite::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persistent(name: &str, value: &str) -> Cookie {
        Cookie::builder(name, value, "example.com")
            .expires_at(
                OffsetDateTime::from_unix_timestamp_nanos(2_000_000_000_123_456_789).unwrap(),
            )
            .same_site(SameSite::Lax)
            .http_only()
            .build()
    }

    fn sorted(mut cookies: Vec<Cookie>) -> Vec<Cookie> {
        cookies.sort_by(|a, b| a.name.cmp(&b.name));
        cookies
    }

    #[test]
    fn persistor_contract() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = SqliteCookiePersistor::open(dir.path().join("cookies.db")).unwrap();
        assert!(p.load_all().unwrap().is_empty());

        p.save_all(&[persistent("a", "1"), persistent("b", "2")]).unwrap();
        p.save_all(&[persistent("a", "ONE")]).unwrap();
        assert_eq!(
            sorted(p.load_all().unwrap()),
            vec![persistent("a", "ONE"), persistent("b", "2")]
        );

        p.remove_all(&[persistent("b", "ignored"), persistent("missing", "x")]).unwrap();
        assert_eq!(p.load_all().unwrap(), vec![persistent("a", "ONE")]);

        p.clear().unwrap();
        assert!(p.load_all().unwrap().is_empty());
    }

    #[test]
    fn survives_reopen_with_full_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.db");

        {
            let mut p = SqliteCookiePersistor::open(&path).unwrap();
            p.save_all(&[persistent("a", "1")]).unwrap();
        }

        let mut reopened = SqliteCookiePersistor::open_with_pool_size(&path, 1).unwrap();
        assert_eq!(reopened.load_all().unwrap(), vec![persistent("a", "1")]);
    }

    #[test]
    fn identity_includes_secure_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = SqliteCookiePersistor::open(dir.path().join("cookies.db")).unwrap();

        let insecure = persistent("a", "1");
        let mut secure = persistent("a", "2");
        secure.secure = true;

        p.save_all(&[insecure.clone(), secure.clone()]).unwrap();
        assert_eq!(p.load_all().unwrap().len(), 2);

        p.remove_all(&[secure]).unwrap();
        assert_eq!(p.load_all().unwrap(), vec![insecure]);
    }

    #[test]
    fn session_expiry_round_trips_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = SqliteCookiePersistor::open(dir.path().join("cookies.db")).unwrap();

        let session = Cookie::builder("s", "v", "example.com").build();
        p.save_all(&[session.clone()]).unwrap();
        assert_eq!(p.load_all().unwrap(), vec![session]);
    }
}
