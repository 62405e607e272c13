use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cookies::{
    InMemoryCookiePersistor, JsonCookiePersistor, PersistentCookieJar, SetCookieCache,
};
#[cfg(feature = "sqlite_cookie_store")]
use crate::cookies::SqliteCookiePersistor;
use crate::errors::{CookieError, Result};

/// Where a jar keeps its persistent cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistenceConfig {
    /// Nothing survives the process (private sessions, tests)
    #[default]
    InMemory,
    /// Single JSON file
    Json { path: PathBuf },
    /// SQLite database
    #[cfg(feature = "sqlite_cookie_store")]
    Sqlite {
        path: PathBuf,
        /// Maximum pooled connections, the persistor's default when absent
        #[serde(default)]
        pool_size: Option<u32>,
    },
}

/// Cookie jar configuration.
///
/// ```json
/// { "persistence": { "kind": "sqlite", "path": "cookies.db" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJarConfig {
    /// Persistence backend for non-session cookies
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl CookieJarConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CookieError::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Opens the configured persistor and builds a jar on top of it.
    pub fn build(&self) -> Result<PersistentCookieJar> {
        let cache = SetCookieCache::new();

        match &self.persistence {
            PersistenceConfig::InMemory => {
                PersistentCookieJar::new(cache, InMemoryCookiePersistor::new())
            }
            PersistenceConfig::Json { path } => {
                PersistentCookieJar::new(cache, JsonCookiePersistor::open(path)?)
            }
            #[cfg(feature = "sqlite_cookie_store")]
            PersistenceConfig::Sqlite { path, pool_size } => {
                let persistor = match pool_size {
                    Some(0) => {
                        return Err(CookieError::Config(
                            "sqlite pool_size must be at least 1".to_string(),
                        ))
                    }
                    Some(size) => SqliteCookiePersistor::open_with_pool_size(path, *size)?,
                    None => SqliteCookiePersistor::open(path)?,
                };
                PersistentCookieJar::new(cache, persistor)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::Cookie;
    use time::OffsetDateTime;
    use url::Url;

    fn persistent_cookie() -> Cookie {
        Cookie::builder("sid", "abc", "example.com")
            .expires_at(OffsetDateTime::now_utc() + time::Duration::hours(1))
            .build()
    }

    #[test]
    fn default_is_in_memory() {
        let config = CookieJarConfig::default();
        assert_eq!(config.persistence, PersistenceConfig::InMemory);
        assert_eq!(CookieJarConfig::from_json_str("{}").unwrap(), config);
    }

    #[test]
    fn parses_json_backend() {
        let config = CookieJarConfig::from_json_str(
            r#"{ "persistence": { "kind": "json", "path": "/tmp/cookies.json" } }"#,
        )
        .unwrap();
        assert_eq!(
            config.persistence,
            PersistenceConfig::Json { path: PathBuf::from("/tmp/cookies.json") }
        );
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = CookieJarConfig::from_json_str(r#"{ "persistence": { "kind": "redis" } }"#)
            .unwrap_err();
        assert!(matches!(err, CookieError::Config(_)));
    }

    #[test]
    fn built_json_jar_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = CookieJarConfig {
            persistence: PersistenceConfig::Json { path: dir.path().join("cookies.json") },
        };
        let u = Url::parse("https://example.com/").unwrap();

        config.build().unwrap().save_from_response(&u, &[persistent_cookie()]).unwrap();
        assert_eq!(config.build().unwrap().load_for_request(&u).unwrap().len(), 1);
    }

    #[cfg(feature = "sqlite_cookie_store")]
    #[test]
    fn sqlite_backend_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cookies.db");
        let config_path = dir.path().join("jar.json");
        fs::write(
            &config_path,
            serde_json::json!({ "persistence": { "kind": "sqlite", "path": db } }).to_string(),
        )
        .unwrap();

        let config = CookieJarConfig::from_file(&config_path).unwrap();
        assert_eq!(
            config.persistence,
            PersistenceConfig::Sqlite { path: db, pool_size: None }
        );

        let u = Url::parse("https://example.com/").unwrap();
        config.build().unwrap().save_from_response(&u, &[persistent_cookie()]).unwrap();
        assert_eq!(config.build().unwrap().load_for_request(&u).unwrap().len(), 1);
    }

    #[cfg(feature = "sqlite_cookie_store")]
    #[test]
    fn zero_pool_size_is_rejected() {
        let config = CookieJarConfig {
            persistence: PersistenceConfig::Sqlite {
                path: PathBuf::from("unused.db"),
                pool_size: Some(0),
            },
        };
        assert!(matches!(config.build(), Err(CookieError::Config(_))));
    }
}
