#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite_cookie_store")]
    #[error("Database error: {0}")]
    Database(#[from] r2d2_sqlite::rusqlite::Error),

    #[cfg(feature = "sqlite_cookie_store")]
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Invalid cookie timestamp: {0}")]
    Timestamp(String),

    #[error("Cookie jar lock is poisoned")]
    Poisoned,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CookieError>;

impl From<tempfile::PersistError> for CookieError {
    fn from(err: tempfile::PersistError) -> Self {
        CookieError::Io(err.error)
    }
}
