//! JSON-backed cookie persistor.
//!
//! `JsonCookiePersistor` keeps every persistent cookie of one jar in a single
//! JSON file on disk.
//!
//! ### Design
//! - One file per jar: `{ "version": 1, "cookies": [ ... ] }`.
//! - No in-memory copy. Every mutation **reads then rewrites** the whole file,
//!   so two persistors opened on the same path stay consistent as long as only
//!   one jar writes at a time.
//! - Writes go to a temporary file in the same directory which is then renamed
//!   over the target, so a crash never leaves a half-written file behind.
//!
//! ### I/O characteristics & caveats
//! - Cost of each write is proportional to the size of the jar. For large jars,
//!   consider [`SqliteCookiePersistor`](crate::cookies::SqliteCookiePersistor).
//! - A file that cannot be parsed is reported as
//!   [`CookieError::Serialization`]; it is never silently replaced.
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::cookies::persistor::CookiePersistor;
use crate::cookies::{Cookie, CookieKey};
use crate::errors::{CookieError, Result};

const FILE_VERSION: u32 = 1;

/// On-disk representation of a jar's persistent cookies.
#[derive(Debug, Serialize, Deserialize)]
struct CookieFile {
    version: u32,
    cookies: Vec<Cookie>,
}

/// A JSON-file persistor.
#[derive(Debug, Clone)]
pub struct JsonCookiePersistor {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,
}

impl JsonCookiePersistor {
    /// Opens the JSON cookie file at `path`.
    ///
    /// If the file does not exist, an empty one is written so that later
    /// permission or path problems surface here rather than on the first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let persistor = Self { path: path.into() };

        if !persistor.path.exists() {
            debug!("Creating cookie file {}", persistor.path.display());
            persistor.save_file(HashMap::new())?;
        }

        Ok(persistor)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the cookie file, keyed by identity.
    ///
    /// A missing file reads as empty.
    fn load_file(&self) -> Result<HashMap<CookieKey, Cookie>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        let file: CookieFile = serde_json::from_str(&contents)?;
        if file.version != FILE_VERSION {
            return Err(CookieError::Serialization(serde::de::Error::custom(format!(
                "unsupported cookie file version {}",
                file.version
            ))));
        }

        Ok(file.cookies.into_iter().map(|c| (c.key(), c)).collect())
    }

    /// Serializes and atomically replaces the cookie file (pretty-printed).
    fn save_file(&self, cookies: HashMap<CookieKey, Cookie>) -> Result<()> {
        let mut cookies: Vec<Cookie> = cookies.into_values().collect();
        cookies.sort_by(|a, b| {
            (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name))
        });
        trace!("Writing {} cookies to {}", cookies.len(), self.path.display());

        let contents = serde_json::to_vec_pretty(&CookieFile {
            version: FILE_VERSION,
            cookies,
        })?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;

        Ok(())
    }
}

impl CookiePersistor for JsonCookiePersistor {
    fn load_all(&mut self) -> Result<Vec<Cookie>> {
        Ok(self.load_file()?.into_values().collect())
    }

    fn save_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }

        let mut stored = self.load_file()?;
        for cookie in cookies {
            stored.insert(cookie.key(), cookie.clone());
        }
        self.save_file(stored)
    }

    fn remove_all(&mut self, cookies: &[Cookie]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }

        let mut stored = self.load_file()?;
        for cookie in cookies {
            stored.remove(&cookie.key());
        }
        self.save_file(stored)
    }

    fn clear(&mut self) -> Result<()> {
        self.save_file(HashMap::new())
    }
}
