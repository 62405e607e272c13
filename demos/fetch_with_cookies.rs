//! Fetches a URL twice with a persistent cookie jar and prints what the jar holds.
//!
//! ```sh
//! cargo run --example fetch_with_cookies -- https://httpbin.org/cookies/set?demo=1 jar.json
//! ```
//!
//! The second argument is an optional JSON config file (see `CookieJarConfig`).
//! Without it, cookies are kept in `cookies.json` in the current directory.
use std::path::PathBuf;
use std::sync::Arc;

use persistent_cookiejar::{net, CookieJarConfig, PersistenceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://httpbin.org/cookies/set?demo=1".to_string());

    let config = match args.next() {
        Some(path) => CookieJarConfig::from_file(path)?,
        None => CookieJarConfig {
            persistence: PersistenceConfig::Json { path: PathBuf::from("cookies.json") },
        },
    };

    let jar = Arc::new(config.build()?);
    let client = net::client_builder(jar.clone()).build()?;

    for attempt in 1..=2 {
        let resp = client.get(&url).send().await?;
        log::info!("attempt {}: {} {}", attempt, resp.status(), resp.url());
    }

    for cookie in jar.all_cookies()? {
        println!(
            "{}={} domain={} path={} persistent={}",
            cookie.name,
            cookie.value,
            cookie.domain,
            cookie.path,
            cookie.is_persistent()
        );
    }

    if std::env::var_os("CLEAR_SESSION").is_some() {
        jar.clear_session()?;
    }

    Ok(())
}
