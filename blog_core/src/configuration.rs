//! Configuration for the application logic.
//!
//! It's loaded by the `blog_server` crate, as part of the top-level
//! configuration of the process.
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use ubyte::{ByteUnit, ToByteUnit};

use crate::http::BodySizeLimit;

#[derive(serde::Deserialize, Debug, Clone)]
/// Configuration for the application itself.
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub body_size_limit: BodySizeLimitConfig,
}

#[derive(serde::Deserialize, Debug, Clone)]
/// Where articles are stored.
pub struct DatabaseConfig {
    /// A SQLite connection string, e.g. `sqlite://blog.db` or `sqlite::memory:`.
    pub url: String,
    /// The maximum number of connections kept in the pool.
    ///
    /// In-memory databases are private to each connection:
    /// set it to `1` when using `sqlite::memory:`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Create the database file if it doesn't exist.
    #[serde(default)]
    pub create_if_missing: bool,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// Return the database connection options.
    pub fn connection_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(&self.url)?.create_if_missing(self.create_if_missing))
    }

    /// Return a database connection pool.
    pub async fn get_pool(&self) -> Result<SqlitePool, sqlx::Error> {
        let mut options = SqlitePoolOptions::new().max_connections(self.max_connections);
        if self.is_in_memory() {
            // The database goes away with the last connection.
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        options.connect_with(self.connection_options()?).await
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

#[derive(serde::Deserialize, Debug, Clone, Copy)]
/// The upper limit on the size of incoming request bodies.
pub struct BodySizeLimitConfig {
    /// Set it to `false` to accept bodies of any size.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The maximum size of incoming request bodies, e.g. `2 MB`.
    #[serde(default = "default_max_size")]
    pub max_size: ByteUnit,
}

fn default_enabled() -> bool {
    true
}

fn default_max_size() -> ByteUnit {
    2.megabytes()
}

impl Default for BodySizeLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size: default_max_size(),
        }
    }
}

impl From<BodySizeLimitConfig> for BodySizeLimit {
    fn from(config: BodySizeLimitConfig) -> Self {
        if config.enabled {
            BodySizeLimit::Enabled {
                max_size: config.max_size,
            }
        } else {
            BodySizeLimit::Disabled
        }
    }
}
