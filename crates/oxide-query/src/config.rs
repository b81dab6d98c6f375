//! Connection configuration.
//!
//! Connections are described by [`DbConfig`] and grouped by name in
//! [`ConnectionSettings`], usually loaded from a JSON file:
//!
//! ```json
//! {
//!   "default": "main",
//!   "connections": {
//!     "main": { "driver": "sqlite", "database": "app.db" },
//!     "reporting": {
//!       "driver": "postgresql",
//!       "host": "db.internal",
//!       "database": "reports",
//!       "username": "reader",
//!       "password": "secret"
//!     }
//!   }
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use oxide_query_core::{Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Error, Result};
use crate::sqlite::connect_options;

/// Database drivers a connection can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// SQLite file or in-memory database.
    Sqlite,
    /// PostgreSQL.
    #[serde(alias = "postgres")]
    Postgresql,
    /// MySQL / MariaDB.
    Mysql,
}

impl Driver {
    /// Port used when none is configured.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Sqlite => 0,
            Self::Postgresql => 5432,
            Self::Mysql => 3306,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
        })
    }
}

fn default_host() -> String {
    String::from("localhost")
}

fn default_charset() -> String {
    String::from("utf8mb4")
}

const fn default_pool_size() -> u32 {
    10
}

const fn default_pool_timeout() -> u64 {
    30
}

const fn default_pool_recycle() -> u64 {
    3600
}

/// Settings of one database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Driver.
    pub driver: Driver,
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port; the driver's default when absent.
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name, or the file path for SQLite.
    pub database: String,
    /// User name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Connection charset (MySQL).
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout: u64,
    /// Seconds after which pooled connections are replaced.
    #[serde(default = "default_pool_recycle")]
    pub pool_recycle: u64,
    /// Log every statement at INFO.
    #[serde(default)]
    pub echo: bool,
}

impl DbConfig {
    /// A SQLite configuration for a file path or `:memory:`.
    #[must_use]
    pub fn sqlite(database: &str) -> Self {
        Self {
            driver: Driver::Sqlite,
            host: default_host(),
            port: None,
            database: String::from(database),
            username: String::new(),
            password: String::new(),
            charset: default_charset(),
            pool_size: default_pool_size(),
            pool_timeout: default_pool_timeout(),
            pool_recycle: default_pool_recycle(),
            echo: false,
        }
    }

    /// Connection URL for the driver.
    #[must_use]
    pub fn url(&self) -> String {
        let port = self.port.unwrap_or_else(|| self.driver.default_port());
        match self.driver {
            Driver::Sqlite => format!("sqlite:{}", self.database),
            Driver::Postgresql => format!(
                "postgres://{}:{}@{}:{port}/{}",
                self.username, self.password, self.host, self.database
            ),
            Driver::Mysql => format!(
                "mysql://{}:{}@{}:{port}/{}?charset={}",
                self.username, self.password, self.host, self.database, self.charset
            ),
        }
    }

    /// Dialect statements for this connection are compiled for.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self.driver {
            Driver::Sqlite => &SqliteDialect,
            Driver::Postgresql => &PostgresDialect,
            Driver::Mysql => &MySqlDialect,
        }
    }

    /// Opens a SQLite pool with the configured size and timeouts. The
    /// database file is created when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDriver`] for other drivers, or the
    /// connection error.
    pub async fn connect_sqlite(&self) -> Result<SqlitePool> {
        if self.driver != Driver::Sqlite {
            return Err(Error::UnsupportedDriver(self.driver.to_string()));
        }
        let options = connect_options(&self.url())?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(self.pool_size.max(1))
            .acquire_timeout(Duration::from_secs(self.pool_timeout))
            .max_lifetime(Duration::from_secs(self.pool_recycle))
            .connect_with(options)
            .await?;
        info!(database = %self.database, pool_size = self.pool_size, "Connected to SQLite");
        Ok(pool)
    }
}

fn default_connection_name() -> String {
    String::from("default")
}

/// Named connections plus the name of the default one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default = "default_connection_name")]
    default: String,
    #[serde(default)]
    connections: IndexMap<String, DbConfig>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default: default_connection_name(),
            connections: IndexMap::new(),
        }
    }
}

impl ConnectionSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed text and [`Error::Config`] when
    /// the default connection is not defined.
    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        if !settings.connections.is_empty() && !settings.connections.contains_key(&settings.default)
        {
            return Err(Error::Config(format!(
                "default connection '{}' is not defined",
                settings.default
            )));
        }
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Adds or replaces a connection. The first connection added becomes the
    /// default.
    pub fn add(&mut self, name: &str, config: DbConfig) {
        if self.connections.is_empty() {
            self.default = String::from(name);
        }
        self.connections.insert(String::from(name), config);
    }

    /// Name of the default connection.
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Configured connection names, in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// The named connection, or the default one for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] when no such connection exists.
    pub fn get(&self, name: Option<&str>) -> Result<&DbConfig> {
        let name = name.unwrap_or(&self.default);
        self.connections.get(name).ok_or_else(|| self.unknown(name))
    }

    /// Makes `name` the default connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] when no such connection exists.
    pub fn switch(&mut self, name: &str) -> Result<()> {
        if !self.connections.contains_key(name) {
            return Err(self.unknown(name));
        }
        self.default = String::from(name);
        Ok(())
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownConnection {
            name: String::from(name),
            available: self.names().map(String::from).collect(),
        }
    }
}
