//! Client configuration.

use std::time::Duration;

use drda_protocol::{Dialect, SessionConfig, UnknownDialect};

use crate::error::{Error, Result};

/// Default Derby network server port.
pub const DEFAULT_PORT: u16 = 1527;

/// Workstation name used when `HOSTNAME` is not set.
pub const DEFAULT_WORKSTATION: &str = "drda-client";

/// Configuration for connecting to a Derby or Db2 server.
#[derive(Clone)]
#[non_exhaustive]
pub struct Config {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Database name.
    pub database: String,

    /// User id; Db2 only.
    pub user: Option<String>,

    /// Password; Db2 only.
    pub password: Option<String>,

    /// Server dialect. `None` picks Derby without a user and Db2 with one.
    pub dialect: Option<Dialect>,

    /// Workstation name reported to Db2 with `SET CLIENT WRKSTNNAME`.
    pub workstation: String,

    /// Locale sent to Db2 with `SET CURRENT LOCALE LC_CTYPE`, if any.
    pub client_locale: Option<String>,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Socket read timeout.
    pub read_timeout: Option<Duration>,

    /// Socket write timeout.
    pub write_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: String::new(),
            user: None,
            password: None,
            dialect: None,
            workstation: std::env::var("HOSTNAME")
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| DEFAULT_WORKSTATION.to_string()),
            client_locale: None,
            connect_timeout: Duration::from_secs(15),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl From<UnknownDialect> for Error {
    fn from(e: UnknownDialect) -> Self {
        Self::Config(e.to_string())
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string.
    ///
    /// ```text
    /// Host=db.local;Port=50000;Database=SAMPLE;User=db2inst1;Password=secret;Dialect=db2
    /// ```
    ///
    /// Keys are case-insensitive. Unknown keys are ignored.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let mut config = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "host" | "server" => {
                    if let Some((host, port)) = value.split_once(':') {
                        config.host = host.to_string();
                        config.port = parse_port(port)?;
                    } else {
                        config.host = value.to_string();
                    }
                }
                "port" => config.port = parse_port(value)?,
                "database" | "db" => config.database = value.to_string(),
                "user" | "user id" | "uid" => config.user = Some(value.to_string()),
                "password" | "pwd" => config.password = Some(value.to_string()),
                "dialect" => config.dialect = Some(value.parse()?),
                "workstation" => config.workstation = value.to_string(),
                "locale" | "client locale" => config.client_locale = Some(value.to_string()),
                "connect timeout" | "connection timeout" => {
                    config.connect_timeout = parse_seconds(value)?;
                }
                "read timeout" => config.read_timeout = Some(parse_seconds(value)?),
                "write timeout" => config.write_timeout = Some(parse_seconds(value)?),
                _ => {
                    tracing::debug!(key = key, "ignoring unknown connection string key");
                }
            }
        }

        if config.database.is_empty() {
            return Err(Error::Config("database is required".into()));
        }

        Ok(config)
    }

    /// Set the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set user id and password.
    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the dialect explicitly.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Set the workstation name.
    #[must_use]
    pub fn workstation(mut self, name: impl Into<String>) -> Self {
        self.workstation = name.into();
        self
    }

    /// Send `SET CURRENT LOCALE LC_CTYPE` with every Db2 statement group.
    #[must_use]
    pub fn client_locale(mut self, locale: impl Into<String>) -> Self {
        self.client_locale = Some(locale.into());
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the socket read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the socket write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Dialect after applying the default rule.
    #[must_use]
    pub fn resolved_dialect(&self) -> Dialect {
        Dialect::resolve(self.dialect, self.user.as_deref())
    }

    /// Build the immutable session settings used for the whole connection.
    pub fn session(&self) -> Result<SessionConfig> {
        if self.database.is_empty() {
            return Err(Error::Config("database is required".into()));
        }
        if self.workstation.contains('\'') {
            return Err(Error::Config(format!(
                "workstation name must not contain quotes: {}",
                self.workstation
            )));
        }
        if self.client_locale.as_deref().is_some_and(|l| l.contains('\'')) {
            return Err(Error::Config("client locale must not contain quotes".into()));
        }
        SessionConfig::new(
            self.resolved_dialect(),
            &self.database,
            self.user.as_deref(),
            self.password.as_deref(),
        )
        .map_err(|e| Error::Config(e.to_string()))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("dialect", &self.dialect)
            .field("workstation", &self.workstation)
            .field("client_locale", &self.client_locale)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid port: {value}")))
}

fn parse_seconds(value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .map_err(|_| Error::Config(format!("invalid timeout: {value}")))?;
    Ok(Duration::from_secs(secs))
}
