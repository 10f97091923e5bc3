//! Service configuration.
//!
//! Loaded from (later sources override earlier ones):
//! 1. Default values
//! 2. Config file (`--config <path>`, else `marksd.toml` if present)
//! 3. Raw `SQL_SERVER` / `SQL_DATABASE` / `SQL_USERNAME` / `SQL_PASSWORD`
//! 4. Environment variables (`MARKSD_*`, `__` separates nested keys)

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "marksd.toml";

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory holding the database file.
    #[serde(default = "default_sql_server", deserialize_with = "lenient_string")]
    pub sql_server: String,

    /// Database name; the file is `<sql_server>/<sql_database>.sqlite3`.
    #[serde(default = "default_sql_database", deserialize_with = "lenient_string")]
    pub sql_database: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub sql_username: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub sql_password: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Idle connections kept by the pool.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_username", deserialize_with = "lenient_string")]
    pub username: String,

    /// Plain password; hashed when credentials are built.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub password: Option<String>,

    /// Hex SHA-256 digest of the password. Wins over `password`.
    #[serde(default)]
    pub password_sha256: Option<String>,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Reject API calls that do not carry a live session.
    #[serde(default)]
    pub require_session: bool,
}

// Env values such as `SQL_PASSWORD=12345` arrive as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(v) => v.to_string(),
            Scalar::Uint(v) => v.to_string(),
            Scalar::Float(v) => v.to_string(),
            Scalar::Bool(v) => v.to_string(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(|v| v.map(Scalar::into_string))
}

fn default_sql_server() -> String {
    "data".to_string()
}

fn default_sql_database() -> String {
    "StudentMarks".to_string()
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_pool_max_idle() -> usize {
    8
}

fn default_auth_username() -> String {
    "admin".to_string()
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sql_server: default_sql_server(),
            sql_database: default_sql_database(),
            sql_username: String::new(),
            sql_password: String::new(),
            bind_addr: default_bind_addr(),
            pool_max_idle: default_pool_max_idle(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_auth_username(),
            password: None,
            password_sha256: None,
            session_ttl_secs: default_session_ttl_secs(),
            require_session: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sql_server", &self.sql_server)
            .field("sql_database", &self.sql_database)
            .field("sql_username", &self.sql_username)
            .field("sql_password", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("pool_max_idle", &self.pool_max_idle)
            .field("auth", &self.auth)
            .finish()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_sha256", &self.password_sha256.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("require_session", &self.require_session)
            .finish()
    }
}

impl Config {
    /// Builds the layered provider without extracting it.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let file = config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::raw().only(&["SQL_SERVER", "SQL_DATABASE", "SQL_USERNAME", "SQL_PASSWORD"]))
            .merge(Env::prefixed("MARKSD_").split("__"))
    }

    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if any source holds a value of the wrong shape, or if
    /// an explicitly named config file does not exist.
    pub fn load(config_file: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = config_file {
            if !path.is_file() {
                anyhow::bail!("config file not found: {}", path.display());
            }
        }
        let config: Config = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.sql_database.trim().is_empty() {
            anyhow::bail!("SQL_DATABASE must not be empty");
        }
        if self.sql_database.trim() == ":memory:" {
            anyhow::bail!("in-memory databases are not supported; name a database file");
        }
        if self.auth.username.trim().is_empty() {
            anyhow::bail!("auth.username must not be empty");
        }
        if self.auth.session_ttl_secs == 0 {
            anyhow::bail!("auth.session_ttl_secs must be positive");
        }
        Ok(())
    }
}
