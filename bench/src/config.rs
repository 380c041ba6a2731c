//! Configuration resolution.
//!
//! Settings come from an ordered list of [`ConfigLayer`]s. For every key the
//! first layer holding a non-empty value wins. The standard chain built by
//! [`load`] is:
//!
//!   1. positional command-line arguments `[database] [dbuser] [dbpassword]`
//!   2. `DBBENCH_<KEY>` environment variables (key upper-cased)
//!   3. the properties file (`DBBENCH_CONFIG`, else `config.properties`)
//!   4. built-in defaults

use crate::error::{BenchError, Result};
use bench_core::constants::{DEFAULT_TABLE_NAME, MAX_ROWS_INSERTED, MAX_ROWS_PER_COMMIT};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

pub const KEY_DATABASE: &str = "database";
pub const KEY_USER: &str = "dbuser";
pub const KEY_PASSWORD: &str = "dbpassword";
pub const KEY_HOST: &str = "host";
pub const KEY_PORT: &str = "port";
pub const KEY_BACKEND: &str = "backend";
pub const KEY_TABLE_NAME: &str = "tableName";
pub const KEY_MAX_ROWS_PER_COMMIT: &str = "maxRowsPerCommit";
pub const KEY_MAX_ROWS_INSERTED: &str = "maxRowsInserted";

pub const KEYS: [&str; 9] = [
    KEY_DATABASE,
    KEY_USER,
    KEY_PASSWORD,
    KEY_HOST,
    KEY_PORT,
    KEY_BACKEND,
    KEY_TABLE_NAME,
    KEY_MAX_ROWS_PER_COMMIT,
    KEY_MAX_ROWS_INSERTED,
];

/// Command-line positions, in order.
const ARG_KEYS: [&str; 3] = [KEY_DATABASE, KEY_USER, KEY_PASSWORD];

pub const ENV_PREFIX: &str = "DBBENCH_";
pub const ENV_CONFIG_PATH: &str = "DBBENCH_CONFIG";
pub const DEFAULT_PROPERTIES_FILE: &str = "config.properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Database used when no layer names one.
    pub fn default_database(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => ":memory:",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
            other => Err(BenchError::config(format!(
                "unknown backend '{other}' (expected postgres or sqlite)"
            ))),
        }
    }
}

/// Fully resolved and validated settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub backend: Backend,
    /// Database name (PostgreSQL) or file path / `:memory:` (SQLite).
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub table_name: String,
    pub max_rows_per_commit: u32,
    pub max_rows_inserted: u32,
}

/// One source of raw key/value settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayer {
    source: &'static str,
    values: HashMap<String, String>,
}

impl ConfigLayer {
    pub fn new(source: &'static str) -> Self {
        ConfigLayer {
            source,
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Non-empty value for `key`, if this layer has one.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Positional arguments (program name already stripped). Anything past
    /// the password is ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut layer = ConfigLayer::new("command line");
        for (key, value) in ARG_KEYS.iter().zip(args) {
            layer.values.insert(key.to_string(), value.into());
        }
        layer
    }

    /// Pick `DBBENCH_<KEY>` entries out of an environment listing.
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = ConfigLayer::new("environment");
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if let Some(key) = KEYS.iter().find(|k| k.eq_ignore_ascii_case(suffix)) {
                layer.values.insert(key.to_string(), value);
            }
        }
        layer
    }

    /// Read a properties file. Returns `Ok(None)` when the file does not
    /// exist.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BenchError::config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Some(Self::from_properties(&text)))
    }

    /// Parse `key=value` (or `key: value`) lines. Values are taken literally
    /// up to the end of the line; only whole-line `#` and `!` comments exist.
    pub fn from_properties(text: &str) -> Self {
        let mut layer = ConfigLayer::new("properties file");
        for line in text.lines() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(['=', ':']) {
                Some(at) => (&line[..at], &line[at + 1..]),
                None => (line, ""),
            };
            layer
                .values
                .insert(key.trim().to_string(), value.trim_start().to_string());
        }
        layer
    }

    pub fn defaults() -> Self {
        ConfigLayer::new("defaults")
            .with(KEY_BACKEND, "postgres")
            .with(KEY_USER, "postgres")
            .with(KEY_HOST, "localhost")
            .with(KEY_PORT, "5432")
            .with(KEY_TABLE_NAME, DEFAULT_TABLE_NAME)
            .with(KEY_MAX_ROWS_PER_COMMIT, "1000")
            .with(KEY_MAX_ROWS_INSERTED, "10000")
    }
}

fn lookup<'a>(layers: &'a [ConfigLayer], key: &str) -> Option<&'a str> {
    layers.iter().find_map(|layer| layer.get(key))
}

fn parse_number<T: FromStr>(layers: &[ConfigLayer], key: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    let raw = lookup(layers, key)
        .ok_or_else(|| BenchError::config(format!("missing value for '{key}'")))?;
    raw.parse::<T>()
        .map_err(|e| BenchError::config(format!("'{key}' = '{raw}' is not a valid number: {e}")))
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Merge `layers` (highest precedence first) into a validated config.
pub fn resolve(layers: &[ConfigLayer]) -> Result<BenchConfig> {
    let text = |key: &str| lookup(layers, key).unwrap_or_default().to_string();

    let backend = match lookup(layers, KEY_BACKEND) {
        Some(raw) => raw.parse::<Backend>()?,
        None => Backend::Postgres,
    };

    let max_rows_per_commit: u32 = parse_number(layers, KEY_MAX_ROWS_PER_COMMIT)?;
    let max_rows_inserted: u32 = parse_number(layers, KEY_MAX_ROWS_INSERTED)?;
    let port: u16 = parse_number(layers, KEY_PORT)?;

    if max_rows_per_commit > MAX_ROWS_PER_COMMIT || max_rows_inserted > MAX_ROWS_INSERTED {
        return Err(BenchError::config(format!(
            "requested {max_rows_inserted} inserts with a commit every {max_rows_per_commit} rows; \
             limits are {MAX_ROWS_INSERTED} inserts and {MAX_ROWS_PER_COMMIT} rows per commit"
        )));
    }
    if max_rows_per_commit == 0 {
        return Err(BenchError::config("'maxRowsPerCommit' must be at least 1"));
    }

    let table_name = text(KEY_TABLE_NAME);
    if !is_plain_identifier(&table_name) {
        return Err(BenchError::config(format!(
            "table name '{table_name}' is not a plain SQL identifier"
        )));
    }

    let database = lookup(layers, KEY_DATABASE)
        .unwrap_or_else(|| backend.default_database())
        .to_string();

    Ok(BenchConfig {
        backend,
        database,
        user: text(KEY_USER),
        password: text(KEY_PASSWORD),
        host: text(KEY_HOST),
        port,
        table_name,
        max_rows_per_commit,
        max_rows_inserted,
    })
}

/// Build the standard layer chain for `args` (program name stripped) and
/// resolve it.
pub fn load(args: &[String]) -> Result<BenchConfig> {
    let explicit = env::var(ENV_CONFIG_PATH).ok();
    let path = explicit
        .clone()
        .unwrap_or_else(|| DEFAULT_PROPERTIES_FILE.to_string());

    let file_layer = match ConfigLayer::from_properties_file(&path)? {
        Some(layer) => {
            log::info!("Loaded settings from {path}");
            layer
        }
        None if explicit.is_some() => {
            return Err(BenchError::config(format!(
                "properties file {path} (from {ENV_CONFIG_PATH}) does not exist"
            )))
        }
        None => {
            log::warn!("No {path} found, using defaults for unset keys");
            ConfigLayer::new("properties file")
        }
    };

    resolve(&[
        ConfigLayer::from_args(args.iter().cloned()),
        ConfigLayer::from_env_vars(env::vars()),
        file_layer,
        ConfigLayer::defaults(),
    ])
}
