//! Station configuration, read once from a JSON file at startup.
//!
//! ```json
//! {
//!   "database": {"name": "weather", "user": "pi", "host": "localhost", "table": "readings"},
//!   "sensors": [{"name": "DHT11", "pin": 4}],
//!   "polling": {"readInterval": 60, "maxRetries": 10, "repeatLimit": 10}
//! }
//! ```
//!
//! A `station` block (`ip`, `port`, `buffSize`) is tolerated and ignored.

use std::{env, fmt, fs, io, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::sensor::{SensorEndpoint, SensorKind};

/// Overrides `database.password` when set.
pub const PASSWORD_ENV: &str = "STATION_DB_PASSWORD";

const DEFAULT_CHIP: &str = "/dev/gpiochip0";
const MAX_TABLE_NAME: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown sensor kind `{0}`")]
    UnknownSensor(String),
    #[error("no sensors configured")]
    NoSensors,
    #[error("invalid table name `{0}`")]
    InvalidTable(String),
    #[error("no database password, set `database.password` or STATION_DB_PASSWORD")]
    MissingPassword,
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

/// Timing and budgets of the polling loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Seconds to idle between cycles.
    pub read_interval: u64,
    /// Sensor reads per sampling attempt.
    pub max_retries: u32,
    /// Consecutive failed cycles before the loop gives up.
    pub repeat_limit: u32,
    /// Pause between sensor reads within one sampling attempt. Zero reads
    /// back-to-back.
    pub retry_delay_ms: u64,
    /// Whether a failed cycle idles before the next one.
    pub sleep_after_failure: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            read_interval: 60,
            max_retries: 10,
            repeat_limit: 10,
            retry_delay_ms: 0,
            sleep_after_failure: true,
        }
    }
}

impl PollingConfig {
    pub fn read_interval(&self) -> Duration {
        Duration::from_secs(self.read_interval)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Zero("maxRetries"));
        }
        if self.repeat_limit == 0 {
            return Err(ConfigError::Zero("repeatLimit"));
        }
        Ok(self)
    }
}

/// A table identifier safe to splice into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`, at most 64 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.len() <= MAX_TABLE_NAME;

        if valid {
            Ok(Self(name))
        } else {
            Err(ConfigError::InvalidTable(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name quoted as a MySQL identifier.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Database connection details.
#[derive(Clone)]
pub struct StationCredentials {
    pub host: String,
    pub user: String,
    password: String,
    pub database: String,
    pub table: TableName,
}

impl StationCredentials {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        table: TableName,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            table,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for StationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("table", &self.table)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StationConfig {
    pub credentials: StationCredentials,
    sensors: Vec<SensorEndpoint>,
    pub polling: PollingConfig,
}

#[derive(Deserialize)]
struct RawConfig {
    database: RawDatabase,
    sensors: Vec<RawSensor>,
    #[serde(default)]
    polling: PollingConfig,
}

#[derive(Deserialize)]
struct RawDatabase {
    name: String,
    user: String,
    host: String,
    table: String,
    password: Option<String>,
}

#[derive(Deserialize)]
struct RawSensor {
    name: String,
    pin: u32,
    chip: Option<PathBuf>,
}

impl StationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let password = env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());
        Self::parse(json, password)
    }

    fn parse(json: &str, password_override: Option<String>) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        let password = password_override
            .or(raw.database.password)
            .ok_or(ConfigError::MissingPassword)?;

        let credentials = StationCredentials::new(
            raw.database.host,
            raw.database.user,
            password,
            raw.database.name,
            TableName::new(raw.database.table)?,
        );

        let sensors = raw
            .sensors
            .into_iter()
            .map(|sensor| {
                let kind: SensorKind = sensor
                    .name
                    .parse()
                    .map_err(|_| ConfigError::UnknownSensor(sensor.name.clone()))?;
                Ok(SensorEndpoint {
                    kind,
                    chip: sensor.chip.unwrap_or_else(|| PathBuf::from(DEFAULT_CHIP)),
                    pin: sensor.pin,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }

        Ok(Self {
            credentials,
            sensors,
            polling: raw.polling.validate()?,
        })
    }

    /// All configured sensors, never empty.
    pub fn sensors(&self) -> &[SensorEndpoint] {
        &self.sensors
    }

    /// The sensor the station polls: the first one configured.
    pub fn primary_sensor(&self) -> &SensorEndpoint {
        &self.sensors[0]
    }
}
