//! Weather station: samples a DHT sensor on a fixed cadence and stores each
//! trusted reading as a row in MySQL.
//!
//! ```text
//! PollingLoop -> ReadingSampler -> SensorDriver
//!             -> ReadingRecorder -> StorageSink
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod config;
pub mod polling;
pub mod reading;
pub mod recorder;
pub mod sampler;
pub mod sensor;
pub mod shutdown;
pub mod storage;

pub use config::{ConfigError, PollingConfig, StationConfig, StationCredentials, TableName};
pub use polling::{LoopOutcome, PollingLoop};
pub use reading::{PersistenceRecord, TrustedReading, STATION_LABEL};
pub use recorder::ReadingRecorder;
pub use sampler::{ReadingSampler, SampleError};
pub use sensor::{SensorDriver, SensorEndpoint, SensorKind};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use storage::{MySqlSink, RecordResult, StorageError, StorageSink};

pub use dht::Measurement;
