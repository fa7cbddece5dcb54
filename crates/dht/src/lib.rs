//! DHT11 / DHT22 temperature and humidity sensors on a Linux GPIO line.
//!
//! The sensor answers a start pulse with 40 bits, each encoded as the width
//! of a high pulse. [`Dht`] captures those pulses from userspace through the
//! GPIO character device, [`Frame`] turns them into bytes and [`Measurement`]s.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

mod decode;
mod driver;
mod measurement;

use std::time::Duration;

pub use decode::{Frame, DATA_BITS};
pub use driver::{Dht, DhtError};
pub use measurement::Measurement;

/// Sensor models sharing the single-wire DHT protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Model {
    Dht11,
    Dht22,
}

impl Model {
    /// How long the host holds the line low to wake the sensor.
    pub fn start_signal(self) -> Duration {
        match self {
            Model::Dht11 => Duration::from_millis(18),
            Model::Dht22 => Duration::from_millis(1),
        }
    }
}
