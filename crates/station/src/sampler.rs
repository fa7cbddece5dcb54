use std::time::Duration;

use chrono::Local;
use thiserror::Error;

use crate::{reading::TrustedReading, sensor::SensorDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Reads the sensor until it yields a valid measurement or the retry budget
/// runs out.
pub struct ReadingSampler<D> {
    driver: D,
    max_retries: u32,
    retry_delay: Duration,
}

impl<D: SensorDriver> ReadingSampler<D> {
    pub fn new(driver: D, max_retries: u32) -> Self {
        Self {
            driver,
            max_retries,
            retry_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive reads. Duty-cycle limited sensors such as
    /// the DHT11 want at least a second.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub async fn sample(&mut self) -> Result<TrustedReading, SampleError> {
        for attempt in 1..=self.max_retries {
            let measurement = self.driver.read();
            let timestamp = Local::now().naive_local();

            match measurement {
                Some(measurement) => {
                    if let Some(reading) = TrustedReading::from_measurement(timestamp, &measurement)
                    {
                        tracing::debug!(attempt, "valid measurement");
                        return Ok(reading);
                    }
                    tracing::debug!(attempt, "invalid measurement");
                }
                None => tracing::debug!(attempt, "no measurement"),
            }

            if attempt < self.max_retries && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(SampleError::RetriesExhausted {
            attempts: self.max_retries,
        })
    }
}
