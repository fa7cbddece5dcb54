use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use gpio_cdev::{Chip, Line, LineRequestFlags};
use thiserror::Error;

use crate::{Frame, Measurement, Model, DATA_BITS};

const CONSUMER: &str = "station-dht";

// a full transmission takes under 5ms
const CAPTURE_TIMEOUT: Duration = Duration::from_millis(10);

// host release + sensor response + data bits
const MAX_PULSES: usize = DATA_BITS + 2;

#[derive(Debug, Error)]
pub enum DhtError {
    #[error("gpio: {0}")]
    Gpio(#[from] gpio_cdev::Error),
}

/// A DHT sensor wired to one line of a GPIO character device.
#[derive(Debug)]
pub struct Dht {
    model: Model,
    line: Line,
}

impl Dht {
    /// Opens `offset` on the given chip (e.g. `/dev/gpiochip0`). On a
    /// Raspberry Pi the offset is the BCM pin number.
    pub fn open(model: Model, chip: impl AsRef<Path>, offset: u32) -> Result<Self, DhtError> {
        let mut chip = Chip::new(chip)?;
        let line = chip.get_line(offset)?;
        Ok(Self { model, line })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Performs one physical read.
    ///
    /// Returns `None` when the sensor did not answer with a complete frame.
    /// A frame that fails its checksum comes back as an invalid
    /// [`Measurement`].
    pub fn read(&mut self) -> Option<Measurement> {
        let pulses = match self.capture() {
            Ok(pulses) => pulses,
            Err(e) => {
                tracing::debug!(error = %e, "dht capture failed");
                return None;
            }
        };

        match Frame::from_pulses(&pulses) {
            Some(frame) => Some(frame.decode(self.model)),
            None => {
                tracing::debug!(pulses = pulses.len(), "incomplete dht frame");
                None
            }
        }
    }

    /// Sends the start signal and records the width of every high pulse
    /// until the frame is complete or the capture times out.
    fn capture(&mut self) -> Result<Vec<u32>, DhtError> {
        {
            let output = self.line.request(LineRequestFlags::OUTPUT, 1, CONSUMER)?;
            output.set_value(0)?;
            thread::sleep(self.model.start_signal());
            output.set_value(1)?;
        }

        let input = self.line.request(LineRequestFlags::INPUT, 0, CONSUMER)?;

        let mut pulses = Vec::with_capacity(MAX_PULSES);
        let mut level = input.get_value()?;
        let mut edge = Instant::now();
        let deadline = edge + CAPTURE_TIMEOUT;

        while pulses.len() < MAX_PULSES {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let current = input.get_value()?;
            if current == level {
                continue;
            }

            if level == 1 {
                let width = now.duration_since(edge).as_micros();
                pulses.push(u32::try_from(width).unwrap_or(u32::MAX));
            }
            level = current;
            edge = now;
        }

        Ok(pulses)
    }
}
