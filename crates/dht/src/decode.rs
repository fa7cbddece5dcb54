use crate::{Measurement, Model};

/// Data bits in one transmission: four payload bytes and a checksum.
pub const DATA_BITS: usize = 40;

// a "0" bit holds the line high for 26-28us, a "1" bit for ~70us
const ONE_BIT_US: u32 = 50;

/// The five bytes of one sensor transmission.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame([u8; 5]);

impl Frame {
    pub fn new(bytes: [u8; 5]) -> Self {
        Self(bytes)
    }

    /// Builds a frame from captured high-pulse widths in microseconds.
    ///
    /// Only the trailing [`DATA_BITS`] pulses carry data; anything before them
    /// is the sensor's response preamble. Returns `None` when too few pulses
    /// were captured.
    pub fn from_pulses(pulses: &[u32]) -> Option<Self> {
        let data = pulses.get(pulses.len().checked_sub(DATA_BITS)?..)?;

        let mut bytes = [0u8; 5];
        for (bit, &width) in data.iter().enumerate() {
            if width > ONE_BIT_US {
                bytes[bit / 8] |= 0x80 >> (bit % 8);
            }
        }

        Some(Self(bytes))
    }

    pub fn bytes(&self) -> [u8; 5] {
        self.0
    }

    pub fn checksum_ok(&self) -> bool {
        let sum = self.0[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        sum == self.0[4]
    }

    /// Interprets the payload for the given model. Fractional parts are
    /// truncated toward zero.
    pub fn decode(&self, model: Model) -> Measurement {
        let [b0, b1, b2, b3, _] = self.0;

        let (temperature, humidity) = match model {
            Model::Dht11 => (i16::from(b2), u16::from(b0)),
            Model::Dht22 => {
                let magnitude = (i16::from(b2 & 0x7f) << 8 | i16::from(b3)) / 10;
                let temperature = if b2 & 0x80 != 0 {
                    -magnitude
                } else {
                    magnitude
                };
                (temperature, (u16::from(b0) << 8 | u16::from(b1)) / 10)
            }
        };

        let valid = self.checksum_ok() && humidity <= 100;
        let humidity = u8::try_from(humidity).unwrap_or(u8::MAX);

        if valid {
            Measurement::new(temperature, humidity)
        } else {
            Measurement::invalid(temperature, humidity)
        }
    }
}
