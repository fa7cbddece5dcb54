/// One raw sample as reported by the sensor.
///
/// `temperature` and `humidity` carry no meaning when `valid` is false.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: i16,
    /// Relative humidity in percent.
    pub humidity: u8,
    pub valid: bool,
}

impl Measurement {
    pub fn new(temperature: i16, humidity: u8) -> Self {
        Self {
            temperature,
            humidity,
            valid: true,
        }
    }

    pub fn invalid(temperature: i16, humidity: u8) -> Self {
        Self {
            temperature,
            humidity,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
