use std::{fmt, path::PathBuf, str::FromStr};

use dht::{Dht, DhtError, Measurement, Model};

/// A single physical read of an environmental sensor.
///
/// `None` means the hardware produced nothing usable this time.
pub trait SensorDriver {
    fn read(&mut self) -> Option<Measurement>;
}

impl<T: SensorDriver + ?Sized> SensorDriver for Box<T> {
    fn read(&mut self) -> Option<Measurement> {
        (**self).read()
    }
}

impl SensorDriver for Dht {
    fn read(&mut self) -> Option<Measurement> {
        Dht::read(self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SensorKind {
    Dht11,
    Dht22,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSensorKind(pub String);

impl FromStr for SensorKind {
    type Err = UnknownSensorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DHT11" => Ok(SensorKind::Dht11),
            "DHT22" => Ok(SensorKind::Dht22),
            _ => Err(UnknownSensorKind(s.to_string())),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Dht11 => f.write_str("DHT11"),
            SensorKind::Dht22 => f.write_str("DHT22"),
        }
    }
}

/// Where a sensor is wired. Fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEndpoint {
    pub kind: SensorKind,
    pub chip: PathBuf,
    pub pin: u32,
}

impl fmt::Display for SensorEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} pin {}", self.kind, self.chip.display(), self.pin)
    }
}

/// Builds the driver for an endpoint's sensor kind.
pub fn open_driver(endpoint: &SensorEndpoint) -> Result<Box<dyn SensorDriver>, DhtError> {
    let model = match endpoint.kind {
        SensorKind::Dht11 => Model::Dht11,
        SensorKind::Dht22 => Model::Dht22,
    };
    Ok(Box::new(Dht::open(model, &endpoint.chip, endpoint.pin)?))
}
