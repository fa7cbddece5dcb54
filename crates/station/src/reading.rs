use std::fmt;

use chrono::NaiveDateTime;
use dht::Measurement;

/// Label stored alongside every row.
pub const STATION_LABEL: &str = "main";

/// A measurement that passed validation, stamped with the time of the read
/// attempt that produced it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrustedReading {
    timestamp: NaiveDateTime,
    temperature: i16,
    humidity: u8,
}

impl TrustedReading {
    /// Returns `None` for an invalid measurement.
    pub fn from_measurement(timestamp: NaiveDateTime, measurement: &Measurement) -> Option<Self> {
        measurement.is_valid().then_some(Self {
            timestamp,
            temperature: measurement.temperature,
            humidity: measurement.humidity,
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn temperature(&self) -> i16 {
        self.temperature
    }

    pub fn humidity(&self) -> u8 {
        self.humidity
    }
}

/// Row shape written to storage: `(date, time, label, temperature, humidity)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceRecord {
    pub date: String,
    pub time: String,
    pub label: &'static str,
    pub temperature: i16,
    pub humidity: u8,
}

impl From<&TrustedReading> for PersistenceRecord {
    fn from(reading: &TrustedReading) -> Self {
        Self {
            date: reading.timestamp.format("%Y-%m-%d").to_string(),
            time: reading.timestamp.format("%H:%M:%S").to_string(),
            label: STATION_LABEL,
            temperature: reading.temperature,
            humidity: reading.humidity,
        }
    }
}

impl fmt::Display for PersistenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}\t{}C\t{}%",
            self.date, self.time, self.temperature, self.humidity
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .unwrap()
    }

    #[test]
    fn formats_record() {
        let reading =
            TrustedReading::from_measurement(at(2024, 3, 5, 8, 7, 9), &Measurement::new(21, 55))
                .unwrap();

        assert_eq!(
            PersistenceRecord::from(&reading),
            PersistenceRecord {
                date: "2024-03-05".into(),
                time: "08:07:09".into(),
                label: "main",
                temperature: 21,
                humidity: 55,
            }
        );
    }

    #[test]
    fn negative_temperature_survives() {
        let reading =
            TrustedReading::from_measurement(at(2024, 12, 31, 23, 59, 59), &Measurement::new(-4, 90))
                .unwrap();
        let record = PersistenceRecord::from(&reading);
        assert_eq!(record.temperature, -4);
        assert_eq!(record.to_string(), "2024-12-31 23:59:59\t-4C\t90%");
    }

    #[test]
    fn invalid_measurement_is_not_trusted() {
        let measurement = Measurement::invalid(21, 55);
        assert_eq!(
            TrustedReading::from_measurement(at(2024, 3, 5, 8, 7, 9), &measurement),
            None
        );
    }
}
