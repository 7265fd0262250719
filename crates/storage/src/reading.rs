//! Sensor Reading Model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One temperature/humidity sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub humidity: f64,
    pub temperature: f64,
}

/// Generate a synthetic hourly series ending at `now`, oldest first.
///
/// Noise is derived from a hash of the sample time so the series is
/// reproducible for a given `now`.
pub fn simulated_readings(now: DateTime<Utc>, count: usize) -> Vec<Reading> {
    let mut readings: Vec<Reading> = (0..count)
        .map(|i| {
            let timestamp = now - Duration::hours(i as i64);
            let step = i as f64;
            let seed = timestamp.timestamp_millis();
            Reading {
                timestamp,
                temperature: 20.0 + noise(seed, 0) * 5.0 + (step / 5.0).sin() * 2.0,
                humidity: 50.0 + noise(seed, 1) * 10.0 - (step / 10.0).cos() * 5.0,
            }
        })
        .collect();
    readings.reverse();
    readings
}

/// Pseudo-random value in [0, 1)
fn noise(seed: i64, channel: u8) -> f64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    channel.hash(&mut hasher);
    (hasher.finish() % 10_000) as f64 / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_simulated_series_shape() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let readings = simulated_readings(now, 50);

        assert_eq!(readings.len(), 50);
        assert_eq!(readings.last().unwrap().timestamp, now);
        assert_eq!(readings[0].timestamp, now - Duration::hours(49));
        assert!(readings.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_simulated_values_in_band() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for reading in simulated_readings(now, 50) {
            assert!(reading.temperature >= 18.0 && reading.temperature <= 27.0);
            assert!(reading.humidity >= 45.0 && reading.humidity <= 65.0);
        }
    }

    #[test]
    fn test_simulated_is_reproducible() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(simulated_readings(now, 10), simulated_readings(now, 10));
    }

    #[test]
    fn test_reading_serialization() {
        let reading = Reading {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            humidity: 55.5,
            temperature: 21.25,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(json["humidity"], 55.5);
        assert_eq!(json["temperature"], 21.25);
    }
}
