/// Simulated river telemetry.
///
/// Stands in for the sensor network in demos and development: a bounded
/// random walk for rain and river level, fresh draws for temperature and
/// humidity on every tick. The RNG is injected so tests can seed it.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::model::Reading;

/// Largest change in rainfall per tick, mm (±half of this).
const PRECIPITATION_STEP_MM: f64 = 2.0;
/// Largest change in river level per tick, m (±half of this).
const RIVER_STEP_M: f64 = 0.2;
/// The walk never lets the river drop below this.
const RIVER_FLOOR_M: f64 = 1.0;

pub struct Simulator<R: Rng> {
    rng: R,
    current: Reading,
}

impl<R: Rng> Simulator<R> {
    pub fn new(rng: R, initial: Reading) -> Self {
        Self {
            rng,
            current: initial,
        }
    }

    pub fn current(&self) -> Reading {
        self.current
    }

    /// Advances the walk one tick and returns the new reading.
    pub fn next_reading(&mut self) -> Reading {
        let prev = self.current;
        let rng = &mut self.rng;

        let precipitation =
            (prev.precipitation + (rng.random::<f64>() - 0.5) * PRECIPITATION_STEP_MM).max(0.0);
        let river_level =
            (prev.river_level + (rng.random::<f64>() - 0.5) * RIVER_STEP_M).max(RIVER_FLOOR_M);
        let temperature = 20.0 + rng.random::<f64>() * 10.0;
        let humidity = 50.0 + rng.random::<f64>() * 40.0;

        self.current = Reading::new(precipitation, river_level, humidity, temperature);
        self.current
    }
}

/// One hourly sample of a simulated day, for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// "01:00" … "24:00"
    pub hour: String,
    pub timestamp: DateTime<Utc>,
    pub reading: Reading,
}

/// Twenty-four hourly samples ending at `now`, oldest first.
pub fn simulated_history<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> Vec<HistoryPoint> {
    (0..24i64)
        .rev()
        .map(|hours_ago| HistoryPoint {
            hour: format!("{:02}:00", 24 - hours_ago),
            timestamp: now - Duration::hours(hours_ago),
            reading: Reading::new(
                rng.random::<f64>() * 15.0,
                1.5 + rng.random::<f64>() * 2.0,
                40.0 + rng.random::<f64>() * 40.0,
                18.0 + rng.random::<f64>() * 12.0,
            ),
        })
        .collect()
}
