//! Flood risk classification.
//!
//! Two paths produce an `AlertLevel`:
//!
//! - `classify` scores a `Reading` with a fixed weighted sum and maps the
//!   score onto the four levels.
//! - `alert_level_from_risk_class` maps the integer `risco_enchente` stored
//!   with a sensor record straight onto a level, with no scoring.
//!
//! Both are pure. Fixtures and downstream consumers rely on the literal
//! thresholds below, so they are constants rather than configuration.

use crate::model::{AlertLevel, Reading, RiskAssessment};

// ---------------------------------------------------------------------------
// Weights and thresholds
// ---------------------------------------------------------------------------

pub const WEIGHT_PRECIPITATION: f64 = 0.40;
pub const WEIGHT_RIVER_LEVEL: f64 = 0.35;
pub const WEIGHT_HUMIDITY: f64 = 0.15;
pub const WEIGHT_TEMPERATURE: f64 = 0.10;

/// Rainfall (mm) at which the precipitation term saturates.
pub const PRECIPITATION_FULL_SCALE_MM: f64 = 20.0;
/// River level (m) below which the river term is zero.
pub const RIVER_LEVEL_BASE_M: f64 = 1.0;
/// Meters above the base at which the river term saturates.
pub const RIVER_LEVEL_SPAN_M: f64 = 3.0;
pub const HUMIDITY_FULL_SCALE_PCT: f64 = 100.0;
pub const TEMPERATURE_FULL_SCALE_C: f64 = 35.0;

/// Inclusive lower bounds, highest first.
pub const CRITICO_MIN_SCORE: f64 = 80.0;
pub const ALTO_MIN_SCORE: f64 = 60.0;
pub const MEDIO_MIN_SCORE: f64 = 35.0;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Each input mapped onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedReading {
    pub precipitation: f64,
    pub river_level: f64,
    pub humidity: f64,
    pub temperature: f64,
}

/// Clamps into [0, 1]; NaN counts as zero.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn normalize(reading: &Reading) -> NormalizedReading {
    NormalizedReading {
        precipitation: unit(reading.precipitation / PRECIPITATION_FULL_SCALE_MM),
        river_level: unit((reading.river_level - RIVER_LEVEL_BASE_M) / RIVER_LEVEL_SPAN_M),
        humidity: unit(reading.humidity / HUMIDITY_FULL_SCALE_PCT),
        temperature: unit(reading.temperature / TEMPERATURE_FULL_SCALE_C),
    }
}

/// Weighted risk score in [0, 100].
///
/// Temperature enters inverted: a colder reading raises the score. This
/// matches the scoring the alert thresholds were tuned against.
pub fn risk_score(reading: &Reading) -> f64 {
    let n = normalize(reading);

    let weighted = n.precipitation * WEIGHT_PRECIPITATION
        + n.river_level * WEIGHT_RIVER_LEVEL
        + n.humidity * WEIGHT_HUMIDITY
        + (1.0 - n.temperature) * WEIGHT_TEMPERATURE;

    (weighted * 100.0).clamp(0.0, 100.0)
}

/// Maps a score onto an alert level. Lower bounds are inclusive.
pub fn alert_level_for_score(score: f64) -> AlertLevel {
    if score >= CRITICO_MIN_SCORE {
        AlertLevel::Critico
    } else if score >= ALTO_MIN_SCORE {
        AlertLevel::Alto
    } else if score >= MEDIO_MIN_SCORE {
        AlertLevel::Medio
    } else {
        AlertLevel::Baixo
    }
}

pub fn classify(reading: &Reading) -> RiskAssessment {
    let score = risk_score(reading);
    RiskAssessment {
        risk_score: score,
        alert_level: alert_level_for_score(score),
    }
}

// ---------------------------------------------------------------------------
// Stored risk class lookup
// ---------------------------------------------------------------------------

/// Maps the `risco_enchente` column of a sensor record onto an alert level:
/// 3 → critico, 2 → alto, 1 → medio, anything else (or missing) → baixo.
pub fn alert_level_from_risk_class(risk_class: Option<i32>) -> AlertLevel {
    match risk_class {
        Some(3) => AlertLevel::Critico,
        Some(2) => AlertLevel::Alto,
        Some(1) => AlertLevel::Medio,
        _ => AlertLevel::Baixo,
    }
}

/// Inverse of `alert_level_from_risk_class`, for writing records.
pub fn risk_class_for_level(level: AlertLevel) -> i32 {
    match level {
        AlertLevel::Critico => 3,
        AlertLevel::Alto => 2,
        AlertLevel::Medio => 1,
        AlertLevel::Baixo => 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
