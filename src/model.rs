/// Core data types for the Blumenau flood risk service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types and the small conversions between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One sample of the four quantities the risk classifier looks at.
///
/// Readings are ephemeral: they are produced by the simulator or derived
/// from a sensor record, classified, and replaced by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Rainfall in mm.
    pub precipitation: f64,
    /// River level in meters.
    pub river_level: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Air temperature in °C.
    pub temperature: f64,
}

impl Reading {
    pub fn new(precipitation: f64, river_level: f64, humidity: f64, temperature: f64) -> Self {
        Self {
            precipitation,
            river_level,
            humidity,
            temperature,
        }
    }
}

/// A row of the `flood_data` table, as written by the ESP32 sensor pipeline.
///
/// Field names follow the table columns so the same struct deserializes
/// both PostgREST responses and our own JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: String,
    pub chuva_1h: f64,
    pub chuva_6h: f64,
    pub chuva_24h: f64,
    pub nivel_rio: f64,
    /// 1 rising, -1 falling, 0 stable.
    pub tendencia_rio: f64,
    pub umidade: f64,
    pub vento: f64,
    /// Stored risk class, 0..=3. Null or absent means unscored.
    #[serde(default)]
    pub risco_enchente: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SensorRecord {
    /// River trend as a discrete direction.
    pub fn trend(&self) -> RiverTrend {
        RiverTrend::from_value(self.tendencia_rio)
    }
}

/// Ingest payload for a new sensor record. Every field is optional on the
/// wire; missing values are stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSensorRecord {
    #[serde(default)]
    pub chuva_1h: f64,
    #[serde(default)]
    pub chuva_6h: f64,
    #[serde(default)]
    pub chuva_24h: f64,
    #[serde(default)]
    pub nivel_rio: f64,
    #[serde(default)]
    pub tendencia_rio: f64,
    #[serde(default)]
    pub umidade: f64,
    #[serde(default)]
    pub vento: f64,
    #[serde(default)]
    pub risco_enchente: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiverTrend {
    Rising,
    Stable,
    Falling,
}

impl RiverTrend {
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            RiverTrend::Rising
        } else if value < 0.0 {
            RiverTrend::Falling
        } else {
            RiverTrend::Stable
        }
    }
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// Flood alert levels, in ascending order of severity.
///
/// The derived `Ord` follows declaration order, so `Baixo < Critico`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Baixo,
    Medio,
    Alto,
    Critico,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Baixo,
        AlertLevel::Medio,
        AlertLevel::Alto,
        AlertLevel::Critico,
    ];

    /// Wire token, e.g. `"medio"`.
    pub fn token(&self) -> &'static str {
        match self {
            AlertLevel::Baixo => "baixo",
            AlertLevel::Medio => "medio",
            AlertLevel::Alto => "alto",
            AlertLevel::Critico => "critico",
        }
    }

    /// Parses a wire token. Accepts the accented spellings too.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "baixo" => Some(AlertLevel::Baixo),
            "medio" | "médio" => Some(AlertLevel::Medio),
            "alto" => Some(AlertLevel::Alto),
            "critico" | "crítico" => Some(AlertLevel::Critico),
            _ => None,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Baixo => write!(f, "BAIXO"),
            AlertLevel::Medio => write!(f, "MÉDIO"),
            AlertLevel::Alto => write!(f, "ALTO"),
            AlertLevel::Critico => write!(f, "CRÍTICO"),
        }
    }
}

/// Output of the risk classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// 0–100.
    pub risk_score: f64,
    pub alert_level: AlertLevel,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or decoding sensor feed data.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Non-2xx HTTP response from the feed.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The request never produced a response (DNS, TLS, timeout...).
    #[error("Request failed: {0}")]
    Transport(String),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),
    /// A database query failed.
    #[error("Database error: {0}")]
    Database(#[from] postgres::Error),
}
