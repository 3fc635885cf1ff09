/// Neighbourhood registry from zones.toml
///
/// Each zone is a Blumenau neighbourhood shown on the risk map. A zone does
/// not have its own sensor: its status is derived from the city-wide alert
/// through a per-zone rule, and its river level is the city gauge plus a
/// fixed offset for the local terrain.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::model::AlertLevel;

// ============================================================================
// TOML Configuration Structures
// ============================================================================

/// Root zones configuration
#[derive(Debug, Deserialize)]
pub struct ZonesConfig {
    #[serde(rename = "zone")]
    pub zones: Vec<Zone>,
}

/// Single neighbourhood
#[derive(Debug, Deserialize, Clone)]
pub struct Zone {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Added to the city river level to get the local level, in meters.
    #[serde(default)]
    pub level_offset_m: f64,
    pub rule: StatusRule,
}

/// How a zone's status follows the city-wide alert.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusRule {
    /// Same as the city alert.
    Follow,
    /// City alert, but never above `level`.
    Cap { level: AlertLevel },
    /// Critico when the city is critico, `baseline` otherwise.
    CriticalOr { baseline: AlertLevel },
    /// Always `level`.
    Fixed { level: AlertLevel },
}

impl StatusRule {
    pub fn apply(&self, alert: AlertLevel) -> AlertLevel {
        match *self {
            StatusRule::Follow => alert,
            StatusRule::Cap { level } => alert.min(level),
            StatusRule::CriticalOr { baseline } => {
                if alert == AlertLevel::Critico {
                    AlertLevel::Critico
                } else {
                    baseline
                }
            }
            StatusRule::Fixed { level } => level,
        }
    }
}

impl Zone {
    pub fn status_for(&self, alert: AlertLevel) -> AlertLevel {
        self.rule.apply(alert)
    }

    pub fn level_for(&self, river_level_m: f64) -> f64 {
        river_level_m + self.level_offset_m
    }
}

/// Derived state of a zone for the current alert and river level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub status: AlertLevel,
    /// `None` until the first reading arrives.
    pub river_level_m: Option<f64>,
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load zones configuration from TOML file
pub fn load_zones<P: AsRef<Path>>(path: P) -> Result<ZonesConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: ZonesConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load zones from default location (zones.toml)
pub fn load_zones_default() -> Result<ZonesConfig, Box<dyn std::error::Error>> {
    load_zones("zones.toml")
}

/// Blumenau neighbourhoods used when no zones file is available.
pub fn builtin_zones() -> Vec<Zone> {
    vec![
        Zone {
            id: 1,
            name: "Centro".to_string(),
            lat: -26.9194,
            lon: -49.0661,
            level_offset_m: 0.0,
            rule: StatusRule::Follow,
        },
        Zone {
            id: 2,
            name: "Vila Nova".to_string(),
            lat: -26.9150,
            lon: -49.0500,
            level_offset_m: -0.2,
            rule: StatusRule::Cap { level: AlertLevel::Alto },
        },
        Zone {
            id: 3,
            name: "Ponta Aguda".to_string(),
            lat: -26.9300,
            lon: -49.0800,
            level_offset_m: 0.1,
            rule: StatusRule::CriticalOr { baseline: AlertLevel::Medio },
        },
        Zone {
            id: 4,
            name: "Velha".to_string(),
            lat: -26.9000,
            lon: -49.0400,
            level_offset_m: -0.3,
            rule: StatusRule::Fixed { level: AlertLevel::Baixo },
        },
    ]
}

/// Status of every zone for the given city alert and river level.
pub fn zone_statuses(zones: &[Zone], alert: AlertLevel, river_level_m: Option<f64>) -> Vec<ZoneStatus> {
    zones
        .iter()
        .map(|z| ZoneStatus {
            id: z.id,
            name: z.name.clone(),
            lat: z.lat,
            lon: z.lon,
            status: z.status_for(alert),
            river_level_m: river_level_m.map(|level| z.level_for(level)),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
