/// floodrisk_service: Blumenau (Itajaí-Açu) flood risk monitoring service.
///
/// # Module structure
///
/// ```text
/// floodrisk_service
/// ├── model       — shared data types (Reading, SensorRecord, AlertLevel, FeedError, …)
/// ├── config      — service configuration loader (floodrisk.toml)
/// ├── zones       — neighbourhood registry and per-zone status rules (zones.toml)
/// ├── simulator   — random-walk telemetry and simulated 24 h history
/// ├── db          — PostgreSQL access to the flood_data table
/// ├── daemon      — producers, event channel and the single-writer loop
/// ├── endpoint    — HTTP API for the dashboard and the sensor uplink
/// ├── logging     — tracing subscriber setup
/// ├── ingest
/// │   ├── rest    — Supabase REST feed: URL construction + JSON parsing
/// │   └── fixtures (test only) — representative API response payloads
/// ├── monitor     — current alert, latest reading and history window
/// ├── alert
/// │   ├── classifier — weighted risk score and alert level thresholds
/// │   └── advisory   — per-level guidance shown to residents
/// └── analysis
///     └── summary    — statistics over the history window
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod daemon;
pub mod db;
pub mod endpoint;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod simulator;
pub mod zones;
