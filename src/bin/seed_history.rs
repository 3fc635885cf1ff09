//! Seeds `flood_data` with a simulated day of hourly sensor records.
//!
//! Useful for a fresh database: the dashboard's history charts and the
//! `/history` summary need something to show before the sensor uplink has
//! been running for a day.
//!
//! Usage:
//!   cargo run --bin seed_history              # random series
//!   cargo run --bin seed_history -- --seed 42 # reproducible series
//!   cargo run --bin seed_history -- --dry-run # print records, write nothing
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use floodrisk_service::alert::classifier::{classify, risk_class_for_level};
use floodrisk_service::db;
use floodrisk_service::logging::{Verbosity, init_logging};
use floodrisk_service::model::NewSensorRecord;
use floodrisk_service::simulator::{HistoryPoint, simulated_history};

/// River moves less than this between hours → stable.
const TREND_DEADBAND_M: f64 = 0.05;

#[derive(Debug, Parser)]
#[command(name = "seed_history", about = "Insert a simulated 24 h series into flood_data")]
struct Args {
    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the records as JSON instead of inserting them
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Turns hourly points into sensor records. Rain totals are trailing sums
/// over the series, so the first hours see less than a full window.
fn records_from_history<R: Rng>(points: &[HistoryPoint], rng: &mut R) -> Vec<NewSensorRecord> {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let reading = point.reading;
            let trailing = |hours: usize| -> f64 {
                points[i.saturating_sub(hours - 1)..=i]
                    .iter()
                    .map(|p| p.reading.precipitation)
                    .sum()
            };
            let tendencia_rio = match i.checked_sub(1).map(|j| reading.river_level - points[j].reading.river_level) {
                Some(delta) if delta > TREND_DEADBAND_M => 1.0,
                Some(delta) if delta < -TREND_DEADBAND_M => -1.0,
                _ => 0.0,
            };

            NewSensorRecord {
                chuva_1h: reading.precipitation,
                chuva_6h: trailing(6),
                chuva_24h: trailing(24),
                nivel_rio: reading.river_level,
                tendencia_rio,
                umidade: reading.humidity,
                vento: rng.random::<f64>() * 25.0,
                risco_enchente: risk_class_for_level(classify(&reading).alert_level),
            }
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(Verbosity::from_flags(false, args.verbose));

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let points = simulated_history(&mut rng, Utc::now());
    let records = records_from_history(&points, &mut rng);

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut client = db::connect_and_verify(&[db::FLOOD_DATA_TABLE])?;

    let mut inserted = 0;
    for (point, record) in points.iter().zip(records.iter()) {
        let stored = db::insert_record_at(&mut client, record, point.timestamp)?;
        tracing::debug!(id = %stored.id, hour = %point.hour, risco = ?stored.risco_enchente, "record inserted");
        inserted += 1;
    }

    tracing::info!(inserted, "simulated history seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_records_follow_history() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        let points = simulated_history(&mut rng, now);
        let records = records_from_history(&points, &mut rng);

        assert_eq!(records.len(), 24);
        for (point, record) in points.iter().zip(records.iter()) {
            assert_eq!(record.nivel_rio, point.reading.river_level);
            assert!(record.chuva_6h >= record.chuva_1h);
            assert!(record.chuva_24h >= record.chuva_6h);
            assert!((0..=3).contains(&record.risco_enchente));
            assert!((-1.0..=1.0).contains(&record.tendencia_rio));
        }
        assert_eq!(records[0].tendencia_rio, 0.0);

        let total: f64 = points.iter().map(|p| p.reading.precipitation).sum();
        assert!((records[23].chuva_24h - total).abs() < 1e-9);
    }
}
