/// Integration tests against a live PostgreSQL database.
///
/// Prerequisites:
/// - PostgreSQL running with the flood_data table (sql/001_flood_data.sql)
/// - DATABASE_URL set in .env
///
/// Run with: cargo test --test daemon_lifecycle -- --ignored --test-threads=1

use chrono::{Duration, Utc};
use postgres::Client;

use floodrisk_service::daemon::{DatabaseSource, RecordSource};
use floodrisk_service::db::{self, DbConfigError};
use floodrisk_service::model::NewSensorRecord;

/// Marks rows written by these tests so they can be removed afterwards.
const TEST_MARKER_VENTO: f64 = -999.0;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn setup_test_db() -> Client {
    db::connect_and_verify(&[db::FLOOD_DATA_TABLE]).expect("database with flood_data should be available")
}

fn cleanup_test_data(client: &mut Client) {
    let _ = client.execute(
        "DELETE FROM public.flood_data WHERE vento = $1",
        &[&rust_decimal::Decimal::from(-999)],
    );
}

fn test_record(nivel_rio: f64, risco: i32) -> NewSensorRecord {
    NewSensorRecord {
        chuva_1h: 5.5,
        chuva_6h: 21.0,
        chuva_24h: 64.25,
        nivel_rio,
        tendencia_rio: 1.0,
        umidade: 91.0,
        vento: TEST_MARKER_VENTO,
        risco_enchente: risco,
    }
}

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_startup_verifies_flood_data_table() {
    let result = db::connect_and_verify(&[db::FLOOD_DATA_TABLE]);
    assert!(result.is_ok(), "flood_data should exist: {:?}", result.err());
}

#[test]
#[ignore]
fn test_missing_table_is_reported_by_name() {
    match db::connect_and_verify(&["nonexistent_table"]) {
        Err(DbConfigError::MissingTable(table)) => assert_eq!(table, "nonexistent_table"),
        other => panic!("expected MissingTable, got {:?}", other.map(|_| ())),
    }
}

// ---------------------------------------------------------------------------
// Reads and writes
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_insert_then_fetch_latest() {
    let mut client = setup_test_db();
    cleanup_test_data(&mut client);

    let stored = db::insert_record(&mut client, &test_record(4.35, 2)).unwrap();
    assert!(!stored.id.is_empty());
    assert_eq!(stored.nivel_rio, 4.35);
    assert_eq!(stored.risco_enchente, Some(2));

    let latest = db::fetch_latest(&mut client).unwrap().expect("a record was just inserted");
    assert_eq!(latest.id, stored.id);

    cleanup_test_data(&mut client);
}

#[test]
#[ignore]
fn test_backfilled_records_come_back_in_order() {
    let mut client = setup_test_db();
    cleanup_test_data(&mut client);

    let now = Utc::now();
    let newer = db::insert_record_at(&mut client, &test_record(3.9, 2), now - Duration::hours(1)).unwrap();
    let older = db::insert_record_at(&mut client, &test_record(2.8, 1), now - Duration::hours(2)).unwrap();

    let mut source = DatabaseSource::new(client);
    let window: Vec<String> = source
        .fetch_since(now - Duration::hours(3))
        .unwrap()
        .into_iter()
        .filter(|r| r.vento == TEST_MARKER_VENTO)
        .map(|r| r.id)
        .collect();
    assert_eq!(window, vec![older.id, newer.id]);

    let mut client = setup_test_db();
    cleanup_test_data(&mut client);
}
