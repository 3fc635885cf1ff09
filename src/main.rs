//! Flood Risk Service - Main Daemon
//!
//! A server-side daemon that continuously:
//! 1. Receives readings from the configured feed (simulator, PostgreSQL, Supabase REST)
//! 2. Classifies each reading into a flood alert level
//! 3. Keeps the last day of sensor records in a history window
//! 4. Provides an HTTP endpoint for the dashboard and the sensor uplink
//!
//! Usage:
//!   cargo run --release                                  # Simulated feed, no endpoint
//!   cargo run --release -- --endpoint 8080               # With HTTP endpoint on port 8080
//!   cargo run --release -- --feed database --endpoint 8080
//!   cargo run --release -- classify 12 3.1 85 22         # One-off classification
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string
//!   SUPABASE_URL, SUPABASE_KEY - REST feed credentials

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::process;

use floodrisk_service::alert::advisory::advisory_for;
use floodrisk_service::alert::classifier::classify;
use floodrisk_service::config::{self, FeedKind, ServiceConfig};
use floodrisk_service::daemon::{self, Daemon, DatabaseSource, ProducerSchedule};
use floodrisk_service::db;
use floodrisk_service::endpoint::{self, EndpointContext};
use floodrisk_service::ingest::rest::RestFeed;
use floodrisk_service::logging::{Verbosity, init_logging};
use floodrisk_service::model::Reading;
use floodrisk_service::simulator::Simulator;
use floodrisk_service::zones::{self, Zone};

#[derive(Debug, Parser)]
#[command(name = "floodrisk_service", version, about = "Flood risk monitoring daemon")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured feed
    #[arg(long, value_enum)]
    feed: Option<FeedKind>,

    /// Serve the HTTP endpoint on this port
    #[arg(long, value_name = "PORT")]
    endpoint: Option<u16>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a single reading and print the result as JSON
    #[command(allow_negative_numbers = true)]
    Classify {
        /// Rainfall, mm/h
        precipitation: f64,
        /// River level, m
        river_level: f64,
        /// Relative humidity, %
        humidity: f64,
        /// Air temperature, °C
        temperature: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    if let Some(Command::Classify {
        precipitation,
        river_level,
        humidity,
        temperature,
    }) = cli.command
    {
        run_classify(Reading::new(precipitation, river_level, humidity, temperature));
        return;
    }

    let mut config = match config::load_config_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            process::exit(1);
        }
    };
    if let Some(feed) = cli.feed {
        config.feed.kind = feed;
    }
    if let Some(port) = cli.endpoint {
        config.endpoint.port = Some(port);
    }

    if let Err(e) = run_daemon(config) {
        tracing::error!(error = %e, "daemon stopped with an error");
        process::exit(1);
    }
}

fn run_classify(reading: Reading) {
    let assessment = classify(&reading);
    let output = serde_json::json!({
        "reading": reading,
        "riskScore": assessment.risk_score,
        "alertLevel": assessment.alert_level,
        "label": assessment.alert_level.to_string(),
        "advisory": advisory_for(assessment.alert_level),
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Failed to encode result: {}", e);
            process::exit(1);
        }
    }
}

fn load_zones(path: &str) -> Vec<Zone> {
    match zones::load_zones(path) {
        Ok(config) => {
            tracing::info!(path, count = config.zones.len(), "zones loaded");
            config.zones
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "zones file unavailable, using built-in zones");
            zones::builtin_zones()
        }
    }
}

fn run_daemon(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        feed = ?config.feed.kind,
        window_hours = config.monitor.history_window_hours,
        "starting flood risk service"
    );

    let zones = load_zones(&config.zones_file);
    let window_hours = config.monitor.history_window_hours;
    let daemon = Daemon::new(window_hours);

    match config.feed.kind {
        FeedKind::Simulated => {
            let rng = match config.simulator.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let simulator = Simulator::new(rng, config.simulator.initial_reading());
            let schedule = ProducerSchedule::every_secs(config.simulator.interval_secs);
            daemon.spawn_producer("simulator", move |tx| {
                daemon::run_simulator(simulator, tx, schedule)
            })?;
        }
        FeedKind::Database => {
            let client = db::connect_and_verify(&[db::FLOOD_DATA_TABLE])?;
            let schedule = ProducerSchedule::every_secs(config.feed.poll_interval_secs);
            daemon.spawn_producer("database-feed", move |tx| {
                daemon::poll_feed(DatabaseSource::new(client), tx, window_hours, schedule)
            })?;
        }
        FeedKind::Rest => {
            let feed = RestFeed::from_env(&config.rest)?;
            let schedule = ProducerSchedule::every_secs(config.feed.poll_interval_secs);
            daemon.spawn_producer("rest-feed", move |tx| {
                daemon::poll_feed(feed, tx, window_hours, schedule)
            })?;
        }
    }

    if let Some(port) = config.endpoint.port {
        // /add-reading works only with a database; the rest of the API does not need one.
        let db = match db::connect_and_verify(&[db::FLOOD_DATA_TABLE]) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "no database for the endpoint, /add-reading disabled");
                None
            }
        };

        let ctx = EndpointContext {
            state: daemon.state(),
            events: daemon.sender(),
            zones,
            db,
        };
        let bind_address = config.endpoint.bind_address.clone();

        std::thread::Builder::new()
            .name("endpoint".to_string())
            .spawn(move || {
                if let Err(e) = endpoint::start_endpoint_server(&bind_address, port, ctx) {
                    tracing::error!(error = %e, "endpoint server failed");
                }
            })?;
    }

    daemon.run()
}
