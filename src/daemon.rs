/// Core daemon implementation for the flood risk service
///
/// This module implements the main loop that:
/// 1. Starts a producer for the configured feed (simulator, database, REST)
/// 2. Receives `MonitorEvent`s from producers and the HTTP ingest route
/// 3. Applies them to the single `MonitorState`
/// 4. Logs alert level transitions
///
/// Producers own their I/O and run on their own threads; only this loop
/// writes to the state.

use chrono::{DateTime, Utc};
use postgres::Client;
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::db;
use crate::ingest::rest::RestFeed;
use crate::model::{FeedError, SensorRecord};
use crate::monitor::{
    AlertChange, LOAD_HISTORY_ERROR, LOAD_LATEST_ERROR, MonitorEvent, MonitorState, window_duration,
    window_start,
};
use crate::simulator::Simulator;

/// State handle shared with the HTTP endpoint.
pub type SharedState = Arc<Mutex<MonitorState>>;

/// Locks the state, recovering it if a reader panicked while holding it.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Something that can be polled for sensor records.
pub trait RecordSource {
    /// Short name for logs.
    fn name(&self) -> &'static str;
    fn fetch_latest(&mut self) -> Result<Option<SensorRecord>, FeedError>;
    fn fetch_since(&mut self, since: DateTime<Utc>) -> Result<Vec<SensorRecord>, FeedError>;
}

/// Direct PostgreSQL access to `flood_data`.
pub struct DatabaseSource {
    client: Client,
}

impl DatabaseSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RecordSource for DatabaseSource {
    fn name(&self) -> &'static str {
        "database"
    }

    fn fetch_latest(&mut self) -> Result<Option<SensorRecord>, FeedError> {
        db::fetch_latest(&mut self.client)
    }

    fn fetch_since(&mut self, since: DateTime<Utc>) -> Result<Vec<SensorRecord>, FeedError> {
        db::fetch_since(&mut self.client, since)
    }
}

impl RecordSource for RestFeed {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn fetch_latest(&mut self) -> Result<Option<SensorRecord>, FeedError> {
        RestFeed::fetch_latest(self)
    }

    fn fetch_since(&mut self, since: DateTime<Utc>) -> Result<Vec<SensorRecord>, FeedError> {
        RestFeed::fetch_since(self, since)
    }
}

// ---------------------------------------------------------------------------
// Producers
// ---------------------------------------------------------------------------

/// Producer pacing. `max_ticks` bounds the loop (tests); `None` runs until
/// the receiver goes away.
#[derive(Debug, Clone, Copy)]
pub struct ProducerSchedule {
    pub interval: std::time::Duration,
    pub max_ticks: Option<u64>,
}

impl ProducerSchedule {
    pub fn every_secs(secs: u64) -> Self {
        Self {
            interval: std::time::Duration::from_secs(secs),
            max_ticks: None,
        }
    }

    fn exhausted(&self, ticks: u64) -> bool {
        self.max_ticks.is_some_and(|max| ticks >= max)
    }
}

/// Emits one simulated reading per tick.
pub fn run_simulator<R: Rng>(mut simulator: Simulator<R>, sender: Sender<MonitorEvent>, schedule: ProducerSchedule) {
    let mut ticks = 0;
    // The first event carries the starting point so the state is never empty.
    let mut reading = simulator.current();

    loop {
        if sender.send(MonitorEvent::Reading(reading)).is_err() {
            tracing::debug!("simulator receiver closed");
            return;
        }
        ticks += 1;
        if schedule.exhausted(ticks) {
            return;
        }
        thread::sleep(schedule.interval);
        reading = simulator.next_reading();
    }
}

/// Position of a feed poller in the table: the newest `created_at`
/// forwarded so far and the ids already forwarded at that instant.
///
/// Polls ask for everything at or after `since`, so rows sharing the
/// newest timestamp come back on the next poll and are filtered by id.
#[derive(Debug, Clone)]
struct FeedCursor {
    since: DateTime<Utc>,
    ids_at_since: HashSet<String>,
}

impl FeedCursor {
    fn new(since: DateTime<Utc>) -> Self {
        Self {
            since,
            ids_at_since: HashSet::new(),
        }
    }

    fn is_unseen(&self, record: &SensorRecord) -> bool {
        record.created_at > self.since
            || (record.created_at == self.since && !self.ids_at_since.contains(&record.id))
    }

    fn advance(&mut self, record: &SensorRecord) {
        if record.created_at > self.since {
            self.since = record.created_at;
            self.ids_at_since.clear();
        }
        if record.created_at == self.since {
            self.ids_at_since.insert(record.id.clone());
        }
    }
}

/// History window plus the newest record, which may be older than the window.
fn startup_events<S: RecordSource>(source: &mut S, cursor: &mut FeedCursor) -> Vec<MonitorEvent> {
    let feed = source.name();
    let mut events = Vec::with_capacity(2);

    match source.fetch_since(cursor.since) {
        Ok(records) => {
            tracing::info!(feed, count = records.len(), "loaded history window");
            records.iter().for_each(|r| cursor.advance(r));
            events.push(MonitorEvent::History(records));
        }
        Err(e) => {
            tracing::error!(feed, error = %e, "history load failed");
            events.push(MonitorEvent::LoadError(LOAD_HISTORY_ERROR.to_string()));
        }
    }

    match source.fetch_latest() {
        Ok(Some(record)) => {
            tracing::debug!(feed, id = %record.id, risco = ?record.risco_enchente, "latest sensor record");
            cursor.advance(&record);
            events.push(MonitorEvent::Record(record));
        }
        Ok(None) => tracing::debug!(feed, "no sensor records yet"),
        Err(e) => {
            tracing::warn!(feed, error = %e, "latest record fetch failed");
            events.push(MonitorEvent::LoadError(LOAD_LATEST_ERROR.to_string()));
        }
    }

    events
}

/// Every record created since the cursor that has not been forwarded yet,
/// oldest first.
fn poll_events<S: RecordSource>(source: &mut S, cursor: &mut FeedCursor) -> Vec<MonitorEvent> {
    let feed = source.name();

    match source.fetch_since(cursor.since) {
        Ok(records) => {
            let mut unseen: Vec<SensorRecord> =
                records.into_iter().filter(|r| cursor.is_unseen(r)).collect();
            unseen.sort_by_key(|r| r.created_at);
            unseen.iter().for_each(|r| cursor.advance(r));

            if !unseen.is_empty() {
                tracing::debug!(feed, count = unseen.len(), "new sensor records");
            }
            unseen.into_iter().map(MonitorEvent::Record).collect()
        }
        Err(e) => {
            tracing::warn!(feed, error = %e, "sensor record poll failed");
            vec![MonitorEvent::LoadError(LOAD_LATEST_ERROR.to_string())]
        }
    }
}

/// Loads the history window and the latest record, then polls for records
/// created since the newest one forwarded.
///
/// Every unseen row is emitted, so several inserts between two polls all
/// reach the history window. Fetch failures become a generic `LoadError`;
/// the cause is logged here.
pub fn poll_feed<S: RecordSource>(
    mut source: S,
    sender: Sender<MonitorEvent>,
    window_hours: i64,
    schedule: ProducerSchedule,
) {
    let feed = source.name();
    let mut cursor = FeedCursor::new(window_start(Utc::now(), window_duration(window_hours)));
    let mut events = startup_events(&mut source, &mut cursor);
    let mut ticks = 0;

    loop {
        for event in events {
            if sender.send(event).is_err() {
                tracing::debug!(feed, "feed receiver closed");
                return;
            }
        }

        ticks += 1;
        if schedule.exhausted(ticks) {
            return;
        }
        thread::sleep(schedule.interval);
        events = poll_events(&mut source, &mut cursor);
    }
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Main daemon state
pub struct Daemon {
    state: SharedState,
    sender: Sender<MonitorEvent>,
    receiver: Receiver<MonitorEvent>,
}

impl Daemon {
    pub fn new(history_window_hours: i64) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(MonitorState::new(history_window_hours))),
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// A new handle for a producer.
    pub fn sender(&self) -> Sender<MonitorEvent> {
        self.sender.clone()
    }

    /// Spawns a named producer thread with its own sender.
    pub fn spawn_producer<F>(&self, name: &str, producer: F) -> Result<JoinHandle<()>, Box<dyn Error>>
    where
        F: FnOnce(Sender<MonitorEvent>) + Send + 'static,
    {
        let sender = self.sender();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || producer(sender))?;
        Ok(handle)
    }

    /// Applies one event and logs the transition, if any.
    pub fn handle_event(&self, event: MonitorEvent) -> Option<AlertChange> {
        apply_and_log(&self.state, event)
    }

    /// Applies every event already queued without blocking.
    pub fn drain_pending(&self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Main daemon loop. Returns once every producer has hung up.
    pub fn run(self) -> Result<(), Box<dyn Error>> {
        let Daemon {
            state,
            sender,
            receiver,
        } = self;
        // Only producers keep the channel open from here on.
        drop(sender);

        for event in receiver {
            apply_and_log(&state, event);
        }

        tracing::info!("all producers stopped, daemon exiting");
        Ok(())
    }
}

fn apply_and_log(state: &SharedState, event: MonitorEvent) -> Option<AlertChange> {
    let change = lock_state(state).apply(event, Utc::now());

    if let Some(change) = change {
        if change.is_escalation() {
            tracing::warn!(from = %change.from, to = %change.to, source = ?change.source, "alert level raised");
        } else {
            tracing::info!(from = %change.from, to = %change.to, source = ?change.source, "alert level lowered");
        }
    }
    change
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
