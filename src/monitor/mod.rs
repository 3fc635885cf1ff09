/// Live monitoring state.
///
/// ## Architecture: single writer, explicit state
///
/// All mutable state the service keeps between readings lives in one
/// `MonitorState` value. Producers (simulator, database poller, REST poller,
/// the HTTP ingest route) never touch it; they send `MonitorEvent`s over a
/// channel and the daemon loop applies them in arrival order via
/// `MonitorState::apply`. Readers (the HTTP endpoint) take a snapshot under
/// a lock.
///
/// **Flow:**
/// 1. A producer emits `Reading`, `Record` or `History`
/// 2. The daemon applies it, recomputing the alert
/// 3. `apply` returns an `AlertChange` when the level moved
/// 4. The daemon logs the transition
///
/// A `LoadError` only records a generic message for the presentation layer;
/// the typed cause is logged by the producer that hit it.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::alert::classifier::{alert_level_from_risk_class, classify};
use crate::model::{AlertLevel, Reading, RiskAssessment, SensorRecord};

pub const LOAD_LATEST_ERROR: &str = "Erro ao carregar dados mais recentes";
pub const LOAD_HISTORY_ERROR: &str = "Erro ao carregar dados históricos";

/// Window length for a configured number of hours, saturating on overflow.
pub fn window_duration(hours: i64) -> Duration {
    Duration::try_hours(hours).unwrap_or(Duration::MAX)
}

/// Oldest instant covered by a window ending at `now`. Saturates at the
/// earliest representable time instead of overflowing.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A reading to classify (simulator tick).
    Reading(Reading),
    /// A new sensor record from the feed or the ingest route.
    Record(SensorRecord),
    /// A full reload of the history window.
    History(Vec<SensorRecord>),
    /// Manual override from an operator.
    SetAlert(AlertLevel),
    /// A producer failed to load data.
    LoadError(String),
}

/// What set the current alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    /// Nothing has been received yet.
    Initial,
    /// Scored from a reading.
    Computed,
    /// Stored risk class of a sensor record.
    Feed,
    /// Operator override.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertChange {
    pub from: AlertLevel,
    pub to: AlertLevel,
    pub source: AlertSource,
}

impl AlertChange {
    pub fn is_escalation(&self) -> bool {
        self.to > self.from
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MonitorState {
    window: Duration,
    alert: AlertLevel,
    alert_source: AlertSource,
    alert_since: Option<DateTime<Utc>>,
    latest_reading: Option<Reading>,
    latest_assessment: Option<RiskAssessment>,
    latest_record: Option<SensorRecord>,
    history: VecDeque<SensorRecord>,
    error: Option<String>,
    events_applied: u64,
}

/// Read-only copy of the state for the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub alert: AlertLevel,
    pub alert_source: AlertSource,
    pub alert_since: Option<DateTime<Utc>>,
    pub latest_reading: Option<Reading>,
    pub latest_assessment: Option<RiskAssessment>,
    pub latest_record: Option<SensorRecord>,
    pub history_len: usize,
    pub error: Option<String>,
    pub events_applied: u64,
}

impl MonitorState {
    pub fn new(window_hours: i64) -> Self {
        Self {
            window: window_duration(window_hours),
            alert: AlertLevel::Baixo,
            alert_source: AlertSource::Initial,
            alert_since: None,
            latest_reading: None,
            latest_assessment: None,
            latest_record: None,
            history: VecDeque::new(),
            error: None,
            events_applied: 0,
        }
    }

    pub fn alert(&self) -> AlertLevel {
        self.alert
    }

    pub fn alert_source(&self) -> AlertSource {
        self.alert_source
    }

    pub fn latest_reading(&self) -> Option<Reading> {
        self.latest_reading
    }

    pub fn latest_record(&self) -> Option<&SensorRecord> {
        self.latest_record.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// History window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SensorRecord> {
        self.history.iter()
    }

    /// Current river level: the latest reading if there is one, otherwise
    /// the latest sensor record.
    pub fn river_level(&self) -> Option<f64> {
        self.latest_reading
            .map(|r| r.river_level)
            .or_else(|| self.latest_record.as_ref().map(|r| r.nivel_rio))
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            alert: self.alert,
            alert_source: self.alert_source,
            alert_since: self.alert_since,
            latest_reading: self.latest_reading,
            latest_assessment: self.latest_assessment,
            latest_record: self.latest_record.clone(),
            history_len: self.history.len(),
            error: self.error.clone(),
            events_applied: self.events_applied,
        }
    }

    /// Applies one event. Returns the transition if the alert level changed.
    pub fn apply(&mut self, event: MonitorEvent, now: DateTime<Utc>) -> Option<AlertChange> {
        self.events_applied += 1;

        match event {
            MonitorEvent::Reading(reading) => {
                let assessment = classify(&reading);
                self.latest_reading = Some(reading);
                self.latest_assessment = Some(assessment);
                self.error = None;
                self.set_alert(assessment.alert_level, AlertSource::Computed, now)
            }
            MonitorEvent::Record(record) => {
                let level = alert_level_from_risk_class(record.risco_enchente);
                let is_latest = self
                    .latest_record
                    .as_ref()
                    .is_none_or(|latest| record.created_at >= latest.created_at);

                self.push_record(record.clone());
                self.prune(now);
                self.error = None;

                // A late record joins the window but does not roll the alert back.
                if !is_latest {
                    return None;
                }
                self.latest_record = Some(record);
                self.set_alert(level, AlertSource::Feed, now)
            }
            MonitorEvent::History(mut records) => {
                records.sort_by_key(|r| r.created_at);
                self.history = records.into();
                self.prune(now);
                self.error = None;
                None
            }
            MonitorEvent::SetAlert(level) => self.set_alert(level, AlertSource::Manual, now),
            MonitorEvent::LoadError(message) => {
                self.error = Some(message);
                None
            }
        }
    }

    fn set_alert(&mut self, level: AlertLevel, source: AlertSource, now: DateTime<Utc>) -> Option<AlertChange> {
        let previous = self.alert;
        self.alert_source = source;

        if previous == level && self.alert_since.is_some() {
            return None;
        }

        self.alert = level;
        self.alert_since = Some(now);

        if previous == level {
            None
        } else {
            Some(AlertChange {
                from: previous,
                to: level,
                source,
            })
        }
    }

    /// Inserts keeping `created_at` order; a record with an id already in
    /// the window replaces it.
    fn push_record(&mut self, record: SensorRecord) {
        if let Some(pos) = self.history.iter().position(|r| r.id == record.id) {
            self.history.remove(pos);
        }
        let pos = self
            .history
            .iter()
            .rposition(|r| r.created_at <= record.created_at)
            .map(|p| p + 1)
            .unwrap_or(0);
        self.history.insert(pos, record);
    }

    /// Drops records not strictly newer than `now - window`.
    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = window_start(now, self.window);
        while self.history.front().is_some_and(|r| r.created_at <= cutoff) {
            self.history.pop_front();
        }
    }
}
