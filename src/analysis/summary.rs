/// History window statistics.
///
/// Condenses the last day of sensor records into the figures the dashboard
/// shows next to its charts: river extremes, rainfall peak, how often each
/// alert level occurred, and how fast the river is moving.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::classifier::alert_level_from_risk_class;
use crate::model::{AlertLevel, RiverTrend, SensorRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub baixo: usize,
    pub medio: usize,
    pub alto: usize,
    pub critico: usize,
}

impl LevelCounts {
    fn add(&mut self, level: AlertLevel) {
        match level {
            AlertLevel::Baixo => self.baixo += 1,
            AlertLevel::Medio => self.medio += 1,
            AlertLevel::Alto => self.alto += 1,
            AlertLevel::Critico => self.critico += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub count: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub river_min_m: Option<f64>,
    pub river_max_m: Option<f64>,
    pub river_latest_m: Option<f64>,
    /// Change in river level per hour between the first and last record.
    pub river_rate_m_per_hour: Option<f64>,
    pub rain_24h_max_mm: Option<f64>,
    pub humidity_mean_pct: Option<f64>,
    pub peak_alert: Option<AlertLevel>,
    pub level_counts: LevelCounts,
    pub trend: Option<RiverTrend>,
}

fn fold_min(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

fn fold_max(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

/// Summarizes records given oldest first.
pub fn summarize<'a, I>(records: I) -> HistorySummary
where
    I: IntoIterator<Item = &'a SensorRecord>,
{
    let mut count = 0usize;
    let mut first: Option<&SensorRecord> = None;
    let mut last: Option<&SensorRecord> = None;
    let mut river_min = None;
    let mut river_max = None;
    let mut rain_max = None;
    let mut humidity_sum = 0.0;
    let mut peak_alert: Option<AlertLevel> = None;
    let mut level_counts = LevelCounts::default();

    for record in records {
        count += 1;
        if first.is_none() {
            first = Some(record);
        }
        last = Some(record);

        river_min = fold_min(river_min, record.nivel_rio);
        river_max = fold_max(river_max, record.nivel_rio);
        rain_max = fold_max(rain_max, record.chuva_24h);
        humidity_sum += record.umidade;

        let level = alert_level_from_risk_class(record.risco_enchente);
        level_counts.add(level);
        peak_alert = Some(peak_alert.map_or(level, |p| p.max(level)));
    }

    let river_rate = match (first, last) {
        (Some(a), Some(b)) => {
            let hours = (b.created_at - a.created_at).num_seconds() as f64 / 3600.0;
            (hours > 0.0).then(|| (b.nivel_rio - a.nivel_rio) / hours)
        }
        _ => None,
    };

    HistorySummary {
        count,
        first: first.map(|r| r.created_at),
        last: last.map(|r| r.created_at),
        river_min_m: river_min,
        river_max_m: river_max,
        river_latest_m: last.map(|r| r.nivel_rio),
        river_rate_m_per_hour: river_rate,
        rain_24h_max_mm: rain_max,
        humidity_mean_pct: (count > 0).then(|| humidity_sum / count as f64),
        peak_alert,
        level_counts,
        trend: last.map(|r| r.trend()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::{fixture_history_json, fixture_unscored_records_json};
    use crate::ingest::rest::parse_records;

    #[test]
    fn test_empty_history() {
        let summary = summarize(&Vec::<SensorRecord>::new());
        assert_eq!(summary.count, 0);
        assert!(summary.river_max_m.is_none());
        assert!(summary.humidity_mean_pct.is_none());
        assert!(summary.peak_alert.is_none());
        assert!(summary.river_rate_m_per_hour.is_none());
        assert_eq!(summary.level_counts, LevelCounts::default());
    }

    #[test]
    fn test_summary_of_escalating_history() {
        let records = parse_records(fixture_history_json()).expect("fixture should parse");
        let summary = summarize(&records);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.river_min_m, Some(2.8));
        assert_eq!(summary.river_max_m, Some(6.2));
        assert_eq!(summary.river_latest_m, Some(6.2));
        assert_eq!(summary.rain_24h_max_mm, Some(118.9));
        assert_eq!(summary.peak_alert, Some(AlertLevel::Critico));
        assert_eq!(summary.trend, Some(RiverTrend::Rising));
        assert_eq!(
            summary.level_counts,
            LevelCounts { baixo: 0, medio: 1, alto: 1, critico: 1 }
        );

        // 2.8 m → 6.2 m over two hours
        let rate = summary.river_rate_m_per_hour.unwrap();
        assert!((rate - 1.7).abs() < 1e-9, "rate {}", rate);

        let mean = summary.humidity_mean_pct.unwrap();
        assert!((mean - 90.0).abs() < 1e-9, "mean {}", mean);
    }

    #[test]
    fn test_single_record_has_no_rate() {
        let records = parse_records(fixture_history_json()).unwrap();
        let summary = summarize(&records[..1]);
        assert_eq!(summary.count, 1);
        assert!(summary.river_rate_m_per_hour.is_none());
        assert_eq!(summary.trend, Some(RiverTrend::Stable));
    }

    #[test]
    fn test_unscored_records_count_as_baixo() {
        let records = parse_records(fixture_unscored_records_json()).unwrap();
        let summary = summarize(&records);
        assert_eq!(summary.peak_alert, Some(AlertLevel::Baixo));
        assert_eq!(
            summary.level_counts,
            LevelCounts { baixo: 2, medio: 0, alto: 0, critico: 0 }
        );
    }
}
