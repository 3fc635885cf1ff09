/// Supabase (PostgREST) client for the `flood_data` table.
///
/// Used when the sensor table is only reachable through the hosted REST API
/// rather than a direct PostgreSQL connection. PostgREST exposes each table
/// at `{project}/rest/v1/{table}` and takes filters as query parameters:
///   select=*                       — all columns
///   order=created_at.desc          — sort
///   limit=1                        — row cap
///   created_at=gte.{timestamp}     — range filter
///
/// See `fixtures.rs` for example response bodies.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

use crate::config::RestConfig;
use crate::model::{FeedError, SensorRecord};

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// URL for the single most recent record.
pub fn build_latest_url(base_url: &str, table: &str) -> String {
    format!(
        "{}?select=*&order=created_at.desc&limit=1",
        table_url(base_url, table)
    )
}

/// URL for every record created at or after `since`, oldest first.
///
/// The timestamp is percent-encoded: a literal `+` in the offset would
/// otherwise be read as a space.
pub fn build_history_url(base_url: &str, table: &str, since: DateTime<Utc>) -> String {
    let since = since.to_rfc3339_opts(SecondsFormat::Millis, false);
    format!(
        "{}?select=*&created_at=gte.{}&order=created_at.asc",
        table_url(base_url, table),
        urlencoding::encode(&since)
    )
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a PostgREST array response into sensor records.
pub fn parse_records(json: &str) -> Result<Vec<SensorRecord>, FeedError> {
    serde_json::from_str(json).map_err(|e| FeedError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct RestFeed {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestFeed {
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    /// Builds a feed from the environment variables named in `config`.
    pub fn from_env(config: &RestConfig) -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let base_url = std::env::var(&config.url_env)
            .map_err(|_| format!("{} environment variable not set", config.url_env))?;
        let api_key = std::env::var(&config.key_env)
            .map_err(|_| format!("{} environment variable not set", config.key_env))?;

        Ok(Self::new(
            &base_url,
            &api_key,
            &config.table,
            Duration::from_secs(config.timeout_secs),
        )?)
    }

    fn get(&self, url: &str) -> Result<Vec<SensorRecord>, FeedError> {
        tracing::debug!(%url, "fetching sensor records");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        parse_records(&body)
    }

    pub fn fetch_latest(&self) -> Result<Option<SensorRecord>, FeedError> {
        let url = build_latest_url(&self.base_url, &self.table);
        Ok(self.get(&url)?.into_iter().next())
    }

    pub fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<SensorRecord>, FeedError> {
        let url = build_history_url(&self.base_url, &self.table, since);
        self.get(&url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::classifier::alert_level_from_risk_class;
    use crate::ingest::fixtures::*;
    use crate::model::AlertLevel;
    use chrono::TimeZone;

    const BASE: &str = "https://example.supabase.co";

    #[test]
    fn test_latest_url_orders_descending_with_limit() {
        let url = build_latest_url(BASE, "flood_data");
        assert_eq!(
            url,
            "https://example.supabase.co/rest/v1/flood_data?select=*&order=created_at.desc&limit=1"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_is_ignored() {
        let url = build_latest_url("https://example.supabase.co/", "flood_data");
        assert!(url.starts_with("https://example.supabase.co/rest/v1/flood_data?"));
    }

    #[test]
    fn test_history_url_filters_and_encodes_timestamp() {
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let url = build_history_url(BASE, "flood_data", since);

        assert!(url.contains("created_at=gte.2024-05-01T12%3A00%3A00.000%2B00%3A00"), "{}", url);
        assert!(url.ends_with("&order=created_at.asc"));
        assert!(!url.contains('+'));
    }

    #[test]
    fn test_parse_single_record() {
        let records = parse_records(fixture_latest_record_json()).expect("fixture should parse");
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.id, "3f1c2a9e-4b7d-4c1e-9a2f-1d5e8b6c7a01");
        assert_eq!(r.nivel_rio, 4.35);
        assert_eq!(r.chuva_24h, 96.4);
        assert_eq!(r.risco_enchente, Some(2));
        assert_eq!(r.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_history_preserves_order() {
        let records = parse_records(fixture_history_json()).expect("fixture should parse");
        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(records[2].risco_enchente, Some(3));
    }

    #[test]
    fn test_parse_null_or_missing_risk_class() {
        let records = parse_records(fixture_unscored_records_json()).expect("unscored rows should parse");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.risco_enchente.is_none()));
        assert!(records.iter().all(|r| alert_level_from_risk_class(r.risco_enchente) == AlertLevel::Baixo));
    }

    #[test]
    fn test_parse_empty_array_is_ok() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_json_returns_parse_error() {
        let result = parse_records("{ not json");
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_parse_error_object_is_parse_error() {
        // PostgREST returns an object, not an array, on errors.
        let result = parse_records(fixture_postgrest_error_json());
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }
}
