/// HTTP endpoint for the flood risk service
///
/// Provides a small JSON API for the dashboard and for the sensor uplink.
///
/// Endpoints:
/// - GET  /health            - Service health check
/// - GET  /status            - Current alert, latest reading/record, advisory
/// - GET  /zones             - Per-neighbourhood status
/// - GET  /history           - History window and summary statistics
/// - GET  /advisory/{level}  - Guidance for one alert level
/// - POST /classify          - Score a reading without touching the state
/// - POST /alert             - Operator override of the alert level
/// - POST /add-reading       - Store a sensor record and feed it to the monitor

use postgres::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::Read;
use std::sync::mpsc::Sender;

use crate::alert::advisory::advisory_for;
use crate::alert::classifier::classify;
use crate::analysis::summary::summarize;
use crate::daemon::{SharedState, lock_state};
use crate::db;
use crate::model::{AlertLevel, NewSensorRecord, Reading, SensorRecord};
use crate::monitor::MonitorEvent;
use crate::zones::{Zone, zone_statuses};

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /status",
    "GET /zones",
    "GET /history",
    "GET /advisory/{level}",
    "POST /classify",
    "POST /alert",
    "POST /add-reading",
];

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything the handlers need. Owned by the server thread.
pub struct EndpointContext {
    pub state: SharedState,
    pub events: Sender<MonitorEvent>,
    pub zones: Vec<Zone>,
    /// Needed only by /add-reading.
    pub db: Option<Client>,
}

#[derive(Debug, Deserialize)]
struct AlertOverride {
    level: String,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes one request. Returns the status code and JSON body.
pub fn route(ctx: &mut EndpointContext, method: &str, url: &str, body: &str) -> (u16, Value) {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        ("GET", "/health") => handle_health(),
        ("GET", "/status") => handle_status(ctx),
        ("GET", "/zones") => handle_zones(ctx),
        ("GET", "/history") => handle_history(ctx),
        ("GET", p) if p.starts_with("/advisory/") => {
            handle_advisory(p.trim_start_matches("/advisory/"))
        }
        ("POST", "/classify") => handle_classify(body),
        ("POST", "/alert") => handle_alert_override(ctx, body),
        ("POST", "/add-reading") => handle_add_reading(ctx, body),
        _ => (
            404,
            json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        ),
    }
}

fn handle_health() -> (u16, Value) {
    (
        200,
        json!({
            "status": "ok",
            "service": "floodrisk_service",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn handle_status(ctx: &EndpointContext) -> (u16, Value) {
    let snapshot = lock_state(&ctx.state).snapshot();
    let advisory = advisory_for(snapshot.alert);

    (
        200,
        json!({
            "alert": snapshot.alert,
            "alert_label": snapshot.alert.to_string(),
            "alert_source": snapshot.alert_source,
            "alert_since": snapshot.alert_since,
            "assessment": snapshot.latest_assessment,
            "reading": snapshot.latest_reading,
            "record": snapshot.latest_record,
            "history_len": snapshot.history_len,
            "advisory": advisory,
            "error": snapshot.error,
        }),
    )
}

fn handle_zones(ctx: &EndpointContext) -> (u16, Value) {
    let (alert, river_level) = {
        let state = lock_state(&ctx.state);
        (state.alert(), state.river_level())
    };

    (
        200,
        json!({
            "alert": alert,
            "river_level_m": river_level,
            "zones": zone_statuses(&ctx.zones, alert, river_level),
        }),
    )
}

fn handle_history(ctx: &EndpointContext) -> (u16, Value) {
    let records: Vec<SensorRecord> = lock_state(&ctx.state).history().cloned().collect();
    let summary = summarize(&records);

    (200, json!({ "summary": summary, "records": records }))
}

fn handle_advisory(token: &str) -> (u16, Value) {
    let decoded = urlencoding::decode(token)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| token.to_string());

    match AlertLevel::from_token(&decoded) {
        Some(level) => (200, json!(advisory_for(level))),
        None => (
            404,
            json!({
                "error": format!("Unknown alert level: {}", decoded),
                "levels": AlertLevel::ALL.iter().map(|l| l.token()).collect::<Vec<_>>(),
            }),
        ),
    }
}

fn handle_classify(body: &str) -> (u16, Value) {
    let reading: Reading = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return (400, json!({ "error": format!("Invalid reading: {}", e) })),
    };

    let assessment = classify(&reading);
    (
        200,
        json!({
            "reading": reading,
            "riskScore": assessment.risk_score,
            "alertLevel": assessment.alert_level,
            "advisory": advisory_for(assessment.alert_level),
        }),
    )
}

fn handle_alert_override(ctx: &EndpointContext, body: &str) -> (u16, Value) {
    let request: AlertOverride = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return (400, json!({ "error": format!("Invalid request: {}", e) })),
    };

    let Some(level) = AlertLevel::from_token(&request.level) else {
        return (400, json!({ "error": format!("Unknown alert level: {}", request.level) }));
    };

    if ctx.events.send(MonitorEvent::SetAlert(level)).is_err() {
        return (503, json!({ "error": "Monitor is not running" }));
    }

    tracing::info!(level = %level, "manual alert override requested");
    (202, json!({ "accepted": level }))
}

/// Risk class stored for uplink records. No model scores them here, so the
/// uplink's own value is not trusted.
const UNSCORED_RISK_CLASS: i32 = 0;

/// Decodes an uplink body into the record to store.
fn parse_sensor_payload(body: &str) -> Result<NewSensorRecord, (u16, Value)> {
    if body.trim().is_empty() {
        return Err((400, json!({ "error": "Nenhum dado JSON enviado" })));
    }

    let record: NewSensorRecord = serde_json::from_str(body)
        .map_err(|e| (400, json!({ "error": format!("JSON inválido: {}", e) })))?;

    Ok(NewSensorRecord {
        risco_enchente: UNSCORED_RISK_CLASS,
        ..record
    })
}

fn handle_add_reading(ctx: &mut EndpointContext, body: &str) -> (u16, Value) {
    let record = match parse_sensor_payload(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let Some(client) = ctx.db.as_mut() else {
        return (503, json!({ "error": "Banco de dados não configurado" }));
    };

    match db::insert_record(client, &record) {
        Ok(stored) => {
            tracing::info!(id = %stored.id, nivel_rio = stored.nivel_rio, risco = ?stored.risco_enchente, "sensor record stored");
            if ctx.events.send(MonitorEvent::Record(stored.clone())).is_err() {
                tracing::warn!(id = %stored.id, "monitor not running, record stored but not applied");
            }
            (
                201,
                json!({
                    "message": "Dados recebidos e armazenados com sucesso!",
                    "data_inserted": stored,
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "sensor record insert failed");
            (500, json!({ "error": e.to_string() }))
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified address and port
pub fn start_endpoint_server(bind_address: &str, port: u16, mut ctx: EndpointContext) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("{}:{}", bind_address, port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    tracing::info!(%bind_address, port, "HTTP endpoint listening");

    for mut request in server.incoming_requests() {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();

        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            let response = create_response(400, json!({ "error": format!("Unreadable body: {}", e) }));
            if let Err(e) = request.respond(response) {
                tracing::warn!(error = %e, "failed to send response");
            }
            continue;
        }

        let (status, json) = route(&mut ctx, &method, &url, &body);
        tracing::debug!(%method, %url, status, "request handled");

        if let Err(e) = request.respond(create_response(status, json)) {
            tracing::warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());

    let response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json; charset=utf-8"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorState;
    use crate::zones::builtin_zones;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};

    fn context() -> (EndpointContext, Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel();
        let ctx = EndpointContext {
            state: Arc::new(Mutex::new(MonitorState::new(24))),
            events: tx,
            zones: builtin_zones(),
            db: None,
        };
        (ctx, rx)
    }

    #[test]
    fn test_health() {
        let (mut ctx, _rx) = context();
        let (status, body) = route(&mut ctx, "GET", "/health", "");
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "floodrisk_service");
    }

    #[test]
    fn test_unknown_route_lists_endpoints() {
        let (mut ctx, _rx) = context();
        let (status, body) = route(&mut ctx, "GET", "/site/05568500", "");
        assert_eq!(status, 404);
        assert!(body["available_endpoints"].as_array().unwrap().len() >= 8);
    }

    #[test]
    fn test_classify_returns_assessment_and_advisory() {
        let (mut ctx, _rx) = context();
        let body = r#"{"precipitation": 20, "riverLevel": 4, "humidity": 100, "temperature": 0}"#;
        let (status, json) = route(&mut ctx, "POST", "/classify", body);

        assert_eq!(status, 200);
        assert_eq!(json["alertLevel"], "critico");
        assert!((json["riskScore"].as_f64().unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(json["advisory"]["action"], "Evacuação Imediata");
    }

    #[test]
    fn test_classify_rejects_incomplete_reading() {
        let (mut ctx, _rx) = context();
        let (status, json) = route(&mut ctx, "POST", "/classify", r#"{"precipitation": 3}"#);
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().contains("Invalid reading"));
    }

    #[test]
    fn test_classify_does_not_touch_state() {
        let (mut ctx, rx) = context();
        let body = r#"{"precipitation": 20, "riverLevel": 4, "humidity": 100, "temperature": 0}"#;
        route(&mut ctx, "POST", "/classify", body);

        assert!(rx.try_recv().is_err());
        assert_eq!(lock_state(&ctx.state).alert(), AlertLevel::Baixo);
    }

    #[test]
    fn test_status_reflects_state() {
        let (mut ctx, _rx) = context();
        lock_state(&ctx.state).apply(
            MonitorEvent::Reading(Reading::new(16.0, 3.4, 90.0, 21.0)),
            chrono::Utc::now(),
        );

        let (status, json) = route(&mut ctx, "GET", "/status", "");
        assert_eq!(status, 200);
        assert_eq!(json["alert"], "alto");
        assert_eq!(json["alert_label"], "ALTO");
        assert_eq!(json["alert_source"], "computed");
        assert_eq!(json["advisory"]["flood_probability_pct"], 65);
        assert_eq!(json["reading"]["riverLevel"], 3.4);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_zones_follow_current_alert() {
        let (mut ctx, _rx) = context();
        lock_state(&ctx.state).apply(MonitorEvent::SetAlert(AlertLevel::Critico), chrono::Utc::now());

        let (status, json) = route(&mut ctx, "GET", "/zones", "");
        assert_eq!(status, 200);
        let zones = json["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 4);
        assert_eq!(zones[1]["name"], "Vila Nova");
        assert_eq!(zones[1]["status"], "alto");
        assert_eq!(zones[3]["status"], "baixo");
        assert!(json["river_level_m"].is_null());
    }

    #[test]
    fn test_history_empty_window() {
        let (mut ctx, _rx) = context();
        let (status, json) = route(&mut ctx, "GET", "/history", "");
        assert_eq!(status, 200);
        assert_eq!(json["summary"]["count"], 0);
        assert!(json["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_advisory_by_token() {
        let (mut ctx, _rx) = context();
        let (status, json) = route(&mut ctx, "GET", "/advisory/medio", "");
        assert_eq!(status, 200);
        assert_eq!(json["time_to_flood"], "12-24 horas");

        let (status, json) = route(&mut ctx, "GET", "/advisory/cr%C3%ADtico", "");
        assert_eq!(status, 200);
        assert_eq!(json["level"], "critico");

        let (status, _) = route(&mut ctx, "GET", "/advisory/extremo", "");
        assert_eq!(status, 404);
    }

    #[test]
    fn test_alert_override_is_forwarded_to_monitor() {
        let (mut ctx, rx) = context();
        let (status, json) = route(&mut ctx, "POST", "/alert", r#"{"level": "alto"}"#);
        assert_eq!(status, 202);
        assert_eq!(json["accepted"], "alto");
        assert_eq!(rx.try_recv().unwrap(), MonitorEvent::SetAlert(AlertLevel::Alto));
    }

    #[test]
    fn test_alert_override_rejects_unknown_level() {
        let (mut ctx, rx) = context();
        let (status, _) = route(&mut ctx, "POST", "/alert", r#"{"level": "vermelho"}"#);
        assert_eq!(status, 400);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_add_reading_requires_body() {
        let (mut ctx, _rx) = context();
        let (status, json) = route(&mut ctx, "POST", "/add-reading", "");
        assert_eq!(status, 400);
        assert_eq!(json["error"], "Nenhum dado JSON enviado");
    }

    #[test]
    fn test_sensor_payload_risk_class_is_not_trusted() {
        let record = parse_sensor_payload(r#"{"nivel_rio": 6.1, "chuva_1h": 30, "risco_enchente": 3}"#).unwrap();
        assert_eq!(record.nivel_rio, 6.1);
        assert_eq!(record.chuva_1h, 30.0);
        assert_eq!(record.risco_enchente, 0);
    }

    #[test]
    fn test_sensor_payload_rejects_bad_json() {
        let (status, json) = parse_sensor_payload("{nivel_rio").unwrap_err();
        assert_eq!(status, 400);
        assert!(json["error"].as_str().unwrap().starts_with("JSON inválido"));
    }

    #[test]
    fn test_add_reading_without_database_is_unavailable() {
        let (mut ctx, rx) = context();
        let (status, _) = route(&mut ctx, "POST", "/add-reading", r#"{"nivel_rio": 3.2}"#);
        assert_eq!(status, 503);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_query_string_is_ignored_for_routing() {
        let (mut ctx, _rx) = context();
        let (status, _) = route(&mut ctx, "GET", "/health?verbose=1", "");
        assert_eq!(status, 200);
    }
}
