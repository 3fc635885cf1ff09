/// Test fixtures: representative PostgREST payloads for `flood_data`.
///
/// Response shape (one object per row, array even for `limit=1`):
///   [{ "id": uuid, "chuva_1h": n, "chuva_6h": n, "chuva_24h": n,
///      "nivel_rio": n, "tendencia_rio": n, "umidade": n, "vento": n,
///      "risco_enchente": int | null, "created_at": ts, "updated_at": ts }]
///
/// Timestamps carry microseconds and an explicit offset, as Supabase
/// returns them.

/// Latest record during a rising river: 4.35 m, risco_enchente = 2 (alto).
#[cfg(test)]
pub(crate) fn fixture_latest_record_json() -> &'static str {
    r#"[
      {
        "id": "3f1c2a9e-4b7d-4c1e-9a2f-1d5e8b6c7a01",
        "chuva_1h": 12.2,
        "chuva_6h": 48.0,
        "chuva_24h": 96.4,
        "nivel_rio": 4.35,
        "tendencia_rio": 1,
        "umidade": 94.5,
        "vento": 18.0,
        "risco_enchente": 2,
        "created_at": "2024-05-01T15:00:00.000000+00:00",
        "updated_at": "2024-05-01T15:00:00.000000+00:00"
      }
    ]"#
}

/// Three hourly records, oldest first, escalating to risco_enchente = 3.
#[cfg(test)]
pub(crate) fn fixture_history_json() -> &'static str {
    r#"[
      {
        "id": "0b3d6e1a-0000-4000-8000-000000000001",
        "chuva_1h": 4.0, "chuva_6h": 12.0, "chuva_24h": 30.5,
        "nivel_rio": 2.8, "tendencia_rio": 0, "umidade": 82.0, "vento": 9.5,
        "risco_enchente": 1,
        "created_at": "2024-05-01T13:00:00.000000+00:00",
        "updated_at": "2024-05-01T13:00:00.000000+00:00"
      },
      {
        "id": "0b3d6e1a-0000-4000-8000-000000000002",
        "chuva_1h": 9.1, "chuva_6h": 30.2, "chuva_24h": 61.0,
        "nivel_rio": 3.9, "tendencia_rio": 1, "umidade": 91.0, "vento": 14.0,
        "risco_enchente": 2,
        "created_at": "2024-05-01T14:00:00.000000+00:00",
        "updated_at": "2024-05-01T14:00:00.000000+00:00"
      },
      {
        "id": "0b3d6e1a-0000-4000-8000-000000000003",
        "chuva_1h": 15.7, "chuva_6h": 52.3, "chuva_24h": 118.9,
        "nivel_rio": 6.2, "tendencia_rio": 1, "umidade": 97.0, "vento": 22.0,
        "risco_enchente": 3,
        "created_at": "2024-05-01T15:00:00.000000+00:00",
        "updated_at": "2024-05-01T15:05:00.000000+00:00"
      }
    ]"#
}

/// Rows written before the risk model ran: one null class, one absent.
#[cfg(test)]
pub(crate) fn fixture_unscored_records_json() -> &'static str {
    r#"[
      {
        "id": "7c2e9b40-0000-4000-8000-000000000010",
        "chuva_1h": 2.0, "chuva_6h": 6.5, "chuva_24h": 14.0,
        "nivel_rio": 2.3, "tendencia_rio": 0, "umidade": 75.0, "vento": 6.0,
        "risco_enchente": null,
        "created_at": "2024-05-01T11:00:00.000000+00:00",
        "updated_at": "2024-05-01T11:00:00.000000+00:00"
      },
      {
        "id": "7c2e9b40-0000-4000-8000-000000000011",
        "chuva_1h": 3.1, "chuva_6h": 8.0, "chuva_24h": 17.2,
        "nivel_rio": 2.4, "tendencia_rio": 1, "umidade": 78.0, "vento": 7.5,
        "created_at": "2024-05-01T12:00:00.000000+00:00",
        "updated_at": "2024-05-01T12:00:00.000000+00:00"
      }
    ]"#
}

/// Error body PostgREST returns for a bad filter or missing table.
#[cfg(test)]
pub(crate) fn fixture_postgrest_error_json() -> &'static str {
    r#"{
      "code": "42P01",
      "details": null,
      "hint": null,
      "message": "relation \"public.flood_data\" does not exist"
    }"#
}
