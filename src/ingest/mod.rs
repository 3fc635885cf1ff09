/// Sensor feed clients.
///
/// Submodules:
/// - `rest`     — Supabase/PostgREST client for the `flood_data` table
/// - `fixtures` (test only) — representative response payloads

pub mod rest;

#[cfg(test)]
pub(crate) mod fixtures;
