/// Data analysis for the flood risk service.
///
/// Submodules:
/// - `summary` — statistics over the sensor record history window.

pub mod summary;
