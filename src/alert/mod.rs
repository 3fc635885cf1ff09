/// Alert derivation for the flood risk service.
///
/// Submodules:
/// - `classifier` — reading → risk score → alert level, plus the stored
///   risk class lookup used by the sensor feed.
/// - `advisory`   — public guidance per alert level.

pub mod advisory;
pub mod classifier;
