/// Crystal Cove sensor dashboard core.
///
/// Reconstructs clean, chronologically ordered per-sensor series from the
/// day-keyed document store: local-calendar normalization, cross-midnight
/// range assembly, sampling-interval estimation, gap interpolation, and
/// hourly-slot filling for the daylight window.

pub mod analysis;
pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod sensors;
pub mod timezone;
