/// Series reconstruction for charting and export.
///
/// Everything here is pure and synchronous: each function takes a series and
/// returns a new one, with no shared state across calls.
///
/// Submodules:
/// - `interval`: estimates the dominant sampling period of a series.
/// - `gaps`: fills large gaps with flagged, linearly interpolated points.
/// - `hourly`: fills missing 10:00 to 17:00 local hourly slots per day.
/// - `groupings`: day markers, timeframe windows, and chart domains.

pub mod gaps;
pub mod groupings;
pub mod hourly;
pub mod interval;
