/// Series organization helpers for chart consumers.
///
/// Day markers for multi-day charts, the dashboard's fixed timeframe
/// windows, y-axis domains clamped to each sensor's plausible range, and
/// the latest reading for summary cards. All day boundaries come from the
/// app timezone.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

use crate::model::{Reading, SensorKind};
use crate::sensors;
use crate::timezone::AppTimezone;

// ---------------------------------------------------------------------------
// Day markers
// ---------------------------------------------------------------------------

/// First occurrence of a local day within a sorted series.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMarker {
    /// Local date, `YYYY-MM-DD`.
    pub date: String,
    /// Short axis label, e.g. `"May 02"`.
    pub label: String,
    /// Index of the day's first point in the sorted series.
    pub start_index: usize,
    /// Fraction (0.0..=1.0) of the series' time span at which the day starts.
    pub position: f64,
}

/// One marker per local day, in chronological order.
pub fn group_by_local_date(series: &[Reading], tz: &AppTimezone) -> Vec<DayMarker> {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|r| r.timestamp);

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let span_ms = (last.timestamp - first.timestamp).num_milliseconds();

    let mut markers: Vec<DayMarker> = Vec::new();
    for (index, reading) in sorted.iter().enumerate() {
        let date = tz.date_string_of(reading.timestamp);
        if markers.last().is_some_and(|m| m.date == date) {
            continue;
        }
        let position = if span_ms > 0 {
            (reading.timestamp - first.timestamp).num_milliseconds() as f64 / span_ms as f64
        } else {
            0.0
        };
        markers.push(DayMarker {
            date,
            label: tz.format_local(reading.timestamp, "%b %d"),
            start_index: index,
            position,
        });
    }
    markers
}

/// True when the earliest and latest readings fall on different local days.
pub fn spans_multiple_days(series: &[Reading], tz: &AppTimezone) -> bool {
    let earliest = series.iter().map(|r| r.timestamp).min();
    let latest = series.iter().map(|r| r.timestamp).max();
    match (earliest, latest) {
        (Some(a), Some(b)) => !tz.is_same_day(a, b),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Timeframes
// ---------------------------------------------------------------------------

/// History windows offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    ThreeMinutes,
    OneHour,
    TwentyFourHours,
    OneWeek,
    OneMonth,
    OneYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::ThreeMinutes,
        Timeframe::OneHour,
        Timeframe::TwentyFourHours,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
        Timeframe::OneYear,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Timeframe::ThreeMinutes => "3m",
            Timeframe::OneHour => "1h",
            Timeframe::TwentyFourHours => "24h",
            Timeframe::OneWeek => "1w",
            Timeframe::OneMonth => "1m",
            Timeframe::OneYear => "1y",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Timeframe::ThreeMinutes => Duration::minutes(3),
            Timeframe::OneHour => Duration::hours(1),
            Timeframe::TwentyFourHours => Duration::hours(24),
            Timeframe::OneWeek => Duration::days(7),
            Timeframe::OneMonth => Duration::days(30),
            Timeframe::OneYear => Duration::days(365),
        }
    }

    /// Readings with `now - duration <= timestamp <= now`, order preserved.
    pub fn window(self, series: &[Reading], now: DateTime<Utc>) -> Vec<Reading> {
        let start = now - self.duration();
        series
            .iter()
            .filter(|r| r.timestamp >= start && r.timestamp <= now)
            .copied()
            .collect()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|t| t.code() == s.trim())
            .ok_or_else(|| format!("unknown timeframe '{}'", s))
    }
}

// ---------------------------------------------------------------------------
// Chart helpers
// ---------------------------------------------------------------------------

/// Y-axis bounds: the series' min/max widened by `padding`, never beyond the
/// sensor's plausible range. `None` for an empty series.
///
/// Both ends are clamped into the range, so a series lying entirely outside
/// it collapses onto the nearest range bound; the result never has
/// `low > high`.
pub fn chart_domain(kind: SensorKind, series: &[Reading], padding: f64) -> Option<(f64, f64)> {
    let spec = sensors::spec_for(kind);
    let low = series.iter().map(|r| r.value).reduce(f64::min)?;
    let high = series.iter().map(|r| r.value).reduce(f64::max)?;
    let lo = (low - padding).clamp(spec.min, spec.max);
    let hi = (high + padding).clamp(spec.min, spec.max);
    Some((lo.min(hi), lo.max(hi)))
}

/// Most recent reading, if any.
pub fn latest(series: &[Reading]) -> Option<&Reading> {
    series.iter().max_by_key(|r| r.timestamp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
