/// Core data types for the Crystal Cove sensor dashboard.
///
/// This module defines the shared domain model imported by all other modules:
/// sensor kinds, readings, per-kind series maps, and the error enums that
/// cross module boundaries. It contains no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Sensor kinds
// ---------------------------------------------------------------------------

/// Every quantity the RaccoonBot reports.
///
/// The first six are environmental sensors stored under the environment
/// collection; the last five are power-system status channels stored under
/// the status collection. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Pressure,
    Aqi,
    Tvoc,
    Eco2,
    #[serde(rename = "soc_percent")]
    StateOfCharge,
    #[serde(rename = "battery_voltage_v")]
    BatteryVoltage,
    #[serde(rename = "solar_power_w")]
    SolarPower,
    #[serde(rename = "solar_voltage_v")]
    SolarVoltage,
    #[serde(rename = "solar_current_a")]
    SolarCurrent,
}

impl SensorKind {
    pub const ALL: [SensorKind; 11] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Pressure,
        SensorKind::Aqi,
        SensorKind::Tvoc,
        SensorKind::Eco2,
        SensorKind::StateOfCharge,
        SensorKind::BatteryVoltage,
        SensorKind::SolarPower,
        SensorKind::SolarVoltage,
        SensorKind::SolarCurrent,
    ];

    pub fn group(self) -> SensorGroup {
        match self {
            SensorKind::Temperature
            | SensorKind::Humidity
            | SensorKind::Pressure
            | SensorKind::Aqi
            | SensorKind::Tvoc
            | SensorKind::Eco2 => SensorGroup::Environment,
            SensorKind::StateOfCharge
            | SensorKind::BatteryVoltage
            | SensorKind::SolarPower
            | SensorKind::SolarVoltage
            | SensorKind::SolarCurrent => SensorGroup::Status,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Pressure => "pressure",
            SensorKind::Aqi => "aqi",
            SensorKind::Tvoc => "tvoc",
            SensorKind::Eco2 => "eco2",
            SensorKind::StateOfCharge => "soc_percent",
            SensorKind::BatteryVoltage => "battery_voltage_v",
            SensorKind::SolarPower => "solar_power_w",
            SensorKind::SolarVoltage => "solar_voltage_v",
            SensorKind::SolarCurrent => "solar_current_a",
        };
        write!(f, "{}", name)
    }
}

/// The two disjoint sensor families. Each lives under its own root
/// collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorGroup {
    Environment,
    Status,
}

impl SensorGroup {
    /// Kinds belonging to this group, in registry order.
    pub fn kinds(self) -> impl Iterator<Item = SensorKind> {
        SensorKind::ALL.into_iter().filter(move |k| k.group() == self)
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single sensor sample. Identity is `(kind, timestamp)` only; duplicates
/// at the same instant are possible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    #[serde(rename = "type")]
    pub kind: SensorKind,
}

impl Reading {
    pub fn new(kind: SensorKind, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value, kind }
    }
}

/// Readings of one kind, ascending by timestamp once assembled.
pub type SensorSeries = Vec<Reading>;

/// Output point of the gap interpolator. Synthesized points are never
/// written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedReading {
    #[serde(flatten)]
    pub reading: Reading,
    #[serde(rename = "isInterpolated", default)]
    pub is_interpolated: bool,
}

impl InterpolatedReading {
    pub fn original(reading: Reading) -> Self {
        Self { reading, is_interpolated: false }
    }

    pub fn synthesized(reading: Reading) -> Self {
        Self { reading, is_interpolated: true }
    }
}

impl From<Reading> for InterpolatedReading {
    fn from(reading: Reading) -> Self {
        Self::original(reading)
    }
}

// ---------------------------------------------------------------------------
// Per-kind series map
// ---------------------------------------------------------------------------

/// Mapping from sensor kind to its series, keyed by the closed enum.
///
/// Built for one `SensorGroup`; every kind of that group always has an entry,
/// possibly empty, so consumers never need to handle a missing key.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesMap {
    group: SensorGroup,
    series: BTreeMap<SensorKind, SensorSeries>,
}

impl SeriesMap {
    /// A map holding an empty series for every kind of `group`.
    pub fn empty(group: SensorGroup) -> Self {
        Self {
            group,
            series: group.kinds().map(|k| (k, Vec::new())).collect(),
        }
    }

    pub fn group(&self) -> SensorGroup {
        self.group
    }

    /// Series for `kind`; empty for kinds outside this map's group.
    pub fn get(&self, kind: SensorKind) -> &[Reading] {
        self.series.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends a reading to its kind's series. Readings from another group
    /// are ignored.
    pub fn push(&mut self, reading: Reading) {
        if let Some(series) = self.series.get_mut(&reading.kind) {
            series.push(reading);
        }
    }

    /// Concatenates every series of `other` onto this map's series.
    pub fn extend(&mut self, other: SeriesMap) {
        for (kind, readings) in other.series {
            if let Some(series) = self.series.get_mut(&kind) {
                series.extend(readings);
            }
        }
    }

    /// Stable ascending sort of every series by timestamp.
    pub fn sort(&mut self) {
        for series in self.series.values_mut() {
            series.sort_by_key(|r| r.timestamp);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SensorKind, &[Reading])> {
        self.series.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn total_len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn into_inner(self) -> BTreeMap<SensorKind, SensorSeries> {
        self.series
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while talking to the remote document store.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// Non-2xx HTTP response from the store.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The request never produced a response (network, TLS, timeout).
    #[error("Request failed: {0}")]
    Request(String),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),
    /// A record carried a timestamp in neither ISO-8601 nor native form.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors raised by local-calendar conversions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimezoneError {
    #[error("invalid date string '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("unknown timezone '{0}'")]
    UnknownZone(String),
    #[error("no local time {hour:02}:{minute:02} exists on {date}")]
    NonexistentLocalTime { date: String, hour: u32, minute: u32 },
}

/// Failures the range assembler cannot absorb. Store failures never appear
/// here; they fail closed to empty series.
#[derive(Debug, Error, PartialEq)]
pub enum AssembleError {
    #[error(transparent)]
    Timezone(#[from] TimezoneError),
}
