/// Local-calendar normalization for the dashboard.
///
/// The document store keys day-documents by a local calendar date, while
/// instants are stored and transmitted as UTC. Every question of "which day"
/// or "which hour" a reading belongs to is answered here, relative to one
/// fixed IANA zone (the app timezone), never the machine's own zone and never
/// an offset embedded in an incoming timestamp.
///
/// # Clock injection
/// Functions that depend on the current time come in two forms: `*_at(now)`
/// taking an explicit `DateTime<Utc>`, and a convenience wrapper calling
/// `Utc::now()`. Tests use the `_at` form.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::model::TimezoneError;

/// Zone the RaccoonBot deployment observes.
pub const DEFAULT_APP_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Date-string helpers (zone independent)
// ---------------------------------------------------------------------------

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(date_str: &str) -> Result<NaiveDate, TimezoneError> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
        .map_err(|_| TimezoneError::InvalidDate(date_str.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Calendar arithmetic on a `YYYY-MM-DD` string. Pure date math: no zone is
/// consulted, so DST transitions cannot skip or repeat a day.
pub fn add_days(date_str: &str, days: i64) -> Result<String, TimezoneError> {
    let date = parse_date(date_str)?;
    date.checked_add_signed(Duration::days(days))
        .map(format_date)
        .ok_or_else(|| TimezoneError::InvalidDate(date_str.to_string()))
}

// ---------------------------------------------------------------------------
// App timezone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppTimezone {
    tz: Tz,
}

impl Default for AppTimezone {
    fn default() -> Self {
        Self::new(DEFAULT_APP_TIMEZONE)
    }
}

impl AppTimezone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Builds the normalizer from an IANA identifier such as
    /// `"America/Los_Angeles"`.
    pub fn from_name(name: &str) -> Result<Self, TimezoneError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| TimezoneError::UnknownZone(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    fn local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    // --- instant -> local calendar ----------------------------------------

    pub fn local_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }

    /// Calendar date of `instant` as observed in the app timezone.
    pub fn date_string_of(&self, instant: DateTime<Utc>) -> String {
        format_date(self.local_date_of(instant))
    }

    /// Wall-clock hour (0..=23) in the app timezone.
    pub fn hour_of(&self, instant: DateTime<Utc>) -> u32 {
        self.local(instant).hour()
    }

    /// Wall-clock minute (0..=59) in the app timezone.
    pub fn minute_of(&self, instant: DateTime<Utc>) -> u32 {
        self.local(instant).minute()
    }

    pub fn today_string_at(&self, now: DateTime<Utc>) -> String {
        self.date_string_of(now)
    }

    pub fn today_string(&self) -> String {
        self.today_string_at(Utc::now())
    }

    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date_of(a) == self.local_date_of(b)
    }

    // --- local calendar -> instant ----------------------------------------

    /// Instant of local midnight on `date_str`.
    pub fn parse_local_date(&self, date_str: &str) -> Result<DateTime<Utc>, TimezoneError> {
        self.at_hour(date_str, 0, 0)
    }

    /// Instant of the local wall-clock time `hour:minute` on `date_str`.
    pub fn at_hour(
        &self,
        date_str: &str,
        hour: u32,
        minute: u32,
    ) -> Result<DateTime<Utc>, TimezoneError> {
        let date = parse_date(date_str)?;
        self.at_local_time(date, hour, minute, 0)
    }

    /// Resolves a local wall-clock time to an instant.
    ///
    /// Fall-back ambiguity resolves to the earlier instant. A time inside a
    /// spring-forward gap is shifted forward by one hour, the width of every
    /// DST gap in the zones this service is deployed to.
    pub fn at_local_time(
        &self,
        date: NaiveDate,
        hour: u32,
        minute: u32,
        millis: u32,
    ) -> Result<DateTime<Utc>, TimezoneError> {
        let nonexistent = || TimezoneError::NonexistentLocalTime {
            date: format_date(date),
            hour,
            minute,
        };
        let time = NaiveTime::from_hms_milli_opt(hour, minute, 0, millis).ok_or_else(nonexistent)?;
        let naive = NaiveDateTime::new(date, time);

        let resolved = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => self.tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
        };
        resolved.map(|dt| dt.with_timezone(&Utc)).ok_or_else(nonexistent)
    }

    /// Local midnight of the day containing `instant`.
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, TimezoneError> {
        self.at_local_time(self.local_date_of(instant), 0, 0, 0)
    }

    /// 23:59:59.999 local on the day containing `instant`.
    pub fn end_of_day(&self, instant: DateTime<Utc>) -> Result<DateTime<Utc>, TimezoneError> {
        self.at_local_time(self.local_date_of(instant), 23, 59, 0)
            .map(|dt| dt + Duration::milliseconds(59_999))
    }

    // --- display ----------------------------------------------------------

    /// Formats an instant in the app timezone with a `strftime` pattern.
    pub fn format_local(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        self.local(instant).format(pattern).to_string()
    }

    /// Chart x-axis tick for a single-day view, e.g. `"14:00"`.
    /// Unparseable input yields an empty label.
    pub fn hour_tick_label(&self, timestamp: &str) -> String {
        self.format_iso(timestamp, "%H:00")
    }

    /// Chart x-axis tick for a multi-day view, e.g. `"May 02"`.
    pub fn date_tick_label(&self, timestamp: &str) -> String {
        self.format_iso(timestamp, "%b %d")
    }

    /// Tooltip header, e.g. `"2025-05-02 14:05"`.
    pub fn tooltip_label(&self, timestamp: &str) -> String {
        self.format_iso(timestamp, "%Y-%m-%d %H:%M")
    }

    fn format_iso(&self, timestamp: &str, pattern: &str) -> String {
        match DateTime::parse_from_rfc3339(timestamp.trim()) {
            Ok(dt) => self.format_local(dt.with_timezone(&Utc), pattern),
            Err(_) => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
