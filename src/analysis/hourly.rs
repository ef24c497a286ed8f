/// Hourly-slot filling for the daylight observation window.
///
/// The RaccoonBot beacons shortly after every hour mark between 10:00 and
/// 17:00 local time. Daily charts expect one point per slot; when a beacon is
/// dropped, this module synthesizes the slot from neighbouring real readings.
///
/// Unlike `gaps`, synthesized slots are emitted as plain `Reading`s: within
/// the fixed window they are treated as first-class data.
///
/// # Clock injection
/// Whether a day is "today" (and which hours of it have happened) depends on
/// the current time. `fill_hourly_slots_at` takes `now` explicitly; the
/// `fill_hourly_slots` wrapper uses `Utc::now()`.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::logging::{self, Component};
use crate::model::Reading;
use crate::timezone::{format_date, AppTimezone};

/// First local hour of the observation window.
pub const WINDOW_START_HOUR: u32 = 10;

/// Last local hour of the observation window, inclusive.
pub const WINDOW_END_HOUR: u32 = 17;

/// A reading counts for hour H only if it lands within this many minutes
/// after H:00.
pub const SLOT_GRACE_MINUTES: u32 = 10;

/// How far across the window a day's missing slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotSpan {
    /// From the first present slot to the last present slot.
    #[default]
    Observed,
    /// Every slot of the window, using edge rules before the first and after
    /// the last real reading.
    FullWindow,
}

/// Fills missing hourly slots using the current time for the "today" clamp.
pub fn fill_hourly_slots(series: &[Reading], tz: &AppTimezone, span: SlotSpan) -> Vec<Reading> {
    fill_hourly_slots_at(series, tz, span, Utc::now())
}

/// Fills missing hourly slots for every local day present in `series`.
///
/// Days without a single qualifying in-window reading pass through
/// untouched. On the day that is "today" at `now`, no slot later than the
/// current local hour is synthesized. Output is sorted ascending.
pub fn fill_hourly_slots_at(
    series: &[Reading],
    tz: &AppTimezone,
    span: SlotSpan,
    now: DateTime<Utc>,
) -> Vec<Reading> {
    if series.is_empty() {
        return Vec::new();
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<Reading>> = BTreeMap::new();
    for reading in series {
        by_day.entry(tz.local_date_of(reading.timestamp)).or_default().push(*reading);
    }

    let today = tz.local_date_of(now);
    let current_hour = tz.hour_of(now);

    let mut all = Vec::with_capacity(series.len());
    for (date, mut day) in by_day {
        day.sort_by_key(|r| r.timestamp);

        let clamp = (date == today).then_some(current_hour);
        let synthesized = fill_day(&day, date, tz, span, clamp);
        if !synthesized.is_empty() {
            logging::debug(
                Component::Hourly,
                Some(&format_date(date)),
                &format!("synthesized {} hourly slots", synthesized.len()),
            );
        }

        all.extend(day);
        all.extend(synthesized);
    }

    all.sort_by_key(|r| r.timestamp);
    all
}

/// True if `reading` is the beacon for local hour `hour`.
pub fn counts_for_hour(reading: &Reading, hour: u32, tz: &AppTimezone) -> bool {
    tz.hour_of(reading.timestamp) == hour && tz.minute_of(reading.timestamp) <= SLOT_GRACE_MINUTES
}

/// Window hours holding a qualifying reading.
pub fn present_hours(day: &[Reading], tz: &AppTimezone) -> BTreeSet<u32> {
    day.iter()
        .filter_map(|r| {
            (WINDOW_START_HOUR..=WINDOW_END_HOUR).find(|hour| counts_for_hour(r, *hour, tz))
        })
        .collect()
}

/// Synthesized readings for one day. `day` must be sorted.
fn fill_day(
    day: &[Reading],
    date: NaiveDate,
    tz: &AppTimezone,
    span: SlotSpan,
    clamp_hour: Option<u32>,
) -> Vec<Reading> {
    let present = present_hours(day, tz);
    let (Some(&first_present), Some(&last_present)) = (present.first(), present.last()) else {
        return Vec::new();
    };

    let (first, mut last) = match span {
        SlotSpan::Observed => (first_present, last_present.min(WINDOW_END_HOUR)),
        SlotSpan::FullWindow => (WINDOW_START_HOUR, WINDOW_END_HOUR),
    };
    if let Some(current_hour) = clamp_hour {
        last = last.min(current_hour);
    }

    (first..=last)
        .filter(|hour| !present.contains(hour))
        .filter_map(|hour| synthesize_slot(day, date, hour, tz))
        .collect()
}

/// Averages neighbouring real readings into a reading at `hour`:00 local.
///
/// - nothing earlier that day: the two earliest readings
/// - nothing later that day: the two latest readings
/// - otherwise: nearest earlier and nearest later reading, by local hour
///
/// Needs at least two real readings; returns `None` otherwise.
fn synthesize_slot(day: &[Reading], date: NaiveDate, hour: u32, tz: &AppTimezone) -> Option<Reading> {
    if day.len() < 2 {
        return None;
    }

    let before = day.iter().rev().find(|r| tz.hour_of(r.timestamp) < hour);
    let after = day.iter().find(|r| tz.hour_of(r.timestamp) > hour);

    let (a, b) = match (before, after) {
        (None, _) => (&day[0], &day[1]),
        (_, None) => (&day[day.len() - 2], &day[day.len() - 1]),
        (Some(left), Some(right)) => (left, right),
    };

    let timestamp = match tz.at_local_time(date, hour, 0, 0) {
        Ok(ts) => ts,
        Err(e) => {
            logging::warn(Component::Hourly, Some(&format_date(date)), &e.to_string());
            return None;
        }
    };

    Some(Reading::new(a.kind, timestamp, (a.value + b.value) / 2.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorKind;

    fn tz() -> AppTimezone {
        AppTimezone::default()
    }

    fn at(date: &str, hour: u32, minute: u32) -> DateTime<Utc> {
        tz().at_hour(date, hour, minute).unwrap()
    }

    fn reading(date: &str, hour: u32, minute: u32, value: f64) -> Reading {
        Reading::new(SensorKind::Temperature, at(date, hour, minute), value)
    }

    /// A "now" well after every test day.
    fn later() -> DateTime<Utc> {
        at("2030-01-01", 12, 0)
    }

    fn synthesized_hours(out: &[Reading], input: &[Reading]) -> Vec<(u32, f64)> {
        out.iter()
            .filter(|r| !input.contains(r))
            .map(|r| (tz().hour_of(r.timestamp), r.value))
            .collect()
    }

    #[test]
    fn test_observed_span_fills_between_present_slots() {
        let input = vec![reading("2024-06-12", 12, 0, 10.0), reading("2024-06-12", 15, 5, 20.0)];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::Observed, later());
        assert_eq!(synthesized_hours(&out, &input), vec![(13, 15.0), (14, 15.0)]);
    }

    #[test]
    fn test_full_window_with_two_readings_fills_every_slot_with_midpoint() {
        let input = vec![reading("2024-06-12", 12, 0, 10.0), reading("2024-06-12", 15, 0, 20.0)];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::FullWindow, later());
        assert_eq!(out.len(), 8);
        assert_eq!(
            synthesized_hours(&out, &input),
            vec![(10, 15.0), (11, 15.0), (13, 15.0), (14, 15.0), (16, 15.0), (17, 15.0)]
        );
    }

    #[test]
    fn test_middle_slot_averages_nearest_neighbours() {
        let input = vec![
            reading("2024-06-12", 10, 0, 1.0),
            reading("2024-06-12", 11, 0, 3.0),
            reading("2024-06-12", 14, 0, 9.0),
            reading("2024-06-12", 15, 0, 11.0),
        ];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::Observed, later());
        assert_eq!(synthesized_hours(&out, &input), vec![(12, 6.0), (13, 6.0)]);
    }

    #[test]
    fn test_edge_slots_use_two_earliest_and_two_latest() {
        let input = vec![
            reading("2024-06-12", 12, 0, 2.0),
            reading("2024-06-12", 13, 0, 4.0),
            reading("2024-06-12", 14, 0, 6.0),
            reading("2024-06-12", 15, 0, 10.0),
        ];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::FullWindow, later());
        assert_eq!(
            synthesized_hours(&out, &input),
            vec![(10, 3.0), (11, 3.0), (16, 8.0), (17, 8.0)]
        );
    }

    #[test]
    fn test_synthesized_slots_sit_on_the_hour() {
        let input = vec![reading("2024-06-12", 10, 3, 1.0), reading("2024-06-12", 13, 7, 2.0)];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::Observed, later());
        for r in out.iter().filter(|r| !input.contains(r)) {
            assert_eq!(tz().minute_of(r.timestamp), 0);
            assert_eq!(tz().date_string_of(r.timestamp), "2024-06-12");
        }
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_today_never_fills_future_hours() {
        let now = at("2024-06-12", 13, 25);
        let input = vec![
            reading("2024-06-11", 10, 0, 1.0),
            reading("2024-06-11", 17, 0, 1.0),
            reading("2024-06-12", 10, 0, 2.0),
            reading("2024-06-12", 12, 0, 4.0),
            reading("2024-06-12", 16, 0, 8.0),
        ];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::FullWindow, now);

        let today_synth: Vec<u32> = out
            .iter()
            .filter(|r| !input.contains(r) && tz().date_string_of(r.timestamp) == "2024-06-12")
            .map(|r| tz().hour_of(r.timestamp))
            .collect();
        assert_eq!(today_synth, vec![11, 13]);

        let yesterday_synth = out
            .iter()
            .filter(|r| !input.contains(r) && tz().date_string_of(r.timestamp) == "2024-06-11")
            .count();
        assert_eq!(yesterday_synth, 6, "previous days are not clamped");
    }

    #[test]
    fn test_day_without_window_readings_is_untouched() {
        let input = vec![
            reading("2024-06-12", 0, 30, 1.0),
            reading("2024-06-12", 3, 0, 2.0),
            reading("2024-06-12", 20, 0, 3.0),
        ];
        for span in [SlotSpan::Observed, SlotSpan::FullWindow] {
            let out = fill_hourly_slots_at(&input, &tz(), span, later());
            assert_eq!(out, input);
        }
    }

    #[test]
    fn test_late_reading_does_not_count_for_its_hour() {
        let late = reading("2024-06-12", 10, 42, 4.0);
        assert!(!counts_for_hour(&late, 10, &tz()));
        assert!(counts_for_hour(&reading("2024-06-12", 10, 10, 4.0), 10, &tz()));

        let input = vec![late, reading("2024-06-12", 12, 0, 8.0), reading("2024-06-12", 13, 0, 20.0)];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::FullWindow, later());
        let hours: Vec<u32> = synthesized_hours(&out, &input).iter().map(|(h, _)| *h).collect();
        assert!(hours.contains(&10), "10:42 must not satisfy the 10:00 slot");
    }

    #[test]
    fn test_single_reading_day_synthesizes_nothing() {
        let input = vec![reading("2024-06-12", 12, 0, 5.0)];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::FullWindow, later());
        assert_eq!(out, input);
    }

    #[test]
    fn test_multiple_days_are_filled_independently_and_sorted() {
        let input = vec![
            reading("2024-06-13", 10, 0, 5.0),
            reading("2024-06-13", 12, 0, 7.0),
            reading("2024-06-12", 10, 0, 1.0),
            reading("2024-06-12", 12, 0, 3.0),
        ];
        let out = fill_hourly_slots_at(&input, &tz(), SlotSpan::Observed, later());
        assert_eq!(out.len(), 6);
        assert!(out.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(synthesized_hours(&out, &input), vec![(11, 2.0), (11, 6.0)]);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(fill_hourly_slots_at(&[], &tz(), SlotSpan::Observed, later()).is_empty());
    }
}
