/// Gap interpolation for charting.
///
/// Walks a sorted series pairwise and, wherever two consecutive real samples
/// are further apart than `GAP_THRESHOLD_MULTIPLIER` expected intervals,
/// inserts evenly spaced synthetic points on the straight line between them.
/// Synthetic points are flagged `is_interpolated` so charts can style them
/// differently; they are never persisted.
///
/// No cap is placed on the number of synthetic points: a single gap of N
/// intervals produces N - 1 points. Callers feeding multi-day ranges should
/// expect memory proportional to the covered span, not to the sample count.

use chrono::Duration;

use crate::analysis::interval;
use crate::logging::{self, Component};
use crate::model::{InterpolatedReading, Reading};

/// A gap exists when consecutive samples are more than this many expected
/// intervals apart.
pub const GAP_THRESHOLD_MULTIPLIER: i64 = 2;

/// Picks the interval used for filling: a positive override wins, otherwise
/// the interval is estimated from `series` itself.
pub fn resolve_interval(series: &[Reading], expected_interval_override: Option<i64>) -> i64 {
    match expected_interval_override {
        Some(ms) if ms > 0 => ms,
        _ => interval::estimate(series),
    }
}

/// Fills gaps in `series` (sorted defensively).
///
/// Output is always sorted ascending. When the interval resolves to 0 the
/// input readings come back unflagged and nothing is fabricated, but they are
/// still stably sorted: an undeterminable interval means every delta rounds
/// to zero, so only sub-second jitter can reorder them.
pub fn fill(series: &[Reading], expected_interval_override: Option<i64>) -> Vec<InterpolatedReading> {
    let interval_ms = resolve_interval(series, expected_interval_override);
    if interval_ms <= 0 {
        if series.len() >= 2 {
            logging::warn(
                Component::Gaps,
                None,
                &format!(
                    "expected interval undeterminable for {} points; skipping gap fill",
                    series.len()
                ),
            );
        }
        let mut unchanged = series.to_vec();
        unchanged.sort_by_key(|r| r.timestamp);
        return unchanged.into_iter().map(InterpolatedReading::original).collect();
    }

    let mut sorted = series.to_vec();
    sorted.sort_by_key(|r| r.timestamp);

    let mut filled = Vec::with_capacity(sorted.len());
    for (i, current) in sorted.iter().enumerate() {
        if i > 0 {
            filled.extend(interpolate_gap(&sorted[i - 1], current, interval_ms));
        }
        filled.push(InterpolatedReading::original(*current));
    }

    let added = filled.len() - sorted.len();
    if added > 0 {
        logging::debug(
            Component::Gaps,
            None,
            &format!("inserted {} points at {} ms spacing", added, interval_ms),
        );
    }
    filled
}

/// Synthetic points strictly between `prev` and `next`, at every multiple of
/// `interval_ms` after `prev`. Empty unless the gap exceeds the threshold.
pub fn interpolate_gap(prev: &Reading, next: &Reading, interval_ms: i64) -> Vec<InterpolatedReading> {
    let delta_ms = (next.timestamp - prev.timestamp).num_milliseconds();
    if interval_ms <= 0 || delta_ms <= interval_ms.saturating_mul(GAP_THRESHOLD_MULTIPLIER) {
        return Vec::new();
    }

    let span = next.value - prev.value;
    let mut points = Vec::with_capacity((delta_ms / interval_ms) as usize);
    let mut elapsed_ms = interval_ms;
    while elapsed_ms < delta_ms {
        let value = prev.value + span * elapsed_ms as f64 / delta_ms as f64;
        let timestamp = prev.timestamp + Duration::milliseconds(elapsed_ms);
        points.push(InterpolatedReading::synthesized(Reading::new(prev.kind, timestamp, value)));
        elapsed_ms += interval_ms;
    }
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorKind;
    use chrono::{TimeZone, Utc};

    fn point(ms: i64, value: f64) -> Reading {
        Reading::new(SensorKind::Humidity, Utc.timestamp_millis_opt(ms).unwrap(), value)
    }

    fn millis(p: &InterpolatedReading) -> i64 {
        p.reading.timestamp.timestamp_millis()
    }

    #[test]
    fn test_five_minute_gap_at_one_minute_interval() {
        let series = vec![point(0, 0.0), point(300_000, 30.0)];
        let filled = fill(&series, Some(60_000));

        assert_eq!(filled.len(), 6);
        let expected = [(0, 0.0, false), (60_000, 6.0, true), (120_000, 12.0, true),
                        (180_000, 18.0, true), (240_000, 24.0, true), (300_000, 30.0, false)];
        for (p, (ms, value, flagged)) in filled.iter().zip(expected) {
            assert_eq!(millis(p), ms);
            assert!((p.reading.value - value).abs() < 1e-9, "value at {} was {}", ms, p.reading.value);
            assert_eq!(p.is_interpolated, flagged);
        }
    }

    #[test]
    fn test_gap_at_exact_threshold_is_left_alone() {
        let series = vec![point(0, 1.0), point(120_000, 2.0)];
        assert_eq!(fill(&series, Some(60_000)).len(), 2);
    }

    #[test]
    fn test_gap_just_over_threshold_gets_two_points() {
        let series = vec![point(0, 0.0), point(121_000, 11.0)];
        let filled = fill(&series, Some(60_000));
        let synthetic: Vec<i64> = filled.iter().filter(|p| p.is_interpolated).map(millis).collect();
        assert_eq!(synthetic, vec![60_000, 120_000]);
    }

    #[test]
    fn test_estimated_interval_used_without_override() {
        // Regular 60s cadence, then a 4-minute hole.
        let series = vec![point(0, 0.0), point(60_000, 1.0), point(120_000, 2.0),
                          point(180_000, 3.0), point(420_000, 7.0)];
        let filled = fill(&series, None);
        assert_eq!(filled.iter().filter(|p| p.is_interpolated).count(), 3);
        assert!((filled[5].reading.value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_override_falls_back_to_estimate() {
        let series = vec![point(0, 0.0), point(60_000, 1.0), point(120_000, 2.0), point(360_000, 6.0)];
        assert_eq!(resolve_interval(&series, Some(0)), 60_000);
        assert_eq!(resolve_interval(&series, Some(-5)), 60_000);
        assert_eq!(resolve_interval(&series, None), 60_000);
        assert_eq!(resolve_interval(&series, Some(30_000)), 30_000);
    }

    #[test]
    fn test_undeterminable_interval_returns_input_unchanged() {
        let series = vec![point(5_000, 1.0), point(5_000, 2.0)];
        let filled = fill(&series, None);
        assert_eq!(filled.len(), 2);
        assert!(filled.iter().all(|p| !p.is_interpolated));
        assert_eq!(filled[1].reading.value, 2.0);
    }

    #[test]
    fn test_undeterminable_interval_still_sorts_sub_second_jitter() {
        // 400 ms rounds to a zero delta, so no interval can be estimated.
        let series = vec![point(400, 2.0), point(0, 1.0)];
        let filled = fill(&series, None);
        assert!(filled.iter().all(|p| !p.is_interpolated));
        assert_eq!(filled.iter().map(millis).collect::<Vec<_>>(), vec![0, 400]);
    }

    #[test]
    fn test_huge_configured_interval_never_overflows_threshold() {
        let series = vec![point(0, 0.0), point(60_000, 1.0)];
        let filled = fill(&series, Some(i64::MAX / 2 + 1));
        assert_eq!(filled.len(), 2);
        assert!(filled.iter().all(|p| !p.is_interpolated));
        assert!(interpolate_gap(&series[0], &series[1], i64::MAX).is_empty());
    }

    #[test]
    fn test_unsorted_input_produces_sorted_output_with_all_originals() {
        let series = vec![point(600_000, 10.0), point(0, 0.0), point(60_000, 1.0)];
        let filled = fill(&series, Some(60_000));
        assert!(filled.windows(2).all(|w| w[0].reading.timestamp <= w[1].reading.timestamp));
        for original in &series {
            assert!(filled.iter().any(|p| !p.is_interpolated && p.reading == *original));
        }
        assert_eq!(filled.len(), 11);
    }

    #[test]
    fn test_refilling_output_adds_nothing() {
        let series = vec![point(0, 0.0), point(90_000, 3.0), point(1_000_000, 9.0)];
        let first = fill(&series, Some(30_000));
        let readings: Vec<Reading> = first.iter().map(|p| p.reading).collect();
        let second = fill(&readings, Some(30_000));
        assert_eq!(second.len(), first.len());
        assert!(second.iter().all(|p| !p.is_interpolated));
    }

    #[test]
    fn test_synthetic_points_keep_series_kind() {
        let series = vec![point(0, 0.0), point(600_000, 10.0)];
        assert!(fill(&series, Some(60_000)).iter().all(|p| p.reading.kind == SensorKind::Humidity));
    }
}
