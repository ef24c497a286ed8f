/// Expected sampling interval estimation.
///
/// The RaccoonBot beacons on a nominal schedule, but radio retries and
/// clock jitter make consecutive deltas noisy. The estimate is the modal
/// delta after rounding every delta to the nearest whole second.

use std::collections::BTreeMap;

use crate::model::Reading;

/// Returns the expected interval in milliseconds, or 0 when it cannot be
/// determined (fewer than two points, or every point at the same instant).
///
/// Zero deltas (duplicate instants) carry no spacing information and are
/// left out of the vote. When two rounded deltas are equally frequent the
/// smaller one wins.
pub fn estimate(series: &[Reading]) -> i64 {
    if series.len() < 2 {
        return 0;
    }

    let mut sorted: Vec<_> = series.iter().map(|r| r.timestamp).collect();
    sorted.sort();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in sorted.windows(2) {
        let delta_ms = (pair[1] - pair[0]).num_milliseconds();
        let rounded = round_to_second(delta_ms);
        if rounded > 0 {
            *counts.entry(rounded).or_insert(0) += 1;
        }
    }

    // BTreeMap iterates ascending, so the first maximum is the smallest delta.
    let mut best: Option<(i64, usize)> = None;
    for (delta, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((delta, count));
        }
    }
    best.map(|(delta, _)| delta).unwrap_or(0)
}

fn round_to_second(delta_ms: i64) -> i64 {
    ((delta_ms as f64 / 1000.0).round() as i64) * 1000
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
