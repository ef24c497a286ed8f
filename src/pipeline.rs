/// Chart views over assembled series.
///
/// A view applies at most one gap-filling stage to each series. Chaining the
/// interpolator after the hourly filler (or the reverse) would let one stage
/// fabricate points from the other's output, so `ChartView` makes the
/// choice exclusive.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::analysis::gaps;
use crate::analysis::hourly::{self, SlotSpan};
use crate::config::{ConfigError, DashboardConfig};
use crate::ingest::assembler::RangeAssembler;
use crate::ingest::store::ReadingStore;
use crate::model::{AssembleError, InterpolatedReading, Reading, SensorKind, SeriesMap};
use crate::timezone::AppTimezone;

/// Per-kind output of a view.
pub type ViewSeries = BTreeMap<SensorKind, Vec<InterpolatedReading>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartView {
    /// Assembled readings as stored.
    #[default]
    Raw,
    /// Large gaps bridged with flagged, linearly interpolated points.
    GapFilled,
    /// Missing hourly beacons of the daylight window synthesized per day.
    HourlySlots(SlotSpan),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPipeline {
    tz: AppTimezone,
    expected_interval_override: Option<i64>,
}

impl ViewPipeline {
    pub fn new(tz: AppTimezone, expected_interval_override: Option<i64>) -> Self {
        Self { tz, expected_interval_override }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.app_timezone()?, config.manual_expected_interval_ms))
    }

    pub fn timezone(&self) -> &AppTimezone {
        &self.tz
    }

    pub fn apply(&self, view: ChartView, series: &[Reading]) -> Vec<InterpolatedReading> {
        self.apply_at(view, series, Utc::now())
    }

    /// Runs one series through `view`. `now` only matters for the hourly
    /// view's "today" clamp.
    pub fn apply_at(&self, view: ChartView, series: &[Reading], now: DateTime<Utc>) -> Vec<InterpolatedReading> {
        match view {
            ChartView::Raw => series.iter().copied().map(InterpolatedReading::original).collect(),
            ChartView::GapFilled => gaps::fill(series, self.expected_interval_override),
            ChartView::HourlySlots(span) => hourly::fill_hourly_slots_at(series, &self.tz, span, now)
                .into_iter()
                .map(InterpolatedReading::original)
                .collect(),
        }
    }

    pub fn render(&self, view: ChartView, map: &SeriesMap) -> ViewSeries {
        self.render_at(view, map, Utc::now())
    }

    /// Applies `view` to every series of `map`; empty series stay empty.
    pub fn render_at(&self, view: ChartView, map: &SeriesMap, now: DateTime<Utc>) -> ViewSeries {
        map.iter()
            .map(|(kind, series)| (kind, self.apply_at(view, series, now)))
            .collect()
    }
}

/// Assembles `start..=end` and renders it through `view`.
pub async fn load_view<S: ReadingStore>(
    assembler: &RangeAssembler<S>,
    pipeline: &ViewPipeline,
    view: ChartView,
    start_str: &str,
    end_str: &str,
) -> Result<ViewSeries, AssembleError> {
    let map = assembler.fetch_range(start_str, end_str).await?;
    Ok(pipeline.render(view, &map))
}
