/// Range assembly from per-day documents.
///
/// Day-documents are keyed by local calendar date, but the ingestion backend
/// computed that key from a UTC instant. A reading logged at 23:40 local can
/// therefore land in the following day's document. Every day fetch also
/// reads the next day's document and reclaims the readings whose local date
/// is the requested day.
///
/// Store failures never reach the caller: a range with any failed read comes
/// back as empty series for every kind, and the failure is logged. Only an
/// invalid date string escapes as an error.

use chrono::NaiveDate;

use crate::ingest::store::{CollectionPath, RawReading, ReadingStore};
use crate::logging::{self, Component};
use crate::model::{AssembleError, Reading, SensorGroup, SeriesMap, StoreError};
use crate::timezone::{add_days, parse_date, AppTimezone};

/// Readings gathered for one requested day.
struct DayReadings {
    /// From the day's own document.
    own: Vec<Reading>,
    /// From the next day's document, local date equal to the requested day.
    reclaimed: Vec<Reading>,
}

pub struct RangeAssembler<S: ReadingStore> {
    store: S,
    tz: AppTimezone,
    group: SensorGroup,
    root_collection: String,
}

impl<S: ReadingStore> RangeAssembler<S> {
    pub fn new(store: S, tz: AppTimezone, group: SensorGroup, root_collection: &str) -> Self {
        Self {
            store,
            tz,
            group,
            root_collection: root_collection.to_string(),
        }
    }

    pub fn group(&self) -> SensorGroup {
        self.group
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every reading belonging to local date `date_str`, bucketed by kind.
    ///
    /// Fails closed: a store failure yields empty series.
    pub async fn fetch_day(&self, date_str: &str) -> Result<SeriesMap, AssembleError> {
        let date = parse_date(date_str)?;
        let next = add_days(date_str, 1)?;

        let mut map = SeriesMap::empty(self.group);
        match self.collect_day(date, date_str, &next).await {
            Ok(day) => {
                for reading in day.own.into_iter().chain(day.reclaimed) {
                    map.push(reading);
                }
            }
            Err(e) => {
                logging::log_store_failure(date_str, "fetch_day", &e);
                return Ok(SeriesMap::empty(self.group));
            }
        }
        map.sort();
        Ok(map)
    }

    /// Every reading from `start_str` through `end_str` inclusive (local
    /// dates), each series sorted ascending.
    ///
    /// A reading reclaimed by day D is not emitted again from day D+1's own
    /// document. Any store failure empties the whole range.
    pub async fn fetch_range(&self, start_str: &str, end_str: &str) -> Result<SeriesMap, AssembleError> {
        let dates = self.dates_in_range(start_str, end_str)?;
        let context = format!("{}..{}", start_str, end_str);

        let mut map = SeriesMap::empty(self.group);
        let mut previous: Option<NaiveDate> = None;
        for (date, date_str) in &dates {
            let next = add_days(date_str, 1)?;
            let day = match self.collect_day(*date, date_str, &next).await {
                Ok(day) => day,
                Err(e) => {
                    logging::log_store_failure(date_str, "fetch_range", &e);
                    logging::error(
                        Component::Assemble,
                        Some(&context),
                        "range fetch failed; returning empty series",
                    );
                    return Ok(SeriesMap::empty(self.group));
                }
            };

            for reading in day.own {
                if previous.is_some_and(|p| self.tz.local_date_of(reading.timestamp) == p) {
                    continue;
                }
                map.push(reading);
            }
            for reading in day.reclaimed {
                map.push(reading);
            }
            previous = Some(*date);
        }

        map.sort();
        logging::log_fetch_summary(&context, dates.len(), map.total_len());
        Ok(map)
    }

    /// Local dates from start to end inclusive, stepped with `add_days`.
    fn dates_in_range(&self, start_str: &str, end_str: &str) -> Result<Vec<(NaiveDate, String)>, AssembleError> {
        let end = parse_date(end_str)?;
        let mut current = start_str.trim().to_string();
        let mut date = parse_date(&current)?;

        let mut dates = Vec::new();
        while date <= end {
            dates.push((date, current.clone()));
            current = add_days(&current, 1)?;
            date = parse_date(&current)?;
        }
        Ok(dates)
    }

    async fn collect_day(&self, date: NaiveDate, date_str: &str, next_str: &str) -> Result<DayReadings, StoreError> {
        let own_path = CollectionPath::new(&self.root_collection, date_str);
        let next_path = CollectionPath::new(&self.root_collection, next_str);

        let own_records = self.store.list_readings(&own_path).await?;
        let next_records = self.store.list_readings(&next_path).await?;

        let own = self.expand(&own_records, date_str, |_| true);
        let reclaimed = self.expand(&next_records, next_str, |r| self.tz.local_date_of(r.timestamp) == date);

        logging::info(
            Component::Assemble,
            Some(date_str),
            &format!(
                "Found {} records, {} readings reclaimed from {}",
                own_records.len(),
                reclaimed.len(),
                next_str
            ),
        );

        Ok(DayReadings { own, reclaimed })
    }

    /// Expands raw records into readings for this group, keeping those
    /// `keep` accepts. Records with unusable timestamps are skipped.
    fn expand(&self, records: &[RawReading], context: &str, keep: impl Fn(&Reading) -> bool) -> Vec<Reading> {
        let mut readings = Vec::with_capacity(records.len() * self.kinds_per_record());
        for record in records {
            match record.to_readings(self.group.kinds()) {
                Ok(expanded) => readings.extend(expanded.into_iter().filter(|r| keep(r))),
                Err(e) => logging::warn(
                    Component::Assemble,
                    Some(context),
                    &format!("skipping record: {}", e),
                ),
            }
        }
        readings
    }

    fn kinds_per_record(&self) -> usize {
        self.group.kinds().count().max(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
