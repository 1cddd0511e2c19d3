//! The ingestion loop.
//!
//! One run resolves the cursor, computes the fetch window, and walks the
//! window chunk by chunk: fetch, canonicalize, dedup, fill gaps with
//! sentinels, upsert. All writes of a run go through one store batch. The
//! cursor is advanced only when the whole window has been processed and the
//! batch commits.
//!
//! # Example
//!
//! ```
//! use airwx_core::{IngestOptions, Ingestor, MockProvider};
//! use airwx_store::Store;
//! use airwx_types::Series;
//! use std::time::Duration;
//!
//! let mut store = Store::open_in_memory()?;
//! let provider = MockProvider::builder(Series::AirPollution).build();
//! let ingestor = Ingestor::new(
//!     IngestOptions::for_series(Series::AirPollution).request_delay(Duration::ZERO),
//! );
//!
//! // No data at all: every day gets a sentinel
//! let report = ingestor.run(&mut store, &provider)?;
//! assert_eq!(report.stats.sentinels, 25);
//! assert_eq!(report.next_cursor.to_string(), "2021-01-26");
//! # Ok::<(), airwx_core::Error>(())
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info, warn};

use airwx_store::Store;
use airwx_types::{
    CanonicalKey, Coordinates, FetchWindow, Granularity, MeasurementRecord, Series, UpsertOutcome,
    format_date,
};

use crate::cursor::{CursorSource, DEFAULT_EPOCH, resolve_cursor, write_state_file};
use crate::error::{Error, Result};
use crate::traits::{Provider, RecordSink};
use crate::window::{DEFAULT_BATCH_DAYS, advance_cursor, next_window};

/// Default pause between two provider calls.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Options for an ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Days per run.
    pub batch_days: u32,
    /// Days per provider call.
    pub chunk_days: u32,
    /// Canonicalization policy.
    pub granularity: Granularity,
    /// Pause between provider calls.
    pub request_delay: Duration,
    /// Where the resume cursor is kept.
    pub cursor: CursorSource,
    /// Start date when no cursor exists.
    pub epoch: Date,
    /// Location stored with air-pollution rows.
    pub location: Option<Coordinates>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_days: DEFAULT_BATCH_DAYS,
            chunk_days: 1,
            granularity: Granularity::DailyNoon,
            request_delay: DEFAULT_REQUEST_DELAY,
            cursor: CursorSource::Table,
            epoch: DEFAULT_EPOCH,
            location: None,
        }
    }
}

impl IngestOptions {
    /// Defaults suited to a series.
    ///
    /// Air pollution is requested one day per call; weather in a single call
    /// per window.
    pub fn for_series(series: Series) -> Self {
        let defaults = Self::default();
        match series {
            Series::AirPollution => defaults,
            Series::Weather => Self {
                chunk_days: defaults.batch_days,
                ..defaults
            },
        }
    }

    /// Set the number of days per run.
    #[must_use]
    pub fn batch_days(mut self, days: u32) -> Self {
        self.batch_days = days;
        self
    }

    /// Set the number of days per provider call.
    #[must_use]
    pub fn chunk_days(mut self, days: u32) -> Self {
        self.chunk_days = days;
        self
    }

    /// Set the canonicalization policy.
    #[must_use]
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the pause between provider calls.
    #[must_use]
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set where the resume cursor is kept.
    #[must_use]
    pub fn cursor(mut self, cursor: CursorSource) -> Self {
        self.cursor = cursor;
        self
    }

    /// Set the start date used when no cursor exists.
    #[must_use]
    pub fn epoch(mut self, epoch: Date) -> Self {
        self.epoch = epoch;
        self
    }

    /// Set the location stored with air-pollution rows.
    #[must_use]
    pub fn location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    /// Check the options before a run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_days == 0 {
            return Err(Error::InvalidConfig("batch_days must be at least 1".into()));
        }
        if self.chunk_days == 0 {
            return Err(Error::InvalidConfig("chunk_days must be at least 1".into()));
        }
        // A max-stored cursor only advances if every day of the window is stored
        if self.cursor == CursorSource::MaxStored && !self.granularity.fills_gaps() {
            return Err(Error::InvalidConfig(format!(
                "max-stored cursor requires {} granularity, not {}",
                Granularity::DailyNoon,
                self.granularity
            )));
        }
        Ok(())
    }
}

/// Counters collected while processing a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Provider calls made.
    pub requests: usize,
    /// Provider calls that failed and were treated as empty.
    pub failed_requests: usize,
    /// New rows with measurements.
    pub inserted: usize,
    /// New all-null placeholder rows.
    pub sentinels: usize,
    /// Writes that found the key already present, in the window or the store.
    pub skipped: usize,
    /// Samples that are not the representative sample of their day.
    pub ignored: usize,
    /// Samples whose timestamp could not be parsed.
    pub dropped: usize,
}

impl IngestStats {
    fn record(&mut self, outcome: UpsertOutcome, sentinel: bool) {
        match (outcome, sentinel) {
            (UpsertOutcome::Inserted, false) => self.inserted += 1,
            (UpsertOutcome::Inserted, true) => self.sentinels += 1,
            (UpsertOutcome::Skipped, _) => self.skipped += 1,
        }
    }

    /// Rows written by the run.
    pub fn written(&self) -> usize {
        self.inserted + self.sentinels
    }
}

/// Outcome of a committed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Series ingested.
    pub series: Series,
    /// Window processed.
    pub window: FetchWindow,
    /// Cursor the next run will start from.
    pub next_cursor: Date,
    /// Counters.
    pub stats: IngestStats,
}

/// Drives ingestion runs with fixed options.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    options: IngestOptions,
}

impl Ingestor {
    /// Create an ingestor.
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// The window the next run of `series` would process.
    pub fn plan(&self, store: &Store, series: Series) -> FetchWindow {
        let cursor = resolve_cursor(&self.options.cursor, store, series, self.options.epoch);
        next_window(cursor, self.options.batch_days)
    }

    /// Run one complete ingestion cycle for the provider's series.
    ///
    /// Provider failures are logged and the affected chunk is treated as
    /// empty. A store failure aborts the run: the batch is rolled back and
    /// the cursor is left where it was.
    pub fn run<P: Provider + ?Sized>(&self, store: &mut Store, provider: &P) -> Result<RunReport> {
        self.options.validate()?;

        let series = provider.series();
        let window = self.plan(store, series);
        let mut next_cursor = advance_cursor(window.start, self.options.batch_days);

        info!(
            "Ingesting {} from {} for window {}",
            series,
            provider.name(),
            window
        );

        let mut batch = store.begin_batch(series, self.options.location)?;
        let stats = self.run_window(&mut batch, provider, &window)?;
        if self.options.cursor == CursorSource::Table {
            batch.set_cursor(next_cursor)?;
        }
        batch.commit()?;

        match &self.options.cursor {
            CursorSource::StateFile(path) => write_state_file(path, next_cursor)?,
            CursorSource::MaxStored => {
                next_cursor =
                    resolve_cursor(&self.options.cursor, store, series, self.options.epoch);
            }
            CursorSource::Table => {}
        }

        info!(
            "Finished {} window {}: {} inserted, {} sentinels, {} skipped, {} dropped; next cursor {}",
            series,
            window,
            stats.inserted,
            stats.sentinels,
            stats.skipped,
            stats.dropped,
            format_date(next_cursor)
        );

        Ok(RunReport {
            series,
            window,
            next_cursor,
            stats,
        })
    }

    /// Process one window into a sink without touching the cursor.
    pub fn run_window<P, S>(
        &self,
        sink: &mut S,
        provider: &P,
        window: &FetchWindow,
    ) -> Result<IngestStats>
    where
        P: Provider + ?Sized,
        S: RecordSink + ?Sized,
    {
        let series = provider.series();
        let granularity = self.options.granularity;
        let mut seen: HashSet<CanonicalKey> = HashSet::new();
        let mut stats = IngestStats::default();

        for (i, chunk) in window.chunks(self.options.chunk_days).iter().enumerate() {
            if i > 0 && !self.options.request_delay.is_zero() {
                std::thread::sleep(self.options.request_delay);
            }

            debug!("Fetching {} chunk {}", series, chunk);
            stats.requests += 1;
            let samples = match provider.fetch(chunk) {
                Ok(samples) => samples,
                Err(e) if e.is_provider_failure() => {
                    warn!("No data for {} {}: {}", series, chunk, e);
                    stats.failed_requests += 1;
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            for sample in samples {
                let key = match granularity.canonicalize_raw(&sample.timestamp) {
                    Ok(Some(key)) => key,
                    Ok(None) => {
                        stats.ignored += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!("Dropping {} sample: {}", series, e);
                        stats.dropped += 1;
                        continue;
                    }
                };

                if !seen.insert(key) {
                    debug!("Skipping duplicate {} sample for {}", series, key);
                    stats.skipped += 1;
                    continue;
                }

                let record = MeasurementRecord::new(key, sample.fields);
                let sentinel = record.is_sentinel();
                stats.record(sink.upsert(&record)?, sentinel);
            }

            if granularity.fills_gaps() {
                for date in chunk.dates() {
                    let key = granularity.sentinel_key(date);
                    if seen.insert(key) {
                        debug!("No {} sample for {}, storing placeholder", series, key);
                        let outcome = sink.upsert(&MeasurementRecord::sentinel(series, key))?;
                        stats.record(outcome, true);
                    }
                }
            }
        }

        Ok(stats)
    }
}
