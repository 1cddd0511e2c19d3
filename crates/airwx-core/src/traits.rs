//! Trait abstractions at the edges of the ingestion loop.
//!
//! [`Provider`] hides the remote API that produces samples and [`RecordSink`]
//! hides where canonical records end up. The loop in [`crate::ingest`] only
//! talks to these two traits, so it runs unchanged against the mock provider
//! and any sink.

use airwx_types::{FetchWindow, MeasurementRecord, RawSample, Series, UpsertOutcome};

use crate::error::Result;

/// A remote source of samples for one series.
///
/// # Example
///
/// ```
/// use airwx_core::{MockProvider, Provider};
/// use airwx_types::{FetchWindow, Series};
/// use time::macros::date;
///
/// let provider = MockProvider::builder(Series::Weather).build();
/// let window = FetchWindow::new(date!(2021 - 01 - 01), date!(2021 - 01 - 02));
/// assert!(provider.fetch(&window).unwrap().is_empty());
/// ```
pub trait Provider {
    /// Human-readable provider name for logs.
    fn name(&self) -> &str;

    /// Series the provider's samples belong to.
    fn series(&self) -> Series;

    /// Fetch every sample the provider has for `window`.
    ///
    /// Samples are returned in provider response order.
    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>>;
}

/// Destination of canonical records.
pub trait RecordSink {
    /// Write a record unless its canonical key is already present.
    fn upsert(&mut self, record: &MeasurementRecord) -> Result<UpsertOutcome>;
}

impl RecordSink for airwx_store::Batch<'_> {
    fn upsert(&mut self, record: &MeasurementRecord) -> Result<UpsertOutcome> {
        Ok(airwx_store::Batch::upsert(self, record)?)
    }
}

impl<P: Provider + ?Sized> Provider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn series(&self) -> Series {
        (**self).series()
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>> {
        (**self).fetch(window)
    }
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn series(&self) -> Series {
        (**self).series()
    }

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<RawSample>> {
        (**self).fetch(window)
    }
}
