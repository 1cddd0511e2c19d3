//! Fetch window arithmetic.

use time::{Date, Duration};

use airwx_types::FetchWindow;

/// Default number of days requested per run.
pub const DEFAULT_BATCH_DAYS: u32 = 25;

/// The window to fetch next: `[cursor, cursor + batch_days)`.
///
/// There is no upper bound against today; future days are requested and the
/// provider is expected to return nothing for them.
///
/// # Example
///
/// ```
/// use airwx_core::next_window;
/// use time::macros::date;
///
/// let window = next_window(date!(2021 - 01 - 01), 25);
/// assert_eq!(window.start, date!(2021 - 01 - 01));
/// assert_eq!(window.end, date!(2021 - 01 - 26));
/// ```
#[must_use]
pub fn next_window(cursor: Date, batch_days: u32) -> FetchWindow {
    FetchWindow::new(cursor, advance_cursor(cursor, batch_days))
}

/// The cursor after a successful run over a whole batch.
#[must_use]
pub fn advance_cursor(cursor: Date, batch_days: u32) -> Date {
    cursor.saturating_add(Duration::days(i64::from(batch_days)))
}
