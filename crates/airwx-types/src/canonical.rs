//! Canonical timestamp keys and the policies that produce them.
//!
//! Every record is stored under a [`CanonicalKey`]: a UTC date and time with
//! second precision, rendered as `YYYY-MM-DD HH:MM:SS`. The key is the
//! uniqueness boundary of a series, so provider timestamps are always
//! canonicalized before they are compared with each other or with stored rows.
//!
//! # Example
//!
//! ```
//! use airwx_types::{Granularity, RawTimestamp};
//!
//! // 2021-01-01 12:00:00 UTC
//! let noon = RawTimestamp::Epoch(1_609_502_400);
//! let key = Granularity::DailyNoon.canonicalize_raw(&noon).unwrap().unwrap();
//! assert_eq!(key.to_string(), "2021-01-01 12:00:00");
//!
//! // 2021-01-01 13:00:00 UTC is not the day's representative sample
//! let afternoon = RawTimestamp::Epoch(1_609_506_000);
//! assert_eq!(Granularity::DailyNoon.canonicalize_raw(&afternoon).unwrap(), None);
//! ```

use core::fmt;
use core::str::FromStr;

use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseError, ParseResult};
use crate::record::RawTimestamp;

/// UTC hour whose sample represents a whole day under [`Granularity::DailyNoon`].
pub const CANONICAL_HOUR: u8 = 12;

/// Normalized UTC timestamp used as the uniqueness key of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalKey(PrimitiveDateTime);

impl CanonicalKey {
    /// Build a key from an instant, converting to UTC and dropping sub-seconds.
    #[must_use]
    pub fn from_instant(instant: OffsetDateTime) -> Self {
        let utc = instant.to_offset(UtcOffset::UTC);
        let truncated = utc.replace_nanosecond(0).unwrap_or(utc);
        Self(PrimitiveDateTime::new(truncated.date(), truncated.time()))
    }

    /// The key of a day's representative noon sample.
    #[must_use]
    pub fn noon(date: Date) -> Self {
        Self(PrimitiveDateTime::new(date, time!(12:00)))
    }

    /// The key at midnight of a day.
    #[must_use]
    pub fn midnight(date: Date) -> Self {
        Self(date.midnight())
    }

    /// Calendar date of the key.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.date()
    }

    /// UTC hour of the key.
    #[must_use]
    pub fn hour(&self) -> u8 {
        self.0.hour()
    }

    /// The key as a UTC instant.
    #[must_use]
    pub fn to_instant(&self) -> OffsetDateTime {
        self.0.assume_utc()
    }

    /// Parse a stored key (`YYYY-MM-DD HH:MM:SS`).
    ///
    /// The ISO form with a `T` separator and a bare `YYYY-MM-DD` (midnight)
    /// are accepted too, so keys written by older tools compare equal.
    pub fn parse(s: &str) -> ParseResult<Self> {
        match parse_text(s)? {
            TextTimestamp::DateTime(dt) => Ok(Self(dt)),
            TextTimestamp::Date(date) => Ok(Self::midnight(date)),
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            format_date(self.0.date()),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl FromStr for CanonicalKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for CanonicalKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for CanonicalKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Canonicalization policy of a series.
///
/// - `Full` keeps the full UTC date and time of every sample.
/// - `DailyNoon` keeps one representative sample per day: the one whose UTC
///   hour equals [`CANONICAL_HOUR`]. Its key is truncated to that day's noon,
///   so two samples inside the noon hour collide and only the first survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Granularity {
    /// Keep full date+time granularity.
    Full,
    /// Keep the noon sample of each day.
    #[default]
    DailyNoon,
}

impl Granularity {
    /// Canonicalize a UTC instant.
    ///
    /// Returns `None` when the instant is not the representative sample under
    /// this policy.
    #[must_use]
    pub fn canonicalize(self, instant: OffsetDateTime) -> Option<CanonicalKey> {
        let key = CanonicalKey::from_instant(instant);
        match self {
            Granularity::Full => Some(key),
            Granularity::DailyNoon if key.hour() == CANONICAL_HOUR => {
                Some(CanonicalKey::noon(key.date()))
            }
            Granularity::DailyNoon => None,
        }
    }

    /// Canonicalize a UNIX timestamp in seconds.
    pub fn canonicalize_epoch(self, seconds: i64) -> ParseResult<Option<CanonicalKey>> {
        let instant = OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|_| ParseError::EpochOutOfRange(seconds))?;
        Ok(self.canonicalize(instant))
    }

    /// Canonicalize a raw provider timestamp.
    ///
    /// A date without a time of day is a daily aggregate. It maps to midnight
    /// under `Full` and to the day's noon key under `DailyNoon`.
    pub fn canonicalize_raw(self, raw: &RawTimestamp) -> ParseResult<Option<CanonicalKey>> {
        match raw {
            RawTimestamp::Epoch(seconds) => self.canonicalize_epoch(*seconds),
            RawTimestamp::Text(text) => match parse_text(text)? {
                TextTimestamp::DateTime(dt) => Ok(self.canonicalize(dt.assume_utc())),
                TextTimestamp::Date(date) => Ok(Some(match self {
                    Granularity::Full => CanonicalKey::midnight(date),
                    Granularity::DailyNoon => CanonicalKey::noon(date),
                })),
            },
        }
    }

    /// Whether days without a representative sample get a sentinel record.
    #[must_use]
    pub fn fills_gaps(self) -> bool {
        matches!(self, Granularity::DailyNoon)
    }

    /// The key a sentinel record for `date` is stored under.
    #[must_use]
    pub fn sentinel_key(self, date: Date) -> CanonicalKey {
        match self {
            Granularity::Full => CanonicalKey::midnight(date),
            Granularity::DailyNoon => CanonicalKey::noon(date),
        }
    }

    /// Name used in configuration files and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Full => "full",
            Granularity::DailyNoon => "daily-noon",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Granularity::Full),
            "daily-noon" | "daily_noon" | "noon" => Ok(Granularity::DailyNoon),
            other => Err(ParseError::UnknownGranularity(other.to_string())),
        }
    }
}

enum TextTimestamp {
    DateTime(PrimitiveDateTime),
    Date(Date),
}

fn parse_text(s: &str) -> ParseResult<TextTimestamp> {
    let s = s.trim();
    if s.len() == 10 {
        return parse_date(s).map(TextTimestamp::Date);
    }

    let parsed = if s.contains('T') {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        )
    } else {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    };

    parsed
        .map(TextTimestamp::DateTime)
        .map_err(|_| ParseError::InvalidTimestamp(s.to_string()))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> ParseResult<Date> {
    let s = s.trim();
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ParseError::InvalidDate(s.to_string()))
}

/// Format a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_key_display_format() {
        let key = CanonicalKey::from_instant(datetime!(2021-03-04 05:06:07.891 UTC));
        assert_eq!(key.to_string(), "2021-03-04 05:06:07");
    }

    #[test]
    fn test_key_converts_offset_to_utc() {
        let key = CanonicalKey::from_instant(datetime!(2021-01-01 07:00:00 -05:00));
        assert_eq!(key.to_string(), "2021-01-01 12:00:00");
    }

    #[test]
    fn test_key_parse_accepts_legacy_forms() {
        let canonical = CanonicalKey::parse("2021-01-01 12:00:00").unwrap();
        let iso = CanonicalKey::parse("2021-01-01T12:00:00").unwrap();
        assert_eq!(canonical, iso);

        let date_only = CanonicalKey::parse("2021-01-01").unwrap();
        assert_eq!(date_only.to_string(), "2021-01-01 00:00:00");
    }

    #[test]
    fn test_key_parse_rejects_garbage() {
        assert!(matches!(
            CanonicalKey::parse("yesterday"),
            Err(ParseError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            CanonicalKey::parse("2021-13-01"),
            Err(ParseError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_full_keeps_time_of_day() {
        let key = Granularity::Full
            .canonicalize(datetime!(2021-01-01 03:15:00 UTC))
            .unwrap();
        assert_eq!(key.to_string(), "2021-01-01 03:15:00");
    }

    #[test]
    fn test_daily_noon_truncates_within_noon_hour() {
        let a = Granularity::DailyNoon
            .canonicalize(datetime!(2021-01-01 12:00:00 UTC))
            .unwrap();
        let b = Granularity::DailyNoon
            .canonicalize(datetime!(2021-01-01 12:45:10 UTC))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, CanonicalKey::noon(date!(2021 - 01 - 01)));
    }

    #[test]
    fn test_daily_noon_rejects_other_hours() {
        for hour in [0u8, 11, 13, 23] {
            let instant = date!(2021 - 01 - 01)
                .with_hms(hour, 0, 0)
                .unwrap()
                .assume_utc();
            assert_eq!(Granularity::DailyNoon.canonicalize(instant), None);
        }
    }

    #[test]
    fn test_canonicalize_epoch() {
        // 2021-01-01 12:00:00 UTC
        let key = Granularity::DailyNoon
            .canonicalize_epoch(1_609_502_400)
            .unwrap()
            .unwrap();
        assert_eq!(key.to_string(), "2021-01-01 12:00:00");
    }

    #[test]
    fn test_canonicalize_epoch_out_of_range() {
        let err = Granularity::Full.canonicalize_epoch(i64::MAX).unwrap_err();
        assert_eq!(err, ParseError::EpochOutOfRange(i64::MAX));
    }

    #[test]
    fn test_date_only_text_is_daily_representative() {
        let raw = RawTimestamp::Text("2021-02-03".to_string());
        let noon = Granularity::DailyNoon.canonicalize_raw(&raw).unwrap();
        assert_eq!(noon.unwrap().to_string(), "2021-02-03 12:00:00");

        let full = Granularity::Full.canonicalize_raw(&raw).unwrap();
        assert_eq!(full.unwrap().to_string(), "2021-02-03 00:00:00");
    }

    #[test]
    fn test_text_and_epoch_forms_agree() {
        let text = RawTimestamp::Text("2021-01-01 12:00:00".to_string());
        let epoch = RawTimestamp::Epoch(1_609_502_400);
        assert_eq!(
            Granularity::DailyNoon.canonicalize_raw(&text).unwrap(),
            Granularity::DailyNoon.canonicalize_raw(&epoch).unwrap()
        );
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("full".parse::<Granularity>().unwrap(), Granularity::Full);
        assert_eq!(
            "Daily-Noon".parse::<Granularity>().unwrap(),
            Granularity::DailyNoon
        );
        assert!("hourly".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_sentinel_key() {
        let day = date!(2021 - 01 - 05);
        assert_eq!(
            Granularity::DailyNoon.sentinel_key(day).to_string(),
            "2021-01-05 12:00:00"
        );
        assert!(Granularity::DailyNoon.fills_gaps());
        assert!(!Granularity::Full.fills_gaps());
    }

    #[test]
    fn test_format_and_parse_date() {
        let day = date!(2021 - 01 - 26);
        assert_eq!(format_date(day), "2021-01-26");
        assert_eq!(parse_date(" 2021-01-26\n").unwrap(), day);
    }

    #[test]
    fn test_key_serde_as_string() {
        let key = CanonicalKey::noon(date!(2021 - 01 - 01));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2021-01-01 12:00:00\"");
        let back: CanonicalKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
