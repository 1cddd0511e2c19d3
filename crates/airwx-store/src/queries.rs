//! Query builder for stored measurement rows.
//!
//! [`RecordQuery`] follows the builder pattern: pick a series, then chain
//! optional date filters, pagination and ordering.
//!
//! # Example
//!
//! ```
//! use airwx_store::{RecordQuery, Store};
//! use airwx_types::Series;
//! use time::macros::date;
//!
//! let store = Store::open_in_memory()?;
//!
//! // January 2021, chronological, real measurements only
//! let query = RecordQuery::new(Series::Weather)
//!     .since(date!(2021 - 01 - 01))
//!     .until(date!(2021 - 01 - 31))
//!     .without_sentinels()
//!     .oldest_first();
//!
//! let rows = store.query_records(&query)?;
//! assert!(rows.is_empty());
//! # Ok::<(), airwx_store::Error>(())
//! ```

use time::Date;

use airwx_types::{CanonicalKey, Series, format_date};

use crate::schema;

/// Fluent query builder for one series table.
///
/// Use this to construct queries for
/// [`Store::query_records`](crate::Store::query_records).
///
/// By default, queries return every row of the series ordered by
/// `timestamp` descending (newest first), sentinel rows included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Series (table) to read.
    pub series: Series,
    /// Include only rows on or after this day.
    pub since: Option<Date>,
    /// Include only rows on or before this day.
    pub until: Option<Date>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Number of results to skip for pagination.
    pub offset: Option<u32>,
    /// Order by timestamp descending (newest first). Default: true.
    pub newest_first: bool,
    /// Include all-null placeholder rows. Default: true.
    pub include_sentinels: bool,
}

impl RecordQuery {
    /// Create a query over a whole series, newest first.
    pub fn new(series: Series) -> Self {
        Self {
            series,
            since: None,
            until: None,
            limit: None,
            offset: None,
            newest_first: true,
            include_sentinels: true,
        }
    }

    /// Filter to rows on or after this day.
    pub fn since(mut self, date: Date) -> Self {
        self.since = Some(date);
        self
    }

    /// Filter to rows on or before this day.
    ///
    /// Use with `since()` to query a specific date range.
    pub fn until(mut self, date: Date) -> Self {
        self.until = Some(date);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    ///
    /// Use with `limit()` for pagination. For example, to get page 2
    /// with 50 items per page: `.limit(50).offset(50)`.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Order results by oldest first (ascending by `timestamp`).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Leave out rows whose measurement columns are all null.
    pub fn without_sentinels(mut self) -> Self {
        self.include_sentinels = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    ///
    /// Keys are stored as `YYYY-MM-DD HH:MM:SS`, so lexical comparison on
    /// the text column is chronological.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(since) = self.since {
            conditions.push("timestamp >= ?".to_string());
            params.push(Box::new(CanonicalKey::midnight(since).to_string()));
        }

        if let Some(until) = self.until {
            match until.next_day() {
                Some(next) => {
                    conditions.push("timestamp < ?".to_string());
                    params.push(Box::new(CanonicalKey::midnight(next).to_string()));
                }
                None => {
                    conditions.push("timestamp <= ?".to_string());
                    params.push(Box::new(format!("{} 23:59:59", format_date(until))));
                }
            }
        }

        if !self.include_sentinels {
            conditions.push(format!("NOT ({})", schema::all_null_condition(self.series)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT {} FROM {} {} ORDER BY timestamp {}",
            schema::select_columns(self.series),
            self.series.table(),
            where_clause,
            order
        );

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            // SQLite only accepts OFFSET after a LIMIT
            if self.limit.is_none() {
                sql.push_str(" LIMIT -1");
            }
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_record_query_new_defaults() {
        let query = RecordQuery::new(Series::AirPollution);
        assert_eq!(query.series, Series::AirPollution);
        assert!(query.since.is_none());
        assert!(query.until.is_none());
        assert!(query.limit.is_none());
        assert!(query.offset.is_none());
        assert!(query.newest_first);
        assert!(query.include_sentinels);
    }

    #[test]
    fn test_record_query_chaining() {
        let query = RecordQuery::new(Series::Weather)
            .since(date!(2021 - 01 - 01))
            .until(date!(2021 - 01 - 31))
            .limit(10)
            .offset(20)
            .oldest_first()
            .without_sentinels();

        assert_eq!(query.since, Some(date!(2021 - 01 - 01)));
        assert_eq!(query.until, Some(date!(2021 - 01 - 31)));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(20));
        assert!(!query.newest_first);
        assert!(!query.include_sentinels);
    }

    #[test]
    fn test_build_where_empty() {
        let (clause, params) = RecordQuery::new(Series::Weather).build_where();
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_where_date_range() {
        let query = RecordQuery::new(Series::Weather)
            .since(date!(2021 - 01 - 01))
            .until(date!(2021 - 01 - 31));
        let (clause, params) = query.build_where();

        assert_eq!(clause, "WHERE timestamp >= ? AND timestamp < ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_build_where_without_sentinels() {
        let query = RecordQuery::new(Series::AirPollution).without_sentinels();
        let (clause, params) = query.build_where();

        assert!(clause.starts_with("WHERE NOT ("));
        assert!(clause.contains("aqi IS NULL"));
        assert!(clause.contains("pm2_5 IS NULL"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_sql_order_and_table() {
        let newest = RecordQuery::new(Series::Weather).build_sql();
        assert!(newest.contains("FROM weather"));
        assert!(newest.contains("ORDER BY timestamp DESC"));

        let oldest = RecordQuery::new(Series::AirPollution)
            .oldest_first()
            .build_sql();
        assert!(oldest.contains("FROM air_pollution"));
        assert!(oldest.contains("ORDER BY timestamp ASC"));
    }

    #[test]
    fn test_build_sql_pagination() {
        let sql = RecordQuery::new(Series::Weather)
            .limit(50)
            .offset(100)
            .build_sql();
        assert!(sql.ends_with("LIMIT 50 OFFSET 100"));

        let offset_only = RecordQuery::new(Series::Weather).offset(5).build_sql();
        assert!(offset_only.ends_with("LIMIT -1 OFFSET 5"));
    }
}
