//! SQLite helper utilities for type conversion
//!
//! SQLite has no native timestamp type, so timestamps are stored as RFC 3339
//! TEXT. This module converts between chrono values and that format.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time formatted for storage
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

/// Format a timestamp for storage
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Parse an optional stored timestamp
pub fn str_to_datetime_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
    s.map(str_to_datetime).transpose()
}

/// Decode an optional TEXT timestamp column from a row
pub(crate) fn get_datetime_opt(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> sqlx::Result<Option<DateTime<Utc>>> {
    use sqlx::Row;

    let raw: Option<String> = row.try_get(column)?;
    str_to_datetime_opt(raw.as_deref()).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode a required TEXT timestamp column from a row
pub(crate) fn get_datetime(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> sqlx::Result<DateTime<Utc>> {
    get_datetime_opt(row, column)?.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: "unexpected NULL timestamp".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_roundtrip() {
        let now = Utc::now();
        let parsed = str_to_datetime(&datetime_to_str(now)).unwrap();
        assert_eq!(now.timestamp_micros(), parsed.timestamp_micros());
    }

    #[test]
    fn test_optional_datetime() {
        assert_eq!(str_to_datetime_opt(None).unwrap(), None);
        assert!(str_to_datetime_opt(Some("not a date")).is_err());
    }
}
