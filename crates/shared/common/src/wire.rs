//! Parsing of the string-encoded fields carried in gRPC messages.
//!
//! Identifiers travel as UUID strings, timestamps as RFC 3339, dates as
//! `YYYY-MM-DD`. Empty strings stand for "absent" on optional fields.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Parse a required UUID field.
pub fn parse_uuid(field: &str, value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::validation(format!("Invalid UUID format for {}", field)))
}

/// Parse an optional UUID field.
pub fn parse_opt_uuid(field: &str, value: Option<&str>) -> AppResult<Option<Uuid>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_uuid(field, v).map(Some),
        None => Ok(None),
    }
}

/// Parse a required RFC 3339 timestamp.
pub fn parse_timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::validation(format!("{} must be an RFC 3339 timestamp", field)))
}

/// Parse an optional RFC 3339 timestamp.
pub fn parse_opt_timestamp(field: &str, value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_timestamp(field, v).map(Some),
        None => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("{} must be a YYYY-MM-DD date", field)))
}

/// Format a date for the wire.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid("id", &id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_uuid("id", "nope"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_optional_fields_treat_empty_as_absent() {
        assert_eq!(parse_opt_uuid("subject_id", Some("")).unwrap(), None);
        assert_eq!(parse_opt_uuid("subject_id", None).unwrap(), None);
        assert_eq!(parse_opt_timestamp("due_at", Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let parsed = parse_timestamp("created_at", &now.to_rfc3339()).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(format_date(date), "2024-09-02");
        assert_eq!(parse_date("start_date", "2024-09-02").unwrap(), date);
        assert!(parse_date("start_date", "09/02/2024").is_err());
    }
}
