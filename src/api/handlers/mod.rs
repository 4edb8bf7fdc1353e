//! Route handlers, one module per endpoint family.

pub mod admin;
pub mod health;
pub mod objects;
pub mod orders;
pub mod shift_detail;
pub mod shift_records;
pub mod trips;
pub mod zone_events;

use chrono::NaiveDate;

use super::envelope::ApiError;

/// Parse a `YYYY-MM-DD` query date. Anything else is a 400.
pub(crate) fn parse_iso_date(name: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{name} must be YYYY-MM-DD, got '{value}'")))
}

/// Coerce a textual decimal from the store into a float.
///
/// The store returns numeric columns as text; all reads convert at this
/// boundary.
pub(crate) fn decimal(value: &str) -> f64 {
    value.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates_only() {
        assert!(parse_iso_date("dateFrom", "2024-06-05").is_ok());
        assert!(parse_iso_date("dateFrom", "05.06.2024").is_err());
        assert!(parse_iso_date("dateFrom", "").is_err());
    }

    #[test]
    fn textual_decimals_coerce() {
        assert_eq!(decimal("8.33"), 8.33);
        assert_eq!(decimal("0"), 0.0);
        assert_eq!(decimal("garbage"), 0.0);
    }
}
