//! External date format codec
//!
//! The fleet service speaks `DD.MM.YYYY`, `DD.MM.YYYY HH:mm` and
//! `DD.MM.YYYY HH:mm:ss`, always as wall-clock times in the operational
//! timezone. Storage is UTC throughout; conversion happens here and only
//! here.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Bidirectional converter between external datetime strings and UTC instants.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeCodec {
    tz: Tz,
}

impl DateTimeCodec {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Parse an external datetime string into a UTC instant.
    ///
    /// Accepts all three external layouts; a date-only value is taken as
    /// midnight. Returns `None` on anything else; the caller decides whether
    /// that is fatal.
    pub fn parse_instant(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        let naive = NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%d.%m.%Y")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        self.resolve_local(naive)
    }

    /// Format a calendar date for date-only command parameters.
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format("%d.%m.%Y").to_string()
    }

    /// Format an instant for datetime command parameters, minute precision.
    pub fn format_datetime(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.tz).format("%d.%m.%Y %H:%M").to_string()
    }

    fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Yekaterinburg;

    fn codec() -> DateTimeCodec {
        DateTimeCodec::new(Yekaterinburg)
    }

    #[test]
    fn parses_all_three_layouts() {
        let c = codec();
        let midnight = c.parse_instant("05.06.2024").unwrap();
        let minute = c.parse_instant("05.06.2024 08:15").unwrap();
        let second = c.parse_instant("05.06.2024 08:15:30").unwrap();

        let expected = Yekaterinburg
            .with_ymd_and_hms(2024, 6, 5, 8, 15, 30)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(second, expected);
        assert_eq!(minute, expected - chrono::Duration::seconds(30));
        assert_eq!(
            midnight,
            Yekaterinburg
                .with_ymd_and_hms(2024, 6, 5, 0, 0, 0)
                .single()
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn garbage_is_not_an_instant() {
        let c = codec();
        assert!(c.parse_instant("").is_none());
        assert!(c.parse_instant("2024-06-05").is_none());
        assert!(c.parse_instant("32.13.2024 99:99").is_none());
    }

    #[test]
    fn format_parse_round_trip() {
        let c = codec();
        let t = Yekaterinburg
            .with_ymd_and_hms(2024, 12, 31, 23, 45, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(c.format_datetime(t), "31.12.2024 23:45");
        assert_eq!(c.parse_instant(&c.format_datetime(t)), Some(t));

        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(c.format_date(d), "02.01.2024");
    }
}
