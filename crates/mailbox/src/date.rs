use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

fn trailing_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("valid trailing comment regex"))
}

/// A message date after best-effort parsing.
///
/// Unparsable input becomes the sentinel, which orders and measures as the
/// Unix epoch. Parsing never fails. The sentinel is not equal to a parsed
/// epoch date and sorts immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventDate {
    parsed: Option<DateTime<Utc>>,
}

impl EventDate {
    pub const SENTINEL: EventDate = EventDate { parsed: None };

    pub fn parse(raw: &str) -> Self {
        Self {
            parsed: parse_datetime(raw),
        }
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            parsed: Some(value),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.parsed.is_none()
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.parsed
    }

    /// Milliseconds since the epoch; zero for the sentinel
    pub fn timestamp_millis(&self) -> i64 {
        self.parsed.map(|dt| dt.timestamp_millis()).unwrap_or(0)
    }

    /// Signed days elapsed from `earlier` to `self`
    pub fn days_since(&self, earlier: &EventDate) -> f64 {
        (self.timestamp_millis() - earlier.timestamp_millis()) as f64 / MILLIS_PER_DAY
    }
}

impl Ord for EventDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp_millis()
            .cmp(&other.timestamp_millis())
            .then_with(|| self.parsed.cmp(&other.parsed))
    }
}

impl PartialOrd for EventDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse RFC 2822, RFC 3339 and common ISO-like layouts into UTC
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let uncommented = trailing_comment_re().replace(trimmed, "");
    if uncommented != trimmed {
        if let Ok(dt) = DateTime::parse_from_rfc2822(uncommented.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    log::debug!("Unparsable date {trimmed:?}; using epoch sentinel");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc2822_with_comment() {
        let parsed = parse_datetime("Tue, 2 Jan 2024 10:00:00 +0000 (UTC)").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_iso_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-05T08:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-03-05 08:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-05T10:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_datetime("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparsable_is_sentinel_at_epoch() {
        let date = EventDate::parse("sometime last week");
        assert!(date.is_sentinel());
        assert_eq!(date.timestamp_millis(), 0);
        assert!(date < EventDate::parse("1999-01-01"));
    }

    #[test]
    fn days_since_is_signed() {
        let a = EventDate::parse("2024-01-01");
        let b = EventDate::parse("2024-01-04T12:00:00Z");
        assert_eq!(b.days_since(&a), 3.5);
        assert_eq!(a.days_since(&b), -3.5);
    }

    #[test]
    fn sentinel_and_real_epoch_order_consistently_with_eq() {
        let sentinel = EventDate::SENTINEL;
        let epoch = EventDate::parse("1970-01-01T00:00:00Z");
        assert!(!epoch.is_sentinel());
        assert_eq!(sentinel.timestamp_millis(), epoch.timestamp_millis());

        assert_ne!(sentinel, epoch);
        assert_eq!(sentinel.cmp(&epoch), Ordering::Less);
        assert_eq!(epoch.cmp(&sentinel), Ordering::Greater);
        assert_eq!(sentinel.cmp(&EventDate::parse("junk")), Ordering::Equal);
        assert_eq!(sentinel.days_since(&epoch), 0.0);

        let fine = EventDate::from_datetime(Utc.timestamp_opt(5, 100).unwrap());
        let coarse = EventDate::from_datetime(Utc.timestamp_opt(5, 0).unwrap());
        assert_ne!(fine, coarse);
        assert_eq!(fine.cmp(&coarse), Ordering::Greater);
    }
}
