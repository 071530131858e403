use chrono::{NaiveDate, NaiveDateTime};

/// The only layout accepted when bucketing releases by year.
pub const STRICT_DATE_FORMAT: &str = "%d-%m-%y";

/// Human-readable form of [`STRICT_DATE_FORMAT`] for error messages.
pub const STRICT_DATE_LABEL: &str = "DD-MM-YY";

// Two-digit years must be tried before four-digit ones: `%Y` happily reads
// "20" as the year 20.
const DAY_FIRST_DATES: &[&str] = &[
    "%d-%m-%y",
    "%d/%m/%y",
    "%d.%m.%y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DAY_FIRST_DATETIMES: &[&str] = &[
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Lenient day-first parse used by the typed loader. Returns `None` when no
/// known layout matches; callers turn that into `NaT`.
pub fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DAY_FIRST_DATES
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DAY_FIRST_DATETIMES
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Strict `DD-MM-YY` parse used for yearly bucketing.
pub fn parse_strict(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), STRICT_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_first_prefers_day_before_month() {
        assert_eq!(parse_day_first("03-04-2021"), Some(ymd(2021, 4, 3)));
        assert_eq!(parse_day_first("03/04/21"), Some(ymd(2021, 4, 3)));
        assert_eq!(parse_day_first("15.06.2022"), Some(ymd(2022, 6, 15)));
    }

    #[test]
    fn day_first_accepts_iso_and_spelled_months() {
        assert_eq!(parse_day_first("2023-01-31"), Some(ymd(2023, 1, 31)));
        assert_eq!(parse_day_first("2023-01-31 10:00:00"), Some(ymd(2023, 1, 31)));
        assert_eq!(parse_day_first("5 March 2020"), Some(ymd(2020, 3, 5)));
        assert_eq!(parse_day_first("Sep 9, 2019"), Some(ymd(2019, 9, 9)));
    }

    #[test]
    fn day_first_rejects_garbage() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("soon"), None);
        assert_eq!(parse_day_first("31-02-2020"), None);
    }

    #[test]
    fn strict_only_accepts_two_digit_years() {
        assert_eq!(parse_strict("15-06-21"), Some(ymd(2021, 6, 15)));
        assert_eq!(parse_strict("2021-06-15"), None);
        assert_eq!(parse_strict("15-06-2021"), None);
        assert_eq!(parse_strict("15/06/21"), None);
    }
}
