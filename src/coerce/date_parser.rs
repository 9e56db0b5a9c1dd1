use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// `A<sep>B<sep>C[ time]` where every date component is numeric.
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,4})([./-])(\d{1,2})([./-])(\d{1,4})(?:[ T](.+))?$")
        .expect("numeric date pattern")
});

/// Zoned layouts that RFC 3339 parsing does not cover.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y/%m/%d %H:%M:%S%.f %z",
];

const NAMED_MONTH_DATETIMES: &[&str] = &[
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
];

const NAMED_MONTH_DATES: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// Both day-first and month-first readings of the input are valid.
    #[error("day and month order is ambiguous")]
    AmbiguousDayMonth,
    #[error("date components out of range")]
    OutOfRange,
    #[error("unrecognized date layout")]
    Unrecognized,
}

/// Permissive multi-layout parse that refuses to guess.
///
/// Recognizes ISO/RFC 3339, RFC 2822, `YYYY<sep>MM<sep>DD`,
/// `D<sep>M<sep>YYYY` / `M<sep>D<sep>YYYY` (only when the numbers decide the
/// order), month names, and all-digit stamps (`YYYYMMDD`,
/// `YYYYMMDDhhmmss`, epoch seconds, epoch millis). Values without a zone are
/// taken as UTC.
pub fn parse_strict(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DateParseError::Unrecognized);
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_digits(s);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    if let Some(caps) = NUMERIC_DATE.captures(s) {
        return parse_numeric(&caps);
    }

    for fmt in NAMED_MONTH_DATETIMES {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    for fmt in NAMED_MONTH_DATES {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc());
        }
    }

    Err(DateParseError::Unrecognized)
}

fn parse_digits(s: &str) -> Result<DateTime<Utc>, DateParseError> {
    match s.len() {
        8 => NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .map_err(|_| DateParseError::OutOfRange),
        14 => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
            .map(|n| n.and_utc())
            .map_err(|_| DateParseError::OutOfRange),
        10 => {
            let secs: i64 = s.parse().map_err(|_| DateParseError::OutOfRange)?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or(DateParseError::OutOfRange)
        }
        13 => {
            let millis: i64 = s.parse().map_err(|_| DateParseError::OutOfRange)?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or(DateParseError::OutOfRange)
        }
        _ => Err(DateParseError::Unrecognized),
    }
}

fn parse_numeric(caps: &Captures<'_>) -> Result<DateTime<Utc>, DateParseError> {
    if caps[2] != caps[4] {
        return Err(DateParseError::Unrecognized);
    }
    let (a, b, c) = (&caps[1], &caps[3], &caps[5]);
    let num = |v: &str| v.parse::<u32>().map_err(|_| DateParseError::OutOfRange);

    let (year, month, day) = if a.len() == 4 && c.len() <= 2 {
        (num(a)?, num(b)?, num(c)?)
    } else if c.len() == 4 && a.len() <= 2 {
        let (first, second) = (num(a)?, num(b)?);
        match (first <= 12, second <= 12) {
            (true, true) if first != second => return Err(DateParseError::AmbiguousDayMonth),
            (true, _) => (num(c)?, first, second),
            (false, true) => (num(c)?, second, first),
            (false, false) => return Err(DateParseError::OutOfRange),
        }
    } else {
        return Err(DateParseError::Unrecognized);
    };

    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or(DateParseError::OutOfRange)?;
    let time = match caps.get(6) {
        None => NaiveTime::MIN,
        Some(t) => parse_time_of_day(t.as_str())?,
    };
    Ok(date.and_time(time).and_utc())
}

fn parse_time_of_day(s: &str) -> Result<NaiveTime, DateParseError> {
    let s = s.trim().trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .ok_or(DateParseError::Unrecognized)
}
