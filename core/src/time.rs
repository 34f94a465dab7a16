//! Time related utils.
//!
//! All formats used by the signer are fixed width and UTC only.

use crate::Error;
use crate::Result;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Date format: "20220313"
const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601 basic: "20220313T072004Z"
const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Create date time from now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `20220301`
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format time into ISO8601 basic: `20220313T072004Z`
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Ensure the time can be rendered in the fixed width formats.
///
/// chrono renders years outside `0..=9999` with a sign or extra digits,
/// which would silently break the fixed width layout.
pub fn check_fixed_width(t: DateTime) -> Result<()> {
    if !(0..=9999).contains(&t.year()) {
        return Err(Error::invalid_timestamp(format!(
            "year {} can't be formatted as a 4 digit year",
            t.year()
        )));
    }
    Ok(())
}

/// Parse a `yyyyMMdd` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_timestamp(format!(
            "date {s:?} is not in yyyyMMdd format"
        )));
    }
    Ok(NaiveDate::parse_from_str(s, DATE)?)
}

/// Parse an ISO8601 basic timestamp like `20130524T000000Z`.
///
/// Only the exact 16 character UTC form is accepted: no separators, no
/// fractional seconds, no offsets.
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    let bs = s.as_bytes();
    let well_formed = bs.len() == 16
        && bs[8] == b'T'
        && bs[15] == b'Z'
        && bs[..8].iter().all(u8::is_ascii_digit)
        && bs[9..15].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err(Error::invalid_timestamp(format!(
            "timestamp {s:?} is not in ISO8601 basic format yyyyMMddTHHmmssZ"
        )));
    }
    Ok(NaiveDateTime::parse_from_str(s, ISO8601)?.and_utc())
}
