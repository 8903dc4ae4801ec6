//! Conversions between stored UTC instants and the site timezone.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

/// Formats accepted from `datetime-local` inputs.
const INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> DateTime<Tz> {
    let utc = time.to_offset(UtcOffset::UTC);
    let datetime_utc = DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())
        .unwrap_or_default();
    tz.from_utc_datetime(&datetime_utc.naive_utc())
}

/// Human-readable date, e.g. `05 March 2025, 14:30`.
pub fn format_display(time: OffsetDateTime, tz: Tz) -> String {
    localized_datetime(time, tz)
        .format("%d %B %Y, %H:%M")
        .to_string()
}

/// RFC 3339 value for `<time datetime>` attributes.
pub fn format_iso(time: OffsetDateTime, tz: Tz) -> String {
    localized_datetime(time, tz).to_rfc3339()
}

/// Value for a `datetime-local` input.
pub fn format_input(time: OffsetDateTime, tz: Tz) -> String {
    localized_datetime(time, tz)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

/// Interpret a `datetime-local` value as wall-clock time in `tz`.
///
/// Ambiguous wall-clock times resolve to the earlier instant; times skipped by a
/// daylight-saving jump do not parse.
pub fn parse_input(raw: &str, tz: Tz) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    let naive = INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())?;
    let local = tz.from_local_datetime(&naive).earliest()?;
    let utc = local.with_timezone(&Utc);
    OffsetDateTime::from_unix_timestamp(utc.timestamp())
        .ok()
        .map(|value| value.replace_nanosecond(utc.timestamp_subsec_nanos()).unwrap_or(value))
}
