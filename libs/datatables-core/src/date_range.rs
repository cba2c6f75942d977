//! Date-range normalisation.
//!
//! Start and end arrive as `DD/MM/YYYY` strings plus a time-zone name. Each
//! side is parsed independently; a side that fails to parse (bad format,
//! unknown zone) is simply absent, and the combination of present sides picks
//! the comparison.

use std::borrow::Cow;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::request::DateRangeRequest;

pub const DEFAULT_TIME_ZONE: &str = "GMT";
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Format used when a bound is bound into SQL as text.
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 23h 59m 59s: the end bound covers the whole end day.
const END_OF_DAY_SECS: i64 = 23 * 3600 + 59 * 60 + 59;

/// Quarter-hour steps tried past a skipped local midnight (one day).
const GAP_SEARCH_STEPS: i64 = 24 * 4;

/// The present sides of a date range, as UTC instants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateBounds {
    /// Only the start parsed: `column >= start`.
    From(DateTime<Utc>),
    /// Only the end parsed: `column <= end`.
    Until(DateTime<Utc>),
    /// Both parsed: `column BETWEEN start AND end`.
    Between(DateTime<Utc>, DateTime<Utc>),
}

impl DateBounds {
    /// Four-way dispatch on which sides parse. `None` when neither does.
    pub fn from_request(req: &DateRangeRequest) -> Option<Self> {
        let tz = parse_time_zone(req.time_zone.as_deref());
        let start = tz.and_then(|tz| req.start.as_deref().and_then(|s| start_of_day(s, tz)));
        let end = tz.and_then(|tz| req.end.as_deref().and_then(|s| end_of_day(s, tz)));

        if tz.is_none() {
            tracing::debug!(time_zone = ?req.time_zone, "unknown time zone, date range ignored");
        }

        match (start, end) {
            (None, None) => None,
            (Some(s), None) => Some(DateBounds::From(s)),
            (None, Some(e)) => Some(DateBounds::Until(e)),
            (Some(s), Some(e)) => Some(DateBounds::Between(s, e)),
        }
    }
}

/// Render an instant the way the bound is compared against a text-cast column.
pub fn sql_text(instant: &DateTime<Utc>) -> String {
    instant.format(SQL_TIMESTAMP_FORMAT).to_string()
}

/// Resolve a zone name; absent means [`DEFAULT_TIME_ZONE`].
///
/// Names may arrive HTML-entity encoded (`Europe&#x2F;Paris`).
pub fn parse_time_zone(raw: Option<&str>) -> Option<Tz> {
    let name = decode_entities(raw.unwrap_or(DEFAULT_TIME_ZONE));
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_TIME_ZONE } else { name };
    name.parse::<Tz>().ok()
}

/// First instant of `date` in `tz`: local midnight, or the first local time
/// that exists when midnight falls in a DST gap.
pub fn start_of_day(date: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    let local = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt),
        LocalResult::None => first_existing_after(tz, midnight),
    };
    if local.is_none() {
        tracing::debug!(%date, %tz, "no local time exists on this day, bound ignored");
    }
    local.map(|dt| dt.with_timezone(&Utc))
}

/// Gaps are whole quarter hours in the tz database.
fn first_existing_after(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    (1..=GAP_SEARCH_STEPS)
        .map(|step| local + TimeDelta::minutes(15 * step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
}

/// Last second of `date` in `tz` (midnight + 23:59:59).
pub fn end_of_day(date: &str, tz: Tz) -> Option<DateTime<Utc>> {
    start_of_day(date, tz).map(|start| start + TimeDelta::seconds(END_OF_DAY_SECS))
}

fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    const ENTITIES: [(&str, &str); 8] = [
        ("&#x2F;", "/"),
        ("&#x2f;", "/"),
        ("&#47;", "/"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        // last, so `&amp;lt;` decodes to `&lt;` and not `<`
        ("&amp;", "&"),
    ];
    let mut out = raw.to_string();
    for (entity, ch) in ENTITIES {
        out = out.replace(entity, ch);
    }
    Cow::Owned(out)
}
