use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use regex::{Captures, Regex};

use crate::error::CoreError;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

// Android exports: "DD/MM/YYYY, HH:MM"
static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4}), (\d{2}):(\d{2})$").expect("slash regex"));
// iOS exports: "DD.MM.YYYY, HH:MM"
static DOT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4}), (\d{2}):(\d{2})$").expect("dot regex"));
static ISO_T: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2})(?::(\d{2}))?(Z|[+-]\d{2}:\d{2})?$")
        .expect("iso regex")
});
static ISO_SPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2})(?::(\d{2}))?$").expect("iso space regex")
});

/// Turns export timestamps into epoch milliseconds.
///
/// Recognized shapes are tried in a fixed order and the first shape that
/// matches decides the result; nothing is guessed. Timestamps without a zone
/// are read at the parser's fixed offset (UTC unless configured), so results
/// never depend on the host timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    offset: FixedOffset,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl TimestampParser {
    pub fn with_utc_offset_minutes(minutes: i32) -> Result<Self, CoreError> {
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(CoreError::InvalidArgument(format!(
                "utc offset out of range: {} minutes",
                minutes
            )));
        }
        let offset = FixedOffset::east_opt(minutes * 60)
            .ok_or_else(|| CoreError::InvalidArgument(format!("invalid utc offset: {}", minutes)))?;
        Ok(Self { offset })
    }

    pub fn parse(&self, raw: &str) -> Option<i64> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(caps) = SLASH_DATE.captures(text).or_else(|| DOT_DATE.captures(text)) {
            let day = field(&caps, 1)?;
            let month = field(&caps, 2)?;
            let year = field(&caps, 3)?;
            return self.local_instant(year as i32, month, day, field(&caps, 4)?, field(&caps, 5)?, 0);
        }

        if let Some(caps) = ISO_T.captures(text) {
            let (year, month, day, hour, minute, second) = iso_fields(&caps)?;
            return match caps.get(7).map(|m| m.as_str()) {
                Some(zone) => {
                    let offset = parse_zone(zone)?;
                    instant_at(offset, year, month, day, hour, minute, second)
                }
                None => self.local_instant(year, month, day, hour, minute, second),
            };
        }

        if let Some(caps) = ISO_SPACE.captures(text) {
            let (year, month, day, hour, minute, second) = iso_fields(&caps)?;
            return self.local_instant(year, month, day, hour, minute, second);
        }

        None
    }

    fn local_instant(&self, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<i64> {
        instant_at(self.offset, year, month, day, hour, minute, second)
    }
}

/// Parses with the default (UTC) parser.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    TimestampParser::default().parse(raw)
}

/// Ascending instants; unknown instants order after every known one and tie with each other.
pub fn compare_instants(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable chronological sort; unparseable entries keep their relative order at the end.
pub fn sort_chronologically<T, F>(items: &mut [T], instant: F)
where
    F: Fn(&T) -> Option<i64>,
{
    items.sort_by(|a, b| compare_instants(instant(a), instant(b)));
}

fn field(caps: &Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?.as_str().parse().ok()
}

fn iso_fields(caps: &Captures<'_>) -> Option<(i32, u32, u32, u32, u32, u32)> {
    let second = match caps.get(6) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some((
        field(caps, 1)? as i32,
        field(caps, 2)?,
        field(caps, 3)?,
        field(caps, 4)?,
        field(caps, 5)?,
        second,
    ))
}

fn parse_zone(zone: &str) -> Option<FixedOffset> {
    if zone == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let hours: i32 = zone.get(1..3)?.parse().ok()?;
    let minutes: i32 = zone.get(4..6)?.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn instant_at(
    offset: FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<i64> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis())
}
