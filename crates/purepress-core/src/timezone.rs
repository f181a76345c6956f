//! Site timezone parsing.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Timezone used to localize entry timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteTimezone {
    /// Fixed offset written as `UTC±hh:mm`.
    Fixed(FixedOffset),
    /// Named IANA zone such as `Asia/Shanghai`.
    Named(Tz),
}

impl Default for SiteTimezone {
    fn default() -> Self {
        Self::Fixed(Utc.fix())
    }
}

impl SiteTimezone {
    /// Parse a timezone string. Unrecognized strings fall back to UTC.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some(offset) = parse_utc_offset(s) {
            return Self::Fixed(offset);
        }
        match s.parse::<Tz>() {
            Ok(tz) => Self::Named(tz),
            Err(_) => {
                tracing::warn!(timezone = s, "unrecognized timezone, falling back to UTC");
                Self::default()
            }
        }
    }

    /// Attach this timezone to a wall-clock timestamp.
    ///
    /// Ambiguous local times resolve to the earlier instant; times skipped by
    /// a DST transition are read as UTC.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            Self::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .earliest()
                .unwrap_or_else(|| offset.from_utc_datetime(&naive)),
            Self::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
                .fixed_offset(),
        }
    }
}

/// Parse `UTC+8:00`, `UTC-05:30` style offsets.
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let rest = s.strip_prefix("UTC")?;
    let (sign, rest) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
