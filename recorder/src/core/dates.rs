//! Relative commit dates such as `7d` or `2H`.

use anyhow::{Result, bail};
use chrono::{Duration, NaiveDateTime};

/// Parse an offset of whole days (`7d`) or hours (`2H`).
pub fn parse_offset(offset: &str) -> Result<Duration> {
    let parsed = if let Some(days) = offset.strip_suffix('d') {
        days.parse::<i64>().ok().map(Duration::days)
    } else if let Some(hours) = offset.strip_suffix('H') {
        hours.parse::<i64>().ok().map(Duration::hours)
    } else {
        None
    };
    match parsed {
        Some(duration) => Ok(duration),
        None => bail!("Unknown offset format: {offset}"),
    }
}

/// Format `now - offset` the way git accepts in `GIT_*_DATE`.
pub fn commit_timestamp(now: NaiveDateTime, offset: &str) -> Result<String> {
    let at = now - parse_offset(offset)?;
    Ok(at.format("%Y-%m-%dT%H:%M:%S").to_string())
}
