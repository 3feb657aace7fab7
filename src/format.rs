//! Display helpers for byte sizes, timestamps and scraped text.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNITS: [&str; 6] = ["B", "kB", "MB", "GB", "TB", "PB"];

/// SI-style byte formatting: "512 B", "4.7 GB".
pub fn human_bytes(size: u64) -> String {
    if size < 1000 {
        return format!("{} B", size);
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit + 1 < UNITS.len() {
        value /= 1000.0;
        unit += 1;
    }
    if value >= 100.0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Relative rendering of an RFC3339 timestamp against the current time.
/// Unparseable input is passed through untouched.
pub fn relative_time(rfc3339: &str) -> String {
    match OffsetDateTime::parse(rfc3339, &Rfc3339) {
        Ok(ts) => relative_from(ts, OffsetDateTime::now_utc()),
        Err(_) => rfc3339.to_string(),
    }
}

/// "3 days ago" for past timestamps, "in 4 minutes" for future ones.
pub fn relative_from(ts: OffsetDateTime, now: OffsetDateTime) -> String {
    let delta = now - ts;
    let secs = delta.whole_seconds();
    if secs.abs() < 30 {
        return "just now".to_string();
    }

    let (magnitude, future) = if secs < 0 {
        ((-secs) as u64, true)
    } else {
        (secs as u64, false)
    };

    let (count, unit) = if magnitude < 60 {
        (magnitude, "second")
    } else if magnitude < 3600 {
        (magnitude / 60, "minute")
    } else if magnitude < 86_400 {
        (magnitude / 3600, "hour")
    } else if magnitude < 86_400 * 30 {
        (magnitude / 86_400, "day")
    } else if magnitude < 86_400 * 365 {
        (magnitude / (86_400 * 30), "month")
    } else {
        (magnitude / (86_400 * 365), "year")
    };

    let plural = if count == 1 { "" } else { "s" };
    if future {
        format!("in {} {}{}", count, unit, plural)
    } else {
        format!("{} {}{} ago", count, unit, plural)
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces and
/// trim the ends. Scraped catalog text is full of layout whitespace.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_gap = true;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                out.push(' ');
                in_gap = true;
            }
        } else {
            out.push(ch);
            in_gap = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn bytes_pick_sensible_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1_500), "1.5 kB");
        assert_eq!(human_bytes(4_700_000_000), "4.7 GB");
        assert_eq!(human_bytes(123_000_000_000), "123 GB");
    }

    #[test]
    fn relative_past_and_future() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(relative_from(now - Duration::seconds(5), now), "just now");
        assert_eq!(
            relative_from(now - Duration::minutes(5), now),
            "5 minutes ago"
        );
        assert_eq!(relative_from(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(relative_from(now - Duration::days(3), now), "3 days ago");
        assert_eq!(
            relative_from(now + Duration::minutes(4), now),
            "in 4 minutes"
        );
        assert_eq!(relative_from(now + Duration::days(40), now), "in 1 month");
    }

    #[test]
    fn unparseable_timestamps_pass_through() {
        assert_eq!(relative_time("3 weeks ago"), "3 weeks ago");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("\n\n"), "");
        assert_eq!(collapse_whitespace("plain"), "plain");
    }
}
