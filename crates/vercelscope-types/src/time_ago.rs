//! Relative time formatting for the deployments table

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Format an epoch-millisecond timestamp as a long relative time
/// (e.g. "an hour ago", "3 days ago")
pub fn time_ago(then_ms: i64, now_ms: i64) -> String {
    let secs = ((now_ms - then_ms) / 1000).max(0);

    match secs {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{} seconds ago", secs),
        s if s < 2 * MINUTE => "a minute ago".to_string(),
        s if s < HOUR => format!("{} minutes ago", s / MINUTE),
        s if s < 2 * HOUR => "an hour ago".to_string(),
        s if s < DAY => format!("{} hours ago", s / HOUR),
        s if s < 2 * DAY => "a day ago".to_string(),
        s if s < MONTH => format!("{} days ago", s / DAY),
        s if s < 2 * MONTH => "a month ago".to_string(),
        s if s < YEAR => format!("{} months ago", s / MONTH),
        s if s < 2 * YEAR => "a year ago".to_string(),
        s => format!("{} years ago", s / YEAR),
    }
}

/// Compact form of [`time_ago`] (e.g. "10s", "5m", "3h", "2d")
pub fn time_ago_short(then_ms: i64, now_ms: i64) -> String {
    let secs = ((now_ms - then_ms) / 1000).max(0);

    match secs {
        s if s < MINUTE => format!("{}s", s),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s if s < YEAR => format!("{}d", s / DAY),
        s => format!("{}y", s / YEAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1000;

    #[test]
    fn test_short_formats_seconds() {
        assert_eq!(time_ago_short(0, 10 * MS), "10s");
    }

    #[test]
    fn test_short_formats_larger_units() {
        assert_eq!(time_ago_short(0, 5 * MINUTE * MS), "5m");
        assert_eq!(time_ago_short(0, 3 * HOUR * MS), "3h");
        assert_eq!(time_ago_short(0, 2 * DAY * MS), "2d");
    }

    #[test]
    fn test_long_formats_with_articles() {
        assert_eq!(time_ago(0, HOUR * MS), "an hour ago");
        assert_eq!(time_ago(0, 90 * MINUTE * MS), "an hour ago");
        assert_eq!(time_ago(0, MINUTE * MS), "a minute ago");
        assert_eq!(time_ago(0, DAY * MS), "a day ago");
    }

    #[test]
    fn test_long_formats_counts() {
        assert_eq!(time_ago(0, 10 * MS), "10 seconds ago");
        assert_eq!(time_ago(0, 5 * MINUTE * MS), "5 minutes ago");
        assert_eq!(time_ago(0, 4 * HOUR * MS), "4 hours ago");
        assert_eq!(time_ago(0, 6 * DAY * MS), "6 days ago");
    }

    #[test]
    fn test_future_timestamps_clamp_to_now() {
        assert_eq!(time_ago(10 * MS, 0), "just now");
        assert_eq!(time_ago_short(10 * MS, 0), "0s");
    }
}
