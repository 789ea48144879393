use std::sync::OnceLock;

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use regex::Regex;

/// `YYYY-MM-DD HH:MM:SS`, the shape every recognized time is normalized to.
pub const LONG_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_long_date_time, r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2} [0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2}$");
re!(re_long_date_time_without_second, r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2} [0-9]{1,2}:[0-9]{1,2}$");
re!(re_long_date, r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}$");
re!(re_utc_offset, r"^([+-])([0-9]{2}):?([0-9]{2})$");

/// Build a canonical long date-time. Seconds are always zero.
pub fn format_long_date_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> String {
    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:00")
}

/// Pad a recognized date string to the canonical long date-time shape.
///
/// Full date-times pass through, date-times without seconds gain `:00`, and
/// bare dates gain ` 00:00:00`. Anything else is returned unchanged and left
/// for [`parse_long_date_time`] to reject.
pub fn normalize_date_text(raw: &str) -> String {
    if re_long_date_time().is_match(raw) {
        raw.to_string()
    } else if re_long_date_time_without_second().is_match(raw) {
        format!("{raw}:00")
    } else if re_long_date().is_match(raw) {
        format!("{raw} 00:00:00")
    } else {
        raw.to_string()
    }
}

/// Parse a canonical long date-time as wall-clock time in `timezone` and
/// return Unix epoch seconds.
pub fn parse_long_date_time(text: &str, timezone: &FixedOffset) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(text, LONG_DATE_TIME_FORMAT).ok()?;
    timezone
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp())
}

/// Parse a client timezone written as `+08:00`, `-0530`, `Z` or `UTC`.
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let c = re_utc_offset().captures(text)?;
    let hours: i32 = c.get(2)?.as_str().parse().ok()?;
    let minutes: i32 = c.get(3)?.as_str().parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let seconds = (hours * 60 + minutes) * 60;
    match c.get(1)?.as_str() {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

/// Offset from a client-reported number of minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn format_pads_components() {
        assert_eq!(format_long_date_time(2026, 2, 7, 9, 5), "2026-02-07 09:05:00");
    }

    #[test]
    fn normalize_fills_missing_parts() {
        assert_eq!(normalize_date_text("2026-02-07 21:49:30"), "2026-02-07 21:49:30");
        assert_eq!(normalize_date_text("2026-02-07 21:49"), "2026-02-07 21:49:00");
        assert_eq!(normalize_date_text("2026-02-07"), "2026-02-07 00:00:00");
    }

    #[test]
    fn normalize_passes_unknown_shapes_through() {
        assert_eq!(normalize_date_text("yesterday"), "yesterday");
        assert_eq!(normalize_date_text("2月7日 21:49"), "2月7日 21:49");
        assert_eq!(normalize_date_text(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["2026-02-07 21:49:30", "2026-2-7 9:05", "2026-02-07", "garbage", " 2026-02-07"] {
            let once = normalize_date_text(raw);
            assert_eq!(normalize_date_text(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn parse_in_utc() {
        assert_eq!(parse_long_date_time("1970-01-01 00:01:00", &utc()), Some(60));
    }

    #[test]
    fn parse_respects_timezone() {
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = parse_long_date_time("2026-02-07 21:49:00", &shanghai).unwrap();
        let universal = parse_long_date_time("2026-02-07 13:49:00", &utc()).unwrap();
        assert_eq!(local, universal);
    }

    #[test]
    fn parse_accepts_unpadded_fields() {
        assert_eq!(
            parse_long_date_time("2026-2-7 9:05:00", &utc()),
            parse_long_date_time("2026-02-07 09:05:00", &utc())
        );
    }

    #[test]
    fn parse_rejects_impossible_dates() {
        assert_eq!(parse_long_date_time("2026-02-30 10:00:00", &utc()), None);
        assert_eq!(parse_long_date_time("2026-02-07 25:00:00", &utc()), None);
        assert_eq!(parse_long_date_time("not a date", &utc()), None);
    }

    #[test]
    fn utc_offset_forms() {
        assert_eq!(parse_utc_offset("+08:00"), FixedOffset::east_opt(8 * 3600));
        assert_eq!(parse_utc_offset("-0530"), FixedOffset::west_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_utc_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("utc"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("+8"), None);
        assert_eq!(parse_utc_offset("+08:75"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
    }

    #[test]
    fn offset_minutes() {
        assert_eq!(offset_from_minutes(480), FixedOffset::east_opt(8 * 3600));
        assert_eq!(offset_from_minutes(-300), FixedOffset::west_opt(5 * 3600));
    }
}
