//! Human-readable order numbers: `{PREFIX}-{YYMMDD}-{SEQ}`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

const FALLBACK_PREFIX: &str = "ORD";

/// Derive the order-number prefix from a restaurant name.
///
/// A single-word name contributes its first four characters; longer names
/// contribute the initial of each of their first four words.
pub fn prefix(restaurant_name: &str) -> String {
    let words: Vec<&str> = restaurant_name.split_whitespace().collect();
    let prefix: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(4).collect(),
        many => many.iter().take(4).filter_map(|w| w.chars().next()).collect(),
    };

    if prefix.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix.to_uppercase()
    }
}

pub fn format(prefix: &str, day: NaiveDate, sequence: i64) -> String {
    format!("{prefix}-{}-{sequence:04}", day.format("%y%m%d"))
}

/// The UTC calendar day containing `now`, as a half-open `[start, end)` range.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn single_word_uses_first_four_characters() {
        assert_eq!(prefix("Sunrise"), "SUNR");
        assert_eq!(prefix("Bar"), "BAR");
    }

    #[test]
    fn multi_word_uses_initials_of_first_four_words() {
        assert_eq!(prefix("Grand Hotel Lagos"), "GHL");
        assert_eq!(prefix("the old mill river inn"), "TOMR");
        assert_eq!(prefix("  Blue   Lagoon  "), "BL");
    }

    #[test]
    fn blank_name_falls_back() {
        assert_eq!(prefix(""), "ORD");
        assert_eq!(prefix("   "), "ORD");
    }

    #[test]
    fn formats_date_and_pads_sequence() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format("GHL", day, 1), "GHL-250307-0001");
        assert_eq!(format("GHL", day, 42), "GHL-250307-0042");
        assert_eq!(format("GHL", day, 12345), "GHL-250307-12345");
    }

    #[test]
    fn day_bounds_cover_the_utc_day() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 18, 30, 5).unwrap();
        let (start, end) = day_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 8, 0, 0, 0).unwrap());
        assert!(start <= now && now < end);
    }
}
