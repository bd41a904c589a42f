//! Date parsing and formatting helpers for CLI and TUI input.

use chrono::{Datelike, Duration, Local, NaiveDate};

/// Parse human-readable date input with smart natural language support.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekday names ("friday"), "next friday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = (today.year(), today.month());
            let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];

    for (day_name, target_day) in weekdays {
        let current_day = today.weekday().num_days_from_monday() as i32;
        let days_ahead = (target_day + 7 - current_day) % 7;

        if s == day_name || s == format!("this {}", day_name) {
            return Some(today + Duration::days(days_ahead as i64));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add as i64));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_date_relative(date: Option<NaiveDate>, today: NaiveDate) -> String {
    match date {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {}d", n),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Absolute date for detail panels, or a dash when unset.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%-d %b %Y").to_string(),
        None => "—".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date_input("2025-08-06"),
            NaiveDate::from_ymd_opt(2025, 8, 6)
        );
        assert_eq!(parse_date_input("not a date"), None);
    }

    #[test]
    fn parses_relative_offsets() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date_input("today"), Some(today));
        assert_eq!(parse_date_input("in 3d"), Some(today + Duration::days(3)));
        assert_eq!(parse_date_input("in 2w"), Some(today + Duration::weeks(2)));
    }

    #[test]
    fn week_bounds_are_monday_to_sunday() {
        let wed = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        let (start, end) = start_end_of_this_week(wed);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 8, 10).unwrap());
    }

    #[test]
    fn relative_formatting() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(format_date_relative(Some(today), today), "today");
        assert_eq!(
            format_date_relative(Some(today + Duration::days(4)), today),
            "in 4d"
        );
        assert_eq!(
            format_date_relative(Some(today - Duration::days(2)), today),
            "2d late"
        );
        assert_eq!(format_date_relative(None, today), "-");
    }
}
