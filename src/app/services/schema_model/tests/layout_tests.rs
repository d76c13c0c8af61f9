//! Tests for field spans and date formats

use super::*;
use chrono::NaiveDate;

#[test]
fn test_slice_uses_one_based_char_offsets() {
    let span = FieldSpan::new(3, 5);
    assert_eq!(span.slice("C1NSC  North Shore"), "NSC");
    assert_eq!(span.slice("C1ABCDEFG"), "ABCDE");
}

#[test]
fn test_slice_tolerates_short_lines() {
    let span = FieldSpan::new(10, 4);
    assert_eq!(span.slice("B1short"), "");
    assert_eq!(FieldSpan::new(6, 10).slice("B1abcdef"), "def");
    assert!(FieldSpan::new(10, 4).value("B1short").is_none());
}

#[test]
fn test_slice_counts_characters_not_bytes() {
    let line = "C1Ōtaki Swim";
    assert_eq!(FieldSpan::new(3, 5).slice(line), "Ōtaki");
    assert_eq!(FieldSpan::new(9, 4).slice(line), "Swim");
}

#[test]
fn test_date_formats() {
    let expected = NaiveDate::from_ymd_opt(2025, 8, 9).unwrap();
    assert_eq!(DateFormat::MonthDayYear.parse("08092025"), Some(expected));
    assert_eq!(DateFormat::DayMonthYear.parse("09082025"), Some(expected));
    assert_eq!(DateFormat::YearMonthDay.parse("20250809"), Some(expected));
}

#[test]
fn test_unparseable_dates_are_none() {
    assert_eq!(DateFormat::MonthDayYear.parse(""), None);
    assert_eq!(DateFormat::MonthDayYear.parse("13402025"), None);
    assert_eq!(DateFormat::MonthDayYear.parse("0809202"), None);
    assert_eq!(DateFormat::MonthDayYear.parse("08-09-25"), None);
    assert_eq!(DateFormat::DayMonthYear.parse("30022024"), None);
}

#[test]
fn test_date_format_names_in_documents() {
    let format: DateFormat = serde_json::from_str("\"YYYYMMDD\"").unwrap();
    assert_eq!(format, DateFormat::YearMonthDay);
    assert!(serde_json::from_str::<DateFormat>("\"DD/MM/YYYY\"").is_err());
}
