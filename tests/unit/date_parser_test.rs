// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{NaiveDate, NaiveDateTime};
use placewatch::utils::date_parser::{parse_review_date, parse_with_format, DateFormat};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_month_day_rolls_back_across_new_year() {
    let reference = at(2026, 1, 3);

    assert_eq!(parse_review_date("12.30.화", reference), Some(date(2025, 12, 30)));
    assert_eq!(parse_review_date("1.2.금", reference), Some(date(2026, 1, 2)));
    // Same month stays in the reference year even if the day is later
    assert_eq!(parse_review_date("1.28", reference), Some(date(2026, 1, 28)));
}

#[test]
fn test_relative_dates_cross_month_boundaries() {
    let reference = at(2026, 3, 1);

    assert_eq!(parse_review_date("1일 전", reference), Some(date(2026, 2, 28)));
    assert_eq!(parse_review_date("2주 전", reference), Some(date(2026, 2, 15)));
    assert_eq!(parse_review_date("1개월 전", reference), Some(date(2026, 2, 1)));
    assert_eq!(parse_review_date("3 days ago", reference), Some(date(2026, 2, 26)));
    assert_eq!(parse_review_date("어제", reference), Some(date(2026, 2, 28)));
}

#[test]
fn test_detected_format_follows_parser_order() {
    let reference = at(2026, 5, 10);

    assert_eq!(
        parse_with_format("5시간 전", reference),
        Some((date(2026, 5, 10), DateFormat::Relative))
    );
    assert_eq!(
        parse_with_format("4.1.수", reference),
        Some((date(2026, 4, 1), DateFormat::Partial))
    );
    assert_eq!(
        parse_with_format("2024년 11월 7일", reference),
        Some((date(2024, 11, 7), DateFormat::Absolute))
    );
    assert_eq!(
        parse_with_format("24.11.07.", reference),
        Some((date(2024, 11, 7), DateFormat::Absolute))
    );
}

#[test]
fn test_unparseable_dates_yield_none() {
    let reference = at(2026, 5, 10);

    for raw in ["", "   ", "지난주쯤", "13.45", "2026.02.30"] {
        assert_eq!(parse_review_date(raw, reference), None, "input {:?}", raw);
    }
}
