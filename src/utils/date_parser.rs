// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_KO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*(초|분|시간|일|주|개월|달|년)\s*전$").expect("valid relative regex")
});

static RELATIVE_EN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)\s*(second|minute|hour|day|week|month|year)s?\s+ago$")
        .expect("valid relative regex")
});

static PARTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\.(\d{1,2})\.?(?:\s*[가-힣A-Za-z]+)?$").expect("valid partial regex")
});

static ABSOLUTE_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}|\d{2})[./-]\s*(\d{1,2})[./-]\s*(\d{1,2})\.?(?:\s*[가-힣A-Za-z()]+)?$")
        .expect("valid absolute regex")
});

static ABSOLUTE_KO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일").expect("valid absolute regex")
});

/// 日期格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// 相对时间：`3일 전`、`2 weeks ago`
    Relative,
    /// 只有月日：`1.10`、`1.10.금`
    Partial,
    /// 完整日期：`2026.01.10`、`2026년 1월 10일`
    Absolute,
}

/// 解析评论日期
///
/// 三种解析器按固定顺序尝试（相对 → 月日 → 完整），第一个成功的结果胜出。
///
/// # 参数
///
/// * `raw` - 原始日期字符串
/// * `reference` - 作为"现在"的参考时间
pub fn parse_review_date(raw: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
    parse_with_format(raw, reference).map(|(date, _)| date)
}

/// 解析评论日期并返回命中的格式
pub fn parse_with_format(raw: &str, reference: NaiveDateTime) -> Option<(NaiveDate, DateFormat)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_relative(trimmed, reference) {
        return Some((date, DateFormat::Relative));
    }
    if let Some(date) = parse_partial(trimmed, reference.date()) {
        return Some((date, DateFormat::Partial));
    }
    parse_absolute(trimmed).map(|date| (date, DateFormat::Absolute))
}

/// 解析相对时间
pub fn parse_relative(raw: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
    match raw.to_lowercase().as_str() {
        "오늘" | "방금" | "방금 전" | "today" | "just now" => return Some(reference.date()),
        "어제" | "yesterday" => return reference.date().pred_opt(),
        _ => {}
    }

    let (amount, unit) = if let Some(caps) = RELATIVE_KO.captures(raw) {
        let unit = match &caps[2] {
            "초" => "second",
            "분" => "minute",
            "시간" => "hour",
            "일" => "day",
            "주" => "week",
            "개월" | "달" => "month",
            _ => "year",
        };
        (caps[1].parse::<u32>().ok()?, unit.to_string())
    } else if let Some(caps) = RELATIVE_EN.captures(raw) {
        (caps[1].parse::<u32>().ok()?, caps[2].to_lowercase())
    } else {
        return None;
    };

    let shifted = match unit.as_str() {
        "second" => reference.checked_sub_signed(Duration::seconds(amount.into()))?,
        "minute" => reference.checked_sub_signed(Duration::minutes(amount.into()))?,
        "hour" => reference.checked_sub_signed(Duration::hours(amount.into()))?,
        "day" => reference.checked_sub_signed(Duration::days(amount.into()))?,
        "week" => reference.checked_sub_signed(Duration::weeks(amount.into()))?,
        "month" => reference.checked_sub_months(Months::new(amount))?,
        _ => reference.checked_sub_months(Months::new(amount.checked_mul(12)?))?,
    };

    Some(shifted.date())
}

/// 解析月日格式并推断年份
///
/// 与参考日期同年；若月份大于参考月份，则视为上一年。
pub fn parse_partial(raw: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let caps = PARTIAL.captures(raw)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;

    let year = if month > reference.month() {
        reference.year() - 1
    } else {
        reference.year()
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// 解析完整日期
pub fn parse_absolute(raw: &str) -> Option<NaiveDate> {
    if let Some(caps) = ABSOLUTE_KO.captures(raw) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    let caps = ABSOLUTE_NUMERIC.captures(raw)?;
    let year_raw = &caps[1];
    let mut year: i32 = year_raw.parse().ok()?;
    if year_raw.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, caps[2].parse().ok()?, caps[3].parse().ok()?)
}
