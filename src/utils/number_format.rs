// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Deserialize;

/// 解析本地化格式的计数字符串
///
/// 去掉千位分隔符、空白和 `+` 后缀，支持 `1.2만` / `3천` 这样的韩文数量单位。
/// 无法解析时返回 0，结果永远是非负整数。
///
/// # 示例
///
/// ```
/// use placewatch::utils::number_format::parse_count;
///
/// assert_eq!(parse_count("1,234"), 1234);
/// assert_eq!(parse_count("1.2만"), 12000);
/// assert_eq!(parse_count(""), 0);
/// ```
pub fn parse_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '+' | ' ' | '\u{a0}'))
        .collect();

    let (number, multiplier) = if let Some(rest) = cleaned.strip_suffix('만') {
        (rest, 10_000.0)
    } else if let Some(rest) = cleaned.strip_suffix('천') {
        (rest, 1_000.0)
    } else {
        (cleaned.as_str(), 1.0)
    };

    // Keep the leading numeric run only ("1234건" -> "1234")
    let numeric: String = number
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if numeric.is_empty() {
        return 0;
    }

    if multiplier == 1.0 && !numeric.contains('.') {
        return numeric.parse::<u64>().unwrap_or(0);
    }

    match numeric.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => (value * multiplier).round() as u64,
        _ => 0,
    }
}

/// 规范化评分字符串
///
/// 空字符串、`0`、`0.0` 等哨兵值视为缺失，返回 `None`。
pub fn normalize_rating_str(raw: &str) -> Option<f32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    trimmed.parse::<f32>().ok().and_then(normalize_rating)
}

/// 规范化评分数值，0 或非有限值视为缺失
pub fn normalize_rating(value: f32) -> Option<f32> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// 计数或评分字段，有时是数字，有时是带千位分隔符的字符串
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(u64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    pub fn as_count(&self) -> u64 {
        match self {
            LooseNumber::Int(n) => *n,
            LooseNumber::Float(f) if *f > 0.0 => f.round() as u64,
            LooseNumber::Float(_) => 0,
            LooseNumber::Text(s) => parse_count(s),
        }
    }

    pub fn as_rating(&self) -> Option<f32> {
        match self {
            LooseNumber::Int(n) => normalize_rating(*n as f32),
            LooseNumber::Float(f) => normalize_rating(*f as f32),
            LooseNumber::Text(s) => normalize_rating_str(s),
        }
    }
}
