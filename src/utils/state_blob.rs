// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::DeserializeOwned;

/// 从 HTML 文档中提取内嵌的 JSON 状态对象
///
/// 在 `marker` 之后定位第一个 `{`，逐字符跟踪括号深度和字符串转义状态，
/// 返回完整的顶层对象切片。字符串内的括号不计入深度。
///
/// # 参数
///
/// * `document` - HTML 文档
/// * `marker` - 状态对象之前的标记，例如 `window.__APOLLO_STATE__`
///
/// # 返回值
///
/// 找到且括号闭合时返回对象切片，否则返回 `None`
pub fn extract_json_object<'a>(document: &'a str, marker: &str) -> Option<&'a str> {
    let marker_pos = document.find(marker)?;
    let after_marker = marker_pos + marker.len();
    let open = after_marker + document[after_marker..].find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in document[open..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = open + offset + ch.len_utf8();
                    return Some(&document[open..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// 状态提取错误
#[derive(Debug, thiserror::Error)]
pub enum StateBlobError {
    /// 未找到标记或对象未闭合
    #[error("state blob `{0}` not found")]
    NotFound(String),
    /// JSON 结构不匹配
    #[error("state blob does not match expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// 提取并反序列化内嵌状态
pub fn extract_state<T: DeserializeOwned>(document: &str, marker: &str) -> Result<T, StateBlobError> {
    let blob = extract_json_object(document, marker)
        .ok_or_else(|| StateBlobError::NotFound(marker.to_string()))?;
    Ok(serde_json::from_str(blob)?)
}
