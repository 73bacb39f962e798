// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 为分类列表页URL附加页码查询参数
///
/// 已带查询串的URL用 `&` 续接，否则用 `?` 开启。
pub fn with_page_param(category_url: &str, page: u32) -> String {
    if category_url.contains('?') {
        format!("{}&page={}", category_url, page)
    } else {
        format!("{}?page={}", category_url, page)
    }
}
