// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 商品记录实体
///
/// 表示一次抓取运行中单个葡萄酒/烈酒商品页的提取结果。
/// 除 `url` 和 `scraped_at` 外所有字段均为可选：字段缺失表示
/// "页面上未找到该字段"，不是错误。记录一旦追加到落盘器即不可变。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// 商品详情页URL，单次运行内唯一
    pub url: String,
    /// 商品名称
    pub name: Option<String>,
    /// 价格文本（保留页面原始格式，如 "24,90 €"）
    pub price: Option<String>,
    /// 产区
    pub region: Option<String>,
    /// 葡萄品种
    pub grape: Option<String>,
    /// 商品描述
    pub description: Option<String>,
    /// 年份
    pub vintage: Option<String>,
    /// 酒精度
    pub alcohol: Option<String>,
    /// 容量
    pub volume: Option<String>,
    /// 评分
    pub rating: Option<String>,
    /// 库存状态
    pub stock: Option<String>,
    /// 分类面包屑
    pub category_breadcrumb: Option<String>,
    /// 商品主图URL（静态标记二次提取路径获得）
    pub image_url: Option<String>,
    /// 商品数字ID（从主图路径中正则提取）
    pub product_id: Option<String>,
    /// 提取完成时间戳，记录定稿时设置一次，此后不再变更
    #[serde(with = "stamp_format")]
    pub scraped_at: DateTime<Utc>,
}

/// 时间戳序列化格式
///
/// CSV 和 JSON 输出统一使用 `%Y-%m-%d %H:%M:%S`。
pub mod stamp_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(stamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&stamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)?;
        Ok(naive.and_utc())
    }
}

/// 已访问URL集合
///
/// 记录当前运行中已入队或已提取的商品URL，只增不减。
/// 同一商品可能从多个列表页可达，靠此集合保证至多提取一次。
#[derive(Debug, Default)]
pub struct VisitedSet(HashSet<String>);

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 幂等插入；仅当URL首次出现时返回true
    pub fn insert(&mut self, url: &str) -> bool {
        self.0.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 单次运行的统计摘要
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// 处理过的列表页数
    pub pages_walked: u32,
    /// 成功提取的商品数
    pub products_extracted: u32,
    /// 因会话级失败跳过的商品数
    pub products_skipped: u32,
}
