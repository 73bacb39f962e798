// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::engines::traits::SessionError;

/// 抓取管线错误类型
///
/// 覆盖整条管线的失败场景：会话层失败、单个商品页提取失败、
/// 重试耗尽以及结果落盘时的序列化/IO错误。
/// 字段未命中不在此列，提取器内部将其就地恢复为 None。
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 浏览器会话错误
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// 单个商品页整体提取失败（导航失败等会话级原因）
    #[error("extraction failed for {url}: {cause}")]
    ExtractionFailed { url: String, cause: String },

    /// 重试次数耗尽
    #[error("operation '{operation}' failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    /// 配置无效
    #[error("invalid configuration: {0}")]
    Config(String),

    /// 存储IO错误
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// CSV序列化错误
    #[error("csv serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON序列化错误
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
