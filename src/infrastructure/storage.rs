// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// 本地文件输出存储
///
/// 结果文件、检查点和调试页面转储共用的落盘通道。
/// 写入总是整体覆盖目标文件，同一内存状态重复落盘是安全的。
pub struct OutputStore {
    base_path: PathBuf,
}

impl OutputStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// 覆盖写入一个文件，父目录不存在时自动创建
    pub async fn save(&self, key: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        let full_path = self.full_path(key);

        // 确保目录存在
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(full_path)
    }

    /// 转储一页原始标记用于线下排查选择器漂移
    ///
    /// 失败只记日志，永不影响调用方。
    pub async fn dump_markup(&self, key: &str, markup: &str) {
        match self.save(key, markup.as_bytes()).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "page markup dumped for inspection");
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to dump page markup");
            }
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
