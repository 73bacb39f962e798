// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;

use crate::domain::models::product::ProductRecord;
use crate::infrastructure::storage::OutputStore;
use crate::utils::errors::ScrapeError;

/// 记录落盘器
///
/// 运行期间在内存中累积商品记录，结束时或按检查点节奏
/// 序列化为CSV/JSON。追加进来的记录视为不可变，运行内不删除。
pub struct RecordSink {
    records: Vec<ProductRecord>,
    store: OutputStore,
    csv_file: String,
    json_file: String,
}

impl RecordSink {
    pub fn new(store: OutputStore, csv_file: impl Into<String>, json_file: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            store,
            csv_file: csv_file.into(),
            json_file: json_file.into(),
        }
    }

    pub fn append(&mut self, record: ProductRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// 全量CSV落盘，覆盖目标文件
    ///
    /// 列顺序即 `ProductRecord` 字段顺序，缺失字段写为空串。
    pub async fn flush_csv(&self) -> Result<PathBuf, ScrapeError> {
        let bytes = self.to_csv_bytes()?;
        let path = self.store.save(&self.csv_file, &bytes).await?;
        tracing::info!(records = self.records.len(), path = %path.display(), "csv flushed");
        Ok(path)
    }

    /// 全量JSON落盘，覆盖目标文件
    ///
    /// 缩进输出，非ASCII文本原样保留。
    pub async fn flush_json(&self) -> Result<PathBuf, ScrapeError> {
        let bytes = self.to_json_bytes()?;
        let path = self.store.save(&self.json_file, &bytes).await?;
        tracing::info!(records = self.records.len(), path = %path.display(), "json flushed");
        Ok(path)
    }

    /// 按列表页号命名的检查点CSV，限制运行后期崩溃的数据损失
    pub async fn checkpoint(&self, page: u32) -> Result<PathBuf, ScrapeError> {
        let key = format!("vinatis_products_page_{}.csv", page);
        let bytes = self.to_csv_bytes()?;
        let path = self.store.save(&key, &bytes).await?;
        tracing::info!(page, records = self.records.len(), "checkpoint written");
        Ok(path)
    }

    fn to_csv_bytes(&self) -> Result<Vec<u8>, ScrapeError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|e| ScrapeError::Storage(e.into_error()))
    }

    fn to_json_bytes(&self) -> Result<Vec<u8>, ScrapeError> {
        let mut bytes = serde_json::to_vec_pretty(&self.records)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
