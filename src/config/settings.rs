// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::utils::retry_policy::RetryPolicy;

/// 应用程序配置设置
///
/// 包含目标站点、浏览器、抓取节奏、重试和输出等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 目标站点配置
    pub site: SiteSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 抓取节奏与超时配置
    pub crawl: CrawlSettings,
    /// 重试配置
    pub retry: RetrySettings,
    /// 输出配置
    pub output: OutputSettings,
}

/// 目标站点配置设置
#[derive(Debug, Deserialize)]
pub struct SiteSettings {
    /// 站点根URL
    pub base_url: String,
    /// 商品详情页URL的固定路径标记
    pub product_path_marker: String,
    /// 页面不存在时的本地化标记文本
    pub not_found_marker: String,
}

/// 浏览器配置设置
#[derive(Debug, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式
    pub headless: bool,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
    /// 浏览器请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 远程调试地址（可选，设置后连接已有Chrome实例）
    pub remote_debugging_url: Option<String>,
}

/// 抓取节奏与超时配置设置
#[derive(Debug, Deserialize)]
pub struct CrawlSettings {
    /// 每个分类最多翻页数
    pub max_pages: u32,
    /// 每个分类最多提取商品数
    pub max_products: u32,
    /// 检查点间隔（每处理多少个列表页落一次盘）
    pub checkpoint_interval: u32,
    /// 列表页商品栅格出现的有界等待（秒）
    pub grid_timeout_secs: u64,
    /// 详情页容器出现的有界等待（秒），软性超时
    pub detail_timeout_secs: u64,
    /// 单字段选择器探测的有界等待（秒）
    pub field_probe_timeout_secs: u64,
    /// Cookie同意按钮的有界等待（秒）
    pub consent_timeout_secs: u64,
    /// 商品间暂停下限（毫秒）
    pub product_pause_min_ms: u64,
    /// 商品间暂停上限（毫秒）
    pub product_pause_max_ms: u64,
    /// 列表页间暂停下限（毫秒）
    pub page_pause_min_ms: u64,
    /// 列表页间暂停上限（毫秒）
    pub page_pause_max_ms: u64,
}

impl CrawlSettings {
    pub fn grid_timeout(&self) -> Duration {
        Duration::from_secs(self.grid_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn field_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.field_probe_timeout_secs)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_secs(self.consent_timeout_secs)
    }
}

/// 重试配置设置
#[derive(Debug, Deserialize)]
pub struct RetrySettings {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 初始退避时间（毫秒）
    pub initial_backoff_ms: u64,
    /// 最大退避时间（毫秒）
    pub max_backoff_ms: u64,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
}

impl RetrySettings {
    /// 转换为运行期重试策略
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter_factor: self.jitter_factor,
            enable_jitter: self.jitter_factor > 0.0,
        }
    }
}

/// 输出配置设置
#[derive(Debug, Deserialize)]
pub struct OutputSettings {
    /// 结果与检查点输出目录
    pub data_dir: String,
    /// 调试页面转储目录
    pub debug_dir: String,
    /// CSV结果文件名
    pub csv_file: String,
    /// JSON结果文件名
    pub json_file: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件和环境变量分层加载
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default site settings
            .set_default("site.base_url", "https://www.vinatis.com")?
            .set_default("site.product_path_marker", "/vin-")?
            .set_default("site.not_found_marker", "Page non trouvée")?
            // Default browser settings
            .set_default("browser.headless", true)?
            .set_default("browser.window_width", 1920)?
            .set_default("browser.window_height", 1080)?
            .set_default("browser.request_timeout_secs", 30)?
            // Default crawl settings
            .set_default("crawl.max_pages", 5)?
            .set_default("crawl.max_products", 50)?
            .set_default("crawl.checkpoint_interval", 10)?
            .set_default("crawl.grid_timeout_secs", 20)?
            .set_default("crawl.detail_timeout_secs", 20)?
            .set_default("crawl.field_probe_timeout_secs", 3)?
            .set_default("crawl.consent_timeout_secs", 5)?
            .set_default("crawl.product_pause_min_ms", 1000)?
            .set_default("crawl.product_pause_max_ms", 3000)?
            .set_default("crawl.page_pause_min_ms", 4000)?
            .set_default("crawl.page_pause_max_ms", 6000)?
            // Default retry settings
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.initial_backoff_ms", 1000)?
            .set_default("retry.max_backoff_ms", 60000)?
            .set_default("retry.backoff_multiplier", 2.0)?
            .set_default("retry.jitter_factor", 0.1)?
            // Default output settings
            .set_default("output.data_dir", "./output")?
            .set_default("output.debug_dir", "./debug")?
            .set_default("output.csv_file", "vinatis_data.csv")?
            .set_default("output.json_file", "vinatis_data.json")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SITEVINS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
