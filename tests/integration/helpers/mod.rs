// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use sitevins::config::settings::{
    BrowserSettings, CrawlSettings, OutputSettings, RetrySettings, Settings, SiteSettings,
};
use sitevins::engines::traits::{BrowserSession, SessionError};

/// 脚本化的浏览器会话
///
/// 用固定HTML夹具应答全部选择器查询，选择器语义由scraper提供，
/// 与生产会话同一套CSS方言。无任何等待，超时参数被忽略。
pub struct FakeSession {
    pages: HashMap<String, String>,
    current: Mutex<Option<String>>,
    nav_failures: Mutex<HashMap<String, u32>>,
    nav_log: Mutex<Vec<String>>,
    click_log: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: Mutex::new(None),
            nav_failures: Mutex::new(HashMap::new()),
            nav_log: Mutex::new(Vec::new()),
            click_log: Mutex::new(Vec::new()),
        }
    }

    /// 注册一个URL的夹具页面
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// 让某个URL的前`times`次导航失败（`u32::MAX`表示永远失败）
    pub fn failing_navigation(self, url: &str, times: u32) -> Self {
        self.nav_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    /// 全部导航请求的顺序日志
    pub fn nav_log(&self) -> Vec<String> {
        self.nav_log.lock().unwrap().clone()
    }

    /// 对某个URL的导航尝试次数
    pub fn nav_attempts(&self, url: &str) -> usize {
        self.nav_log.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn click_log(&self) -> Vec<String> {
        self.click_log.lock().unwrap().clone()
    }

    fn current_html(&self) -> Result<String, SessionError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SessionError::Browser("no page loaded".to_string()))
    }

    fn select_in_current<T>(
        &self,
        selector: &str,
        extract: impl Fn(&Html, &Selector) -> T,
    ) -> Result<T, SessionError> {
        let html = self.current_html()?;
        let document = Html::parse_document(&html);
        let parsed = Selector::parse(selector)
            .map_err(|e| SessionError::Script(format!("bad selector {}: {:?}", selector, e)))?;
        Ok(extract(&document, &parsed))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.nav_log.lock().unwrap().push(url.to_string());

        {
            let mut failures = self.nav_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining = remaining.saturating_sub(1);
                    return Err(SessionError::Navigation(format!(
                        "scripted navigation failure for {}",
                        url
                    )));
                }
            }
        }

        match self.pages.get(url) {
            Some(html) => {
                *self.current.lock().unwrap() = Some(html.clone());
                Ok(())
            }
            None => Err(SessionError::Navigation(format!("no fixture for {}", url))),
        }
    }

    async fn page_content(&self) -> Result<String, SessionError> {
        self.current_html()
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SessionError> {
        // 滚动模拟会询问页面高度；夹具页面高度为零即可跳过滚动
        if script.contains("scrollHeight") {
            return Ok(serde_json::json!(0));
        }
        Ok(serde_json::Value::Null)
    }

    async fn wait_for_any(
        &self,
        selectors: &[&str],
        _timeout: Duration,
    ) -> Result<Option<String>, SessionError> {
        for selector in selectors {
            let found = self.select_in_current(selector, |document, parsed| {
                document.select(parsed).next().is_some()
            })?;
            if found {
                return Ok(Some((*selector).to_string()));
            }
        }
        Ok(None)
    }

    async fn first_text(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, SessionError> {
        self.select_in_current(selector, |document, parsed| {
            document.select(parsed).next().and_then(|element| {
                let text = element.text().collect::<Vec<_>>().join(" ");
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        })
    }

    async fn collect_attr(
        &self,
        selector: &str,
        attr: &str,
    ) -> Result<Vec<String>, SessionError> {
        self.select_in_current(selector, |document, parsed| {
            document
                .select(parsed)
                .filter_map(|element| element.value().attr(attr))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    async fn click(&self, selector: &str, _timeout: Duration) -> Result<bool, SessionError> {
        self.click_log.lock().unwrap().push(selector.to_string());
        Ok(false)
    }
}

/// 测试配置：零节奏、零等待、退避压到毫秒级
pub fn test_settings(base_url: &str) -> Settings {
    Settings {
        site: SiteSettings {
            base_url: base_url.to_string(),
            product_path_marker: "/vin-".to_string(),
            not_found_marker: "Page non trouvée".to_string(),
        },
        browser: BrowserSettings {
            headless: true,
            window_width: 1280,
            window_height: 800,
            request_timeout_secs: 5,
            remote_debugging_url: None,
        },
        crawl: CrawlSettings {
            max_pages: 5,
            max_products: 50,
            checkpoint_interval: 10,
            grid_timeout_secs: 0,
            detail_timeout_secs: 0,
            field_probe_timeout_secs: 0,
            consent_timeout_secs: 0,
            product_pause_min_ms: 0,
            product_pause_max_ms: 0,
            page_pause_min_ms: 0,
            page_pause_max_ms: 0,
        },
        retry: RetrySettings {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        },
        output: OutputSettings {
            data_dir: "./unused".to_string(),
            debug_dir: "./unused-debug".to_string(),
            csv_file: "vinatis_data.csv".to_string(),
            json_file: "vinatis_data.json".to_string(),
        },
    }
}

/// 带商品栅格的列表页夹具
pub fn listing_page(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a class="product-link" href="{}">bouteille</a>"#, href))
        .collect();
    format!(
        r#"<html><body><div class="product-list">{}</div></body></html>"#,
        links
    )
}

/// 栅格存在但没有任何链接的列表页夹具
pub fn empty_listing_page() -> String {
    r#"<html><body><div class="product-list"></div></body></html>"#.to_string()
}

/// 带"未找到"标记的页面夹具
pub fn not_found_page() -> String {
    r#"<html><body><h1>Page non trouvée</h1></body></html>"#.to_string()
}

/// 商品详情页夹具
///
/// 名称与价格都只在各自候选链的第三个选择器下可见，
/// 主图路径携带可提取的商品数字ID。
pub fn detail_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
    <div class="product-main-info"><h1>{}</h1></div>
    <div class="price-box"><span class="price">{}</span></div>
    <img id="bigpic" src="/38721-thickbox_default/bottle.jpg"/>
</body></html>"#,
        name, price
    )
}
