// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserSession, SessionError};

/// 选择器轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 桌面端User-Agent池，每个会话随机取一个
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
];

// navigator.webdriver 在每次导航后都会重新出现，需逐页重新屏蔽
const MASK_WEBDRIVER: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    });
"#;

/// Chromium会话
///
/// 基于chromiumoxide实现的浏览器会话，整个运行期间
/// 持有单个页面，所有导航串行复用同一页面。
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
}

impl ChromiumSession {
    /// 启动浏览器并打开初始页面
    ///
    /// # 参数
    ///
    /// * `settings` - 浏览器配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ChromiumSession)` - 就绪的会话
    /// * `Err(SessionError)` - 浏览器启动或建页失败
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, SessionError> {
        let (browser, mut handler) = if let Some(ref url) = settings.remote_debugging_url {
            tracing::info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| SessionError::Browser(format!("remote connect failed: {}", e)))?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .window_size(settings.window_width, settings.window_height)
                .request_timeout(Duration::from_secs(settings.request_timeout_secs))
                .args(vec![
                    "--disable-blink-features=AutomationControlled",
                    "--disable-gpu",
                    "--disable-dev-shm-usage",
                    "--disable-extensions",
                    "--disable-infobars",
                    "--disable-notifications",
                    "--disable-popup-blocking",
                    "--disable-translate",
                    "--no-first-run",
                    "--no-service-autorun",
                    "--password-store=basic",
                    "--use-mock-keychain",
                ]);
            if !settings.headless {
                builder = builder.with_head();
            }

            Browser::launch(
                builder
                    .build()
                    .map_err(|e| SessionError::Browser(e.to_string()))?,
            )
            .await
            .map_err(|e| SessionError::Browser(e.to_string()))?
        };

        // Spawn a handler to process browser events
        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Browser(e.to_string()))?;

        let user_agent = USER_AGENTS[rand::random_range(0..USER_AGENTS.len())];
        page.set_user_agent(user_agent)
            .await
            .map_err(|e| SessionError::Browser(e.to_string()))?;
        tracing::debug!(user_agent, "session user agent selected");

        Ok(Self { browser, page })
    }

    /// 关闭浏览器
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;

        // best-effort, masking failure must not fail the navigation
        let _ = self.page.evaluate(MASK_WEBDRIVER).await;
        Ok(())
    }

    async fn page_content(&self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Browser(e.to_string()))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SessionError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<Option<String>, SessionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            for selector in selectors {
                if self.page.find_element(*selector).await.is_ok() {
                    return Ok(Some((*selector).to_string()));
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn first_text(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, SessionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                if let Ok(Some(text)) = element.inner_text().await {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Ok(Some(trimmed.to_string()));
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn collect_attr(
        &self,
        selector: &str,
        attr: &str,
    ) -> Result<Vec<String>, SessionError> {
        let elements = match self.page.find_elements(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!(selector, error = %e, "selector matched no elements");
                return Ok(Vec::new());
            }
        };

        let mut values = Vec::new();
        for element in elements {
            if let Ok(Some(value)) = element.attribute(attr).await {
                if !value.is_empty() {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<bool, SessionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                let _ = element.scroll_into_view().await;
                match element.click().await {
                    Ok(_) => return Ok(true),
                    Err(e) => {
                        tracing::debug!(selector, error = %e, "element found but click failed");
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
