// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::settings::CrawlSettings;
use crate::domain::models::product::ProductRecord;
use crate::engines::traits::{BrowserSession, SessionError};
use crate::infrastructure::storage::OutputStore;
use crate::pipeline::consent;
use crate::utils::errors::ScrapeError;
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils;

/// 详情页容器候选，出现即认为页面主体已渲染
const DETAIL_CONTAINERS: [&str; 3] = [".product-details", ".product-info", ".product-main-info"];

// 每个字段一条有序候选链，站点各模板的标记差异靠链兜住。
// 语义固定为"按特异性排序、首个产生非空文本的候选胜出"。
const NAME_CANDIDATES: &[&str] = &[
    ".product-title",
    r#"[data-testid="product-title"]"#,
    ".product-main-info h1",
    "h1.product-main-name",
];
const PRICE_CANDIDATES: &[&str] = &[
    ".product-price",
    r#"[data-testid="product-price"]"#,
    ".price-box .price",
];
const REGION_CANDIDATES: &[&str] = &[
    ".product-region",
    r#"[data-testid="product-region"]"#,
    ".product-details .region",
];
const GRAPE_CANDIDATES: &[&str] = &[
    ".product-grapes",
    r#"[data-testid="product-grapes"]"#,
    ".product-details .grapes",
];
const DESCRIPTION_CANDIDATES: &[&str] = &[
    ".product-description",
    r#"[data-testid="product-description"]"#,
    ".product-details .description",
];
const VINTAGE_CANDIDATES: &[&str] = &[
    ".product-vintage",
    r#"[data-testid="product-vintage"]"#,
    ".product-details .vintage",
];
const ALCOHOL_CANDIDATES: &[&str] = &[
    ".product-alcohol",
    r#"[data-testid="product-alcohol"]"#,
    ".product-details .alcohol",
];
const VOLUME_CANDIDATES: &[&str] = &[
    ".product-volume",
    r#"[data-testid="product-volume"]"#,
    ".product-details .volume",
];
const RATING_CANDIDATES: &[&str] = &[
    ".product-rating",
    r#"[data-testid="product-rating"]"#,
    ".product-details .rating",
];
const STOCK_CANDIDATES: &[&str] = &[
    ".product-stock",
    r#"[data-testid="product-stock"]"#,
    ".product-details .stock",
];
const BREADCRUMB_CANDIDATES: &[&str] = &[
    ".breadcrumb",
    r#"[data-testid="breadcrumb"]"#,
    ".breadcrumbs",
];
/// 主图候选，走静态标记而非活动DOM
const IMAGE_CANDIDATES: &[&str] = &["img#bigpic", ".product-image img", ".product-main-image img"];

/// 商品数字ID藏在主图路径里
static PRODUCT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(\d+)-thickbox_").expect("product id pattern is a valid regex")
});

/// 商品页提取器
///
/// 从单个商品详情页提取全部命名字段。字段缺失从不致错，
/// 只有会话级失败才让整条记录失败。
pub struct ProductExtractor<'a, S: BrowserSession + ?Sized> {
    session: &'a S,
    base: Url,
    crawl: &'a CrawlSettings,
    retry: RetryPolicy,
    debug: Option<&'a OutputStore>,
}

impl<'a, S: BrowserSession + ?Sized> ProductExtractor<'a, S> {
    pub fn new(
        session: &'a S,
        base: Url,
        crawl: &'a CrawlSettings,
        retry: RetryPolicy,
        debug: Option<&'a OutputStore>,
    ) -> Self {
        Self {
            session,
            base,
            crawl,
            retry,
            debug,
        }
    }

    /// 提取一个商品页
    ///
    /// # 返回值
    ///
    /// * `Ok(ProductRecord)` - 可能带空字段的记录
    /// * `Err(ScrapeError::ExtractionFailed)` - 页面在重试耗尽后仍取不下来
    pub async fn extract(&self, url: &str) -> Result<ProductRecord, ScrapeError> {
        self.retry
            .run("product page fetch", || self.fetch_detail(url))
            .await
            .map_err(|e| ScrapeError::ExtractionFailed {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        let mut record = ProductRecord {
            url: url.to_string(),
            ..Default::default()
        };

        record.name = self.probe("name", NAME_CANDIDATES).await;
        record.price = self.probe("price", PRICE_CANDIDATES).await;
        record.region = self.probe("region", REGION_CANDIDATES).await;
        record.grape = self.probe("grape", GRAPE_CANDIDATES).await;
        record.description = self.probe("description", DESCRIPTION_CANDIDATES).await;
        record.vintage = self.probe("vintage", VINTAGE_CANDIDATES).await;
        record.alcohol = self.probe("alcohol", ALCOHOL_CANDIDATES).await;
        record.volume = self.probe("volume", VOLUME_CANDIDATES).await;
        record.rating = self.probe("rating", RATING_CANDIDATES).await;
        record.stock = self.probe("stock", STOCK_CANDIDATES).await;
        record.category_breadcrumb = self.probe("category_breadcrumb", BREADCRUMB_CANDIDATES).await;

        // 静态标记二次提取：主图URL与其中的商品数字ID
        match self.session.page_content().await {
            Ok(html) => self.scan_static_markup(&html, &mut record),
            Err(e) => {
                tracing::warn!(url, error = %e, "static markup pass skipped");
            }
        }

        record.scraped_at = Utc::now();
        tracing::debug!(
            url,
            name = record.name.as_deref().unwrap_or(""),
            "product record finalized"
        );
        Ok(record)
    }

    async fn fetch_detail(&self, url: &str) -> Result<(), SessionError> {
        self.session.navigate(url).await?;
        consent::dismiss_consent(self.session, self.crawl.consent_timeout(), self.debug).await;

        // 容器等待是软性的：超时只记日志，字段探测照常进行
        let container = self
            .session
            .wait_for_any(&DETAIL_CONTAINERS, self.crawl.detail_timeout())
            .await?;
        if container.is_none() {
            tracing::warn!(url, "product details container did not appear before timeout");
        }
        Ok(())
    }

    /// 按候选链探测一个字段
    ///
    /// 首个产生非空修剪文本的候选胜出；整条链落空时字段留空。
    async fn probe(&self, field: &'static str, candidates: &[&str]) -> Option<String> {
        for selector in candidates {
            match self
                .session
                .first_text(selector, self.crawl.field_probe_timeout())
                .await
            {
                Ok(Some(text)) => {
                    tracing::trace!(field, selector = %selector, "field text found");
                    return Some(text);
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(field, selector = %selector, error = %e, "field probe failed");
                    continue;
                }
            }
        }
        tracing::debug!(field, "no selector candidate matched, field left unset");
        None
    }

    fn scan_static_markup(&self, html: &str, record: &mut ProductRecord) {
        let document = Html::parse_document(html);

        for selector_str in IMAGE_CANDIDATES {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            let Some(element) = document.select(&selector).next() else {
                continue;
            };
            let Some(src) = element.value().attr("src").filter(|s| !s.is_empty()) else {
                continue;
            };
            record.image_url = match url_utils::resolve_url(&self.base, src) {
                Ok(url) => Some(url.to_string()),
                Err(_) => Some(src.to_string()),
            };
            break;
        }

        if let Some(ref image_url) = record.image_url {
            record.product_id = PRODUCT_ID_RE
                .captures(image_url)
                .map(|captures| captures[1].to_string());
        }
    }
}
