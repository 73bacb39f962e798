// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

use crate::config::settings::Settings;
use crate::domain::models::category::Category;
use crate::domain::models::product::{RunSummary, VisitedSet};
use crate::engines::traits::BrowserSession;
use crate::infrastructure::sink::RecordSink;
use crate::infrastructure::storage::OutputStore;
use crate::pipeline::consent;
use crate::pipeline::extractor::ProductExtractor;
use crate::pipeline::pacing;
use crate::pipeline::paginator::{ListingPaginator, PageStep, PaginationCursor};
use crate::utils::errors::ScrapeError;
use crate::utils::url_utils;

/// 抓取运行器
///
/// 串起整条管线：一个浏览器会话、一个分类接一个分类、
/// 一个商品接一个商品，期间严格串行。单页/单商品的失败
/// 只降级为部分结果，从不让整次运行中止。
pub struct ScrapeRunner<'a, S: BrowserSession + ?Sized> {
    session: &'a S,
    settings: &'a Settings,
    sink: RecordSink,
    visited: VisitedSet,
    debug: Option<&'a OutputStore>,
}

impl<'a, S: BrowserSession + ?Sized> ScrapeRunner<'a, S> {
    pub fn new(
        session: &'a S,
        settings: &'a Settings,
        sink: RecordSink,
        debug: Option<&'a OutputStore>,
    ) -> Self {
        Self {
            session,
            settings,
            sink,
            visited: VisitedSet::new(),
            debug,
        }
    }

    /// 执行一次完整抓取
    ///
    /// # 参数
    ///
    /// * `categories` - 要走的分类列表
    ///
    /// # 返回值
    ///
    /// * `Ok(RunSummary)` - 运行统计
    /// * `Err(ScrapeError)` - 配置无效或最终落盘失败
    pub async fn run(&mut self, categories: &[Category]) -> Result<RunSummary, ScrapeError> {
        let base = Url::parse(&self.settings.site.base_url)
            .map_err(|e| ScrapeError::Config(format!("invalid site.base_url: {}", e)))?;
        let retry = self.settings.retry.to_policy();

        let paginator = ListingPaginator::new(
            self.session,
            base.clone(),
            &self.settings.site,
            &self.settings.crawl,
            retry.clone(),
            self.debug,
        );
        let extractor = ProductExtractor::new(
            self.session,
            base.clone(),
            &self.settings.crawl,
            retry,
            self.debug,
        );

        // 首页预热，Cookie浮层在这里第一次被处理
        self.session.navigate(base.as_str()).await?;
        consent::dismiss_consent(
            self.session,
            self.settings.crawl.consent_timeout(),
            self.debug,
        )
        .await;

        let mut summary = RunSummary::default();
        for category in categories {
            let category_url = url_utils::resolve_url(&base, category.path)
                .map_err(|e| ScrapeError::Config(format!("invalid category path: {}", e)))?;
            tracing::info!(category = category.name, url = %category_url, "category scrape started");

            let mut cursor = PaginationCursor::new(self.settings.crawl.max_pages);
            let mut extracted_in_category = 0u32;

            'pages: loop {
                match paginator
                    .advance(category_url.as_str(), &mut cursor, &mut self.visited)
                    .await
                {
                    PageStep::Links(links) => {
                        summary.pages_walked += 1;

                        for url in links {
                            if extracted_in_category >= self.settings.crawl.max_products {
                                tracing::info!(
                                    category = category.name,
                                    cap = self.settings.crawl.max_products,
                                    "product cap reached"
                                );
                                break 'pages;
                            }
                            match extractor.extract(&url).await {
                                Ok(record) => {
                                    self.sink.append(record);
                                    extracted_in_category += 1;
                                    summary.products_extracted += 1;
                                }
                                Err(e) => {
                                    tracing::warn!(url = %url, error = %e, "product skipped");
                                    summary.products_skipped += 1;
                                }
                            }
                            pacing::pause_between(
                                self.settings.crawl.product_pause_min_ms,
                                self.settings.crawl.product_pause_max_ms,
                            )
                            .await;
                        }

                        let interval = self.settings.crawl.checkpoint_interval;
                        if interval > 0 && summary.pages_walked % interval == 0 {
                            self.sink.checkpoint(summary.pages_walked).await?;
                        }
                        pacing::pause_between(
                            self.settings.crawl.page_pause_min_ms,
                            self.settings.crawl.page_pause_max_ms,
                        )
                        .await;
                    }
                    PageStep::End(reason) => {
                        tracing::info!(
                            category = category.name,
                            ?reason,
                            "category pagination ended"
                        );
                        break;
                    }
                }
            }

            tracing::info!(
                category = category.name,
                extracted = extracted_in_category,
                "category scrape finished"
            );
        }

        self.sink.flush_csv().await?;
        self.sink.flush_json().await?;

        tracing::info!(
            pages = summary.pages_walked,
            extracted = summary.products_extracted,
            skipped = summary.products_skipped,
            "scrape run complete"
        );
        Ok(summary)
    }

    pub fn sink(&self) -> &RecordSink {
        &self.sink
    }
}
