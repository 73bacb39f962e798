// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeSet;
use url::Url;

use crate::config::settings::{CrawlSettings, SiteSettings};
use crate::domain::models::product::VisitedSet;
use crate::engines::traits::{BrowserSession, SessionError};
use crate::infrastructure::storage::OutputStore;
use crate::pipeline::{consent, pacing};
use crate::utils::retry_policy::RetryPolicy;
use crate::utils::url_utils;

/// 商品栅格候选选择器，按特异性降序，先命中先用
const GRID_CANDIDATES: [&str; 4] = [
    ".product-list",
    ".product-grid",
    ".product-items",
    ".product-card",
];

/// 商品链接候选选择器，按特异性降序
///
/// 站点不同板块的模板标记不一致，靠候选链兜住，
/// 链接是否入选最终只由路径标记过滤决定。
const LINK_CANDIDATES: [&str; 8] = [
    ".product-card a.product-link",
    ".product-item a.product-link",
    ".product-list a[href*='/vin-']",
    ".product-grid a[href*='/vin-']",
    "a[href*='/vin-'][data-testid='product-link']",
    ".product-items a[href*='/vin-']",
    "a.product-thumbnail",
    ".product a[href*='/vin-']",
];

/// 分类翻页的终止原因
///
/// 这些都是成功的终态，不是错误；终止后该分类不再恢复翻页。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// 达到页数上限
    MaxPages,
    /// 页面带"未找到"标记
    NotFound,
    /// 已加载页面上没有新的合格链接
    NoNewLinks,
    /// 重试耗尽后页面仍取不下来
    FetchFailed,
}

/// 单次翻页的结果
#[derive(Debug)]
pub enum PageStep {
    /// 本页新发现的商品URL
    Links(Vec<String>),
    /// 翻页终止
    End(EndReason),
}

/// 分类翻页游标
///
/// 页号从1起每次严格加1；任一终止条件触发后永久停住。
#[derive(Debug)]
pub struct PaginationCursor {
    page: u32,
    max_pages: u32,
    collected: BTreeSet<String>,
    end: Option<EndReason>,
}

impl PaginationCursor {
    pub fn new(max_pages: u32) -> Self {
        Self {
            page: 1,
            max_pages,
            collected: BTreeSet::new(),
            end: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end
    }

    pub fn collected(&self) -> &BTreeSet<String> {
        &self.collected
    }

    pub fn into_collected(self) -> BTreeSet<String> {
        self.collected
    }

    fn finish(&mut self, reason: EndReason) {
        self.end = Some(reason);
    }

    fn advance_page(&mut self, links: &[String]) {
        self.collected.extend(links.iter().cloned());
        self.page += 1;
    }
}

/// 列表页翻页器
///
/// 沿一个分类的分页列表走页，产出去重后的商品详情URL。
pub struct ListingPaginator<'a, S: BrowserSession + ?Sized> {
    session: &'a S,
    base: Url,
    site: &'a SiteSettings,
    crawl: &'a CrawlSettings,
    retry: RetryPolicy,
    debug: Option<&'a OutputStore>,
}

impl<'a, S: BrowserSession + ?Sized> ListingPaginator<'a, S> {
    pub fn new(
        session: &'a S,
        base: Url,
        site: &'a SiteSettings,
        crawl: &'a CrawlSettings,
        retry: RetryPolicy,
        debug: Option<&'a OutputStore>,
    ) -> Self {
        Self {
            session,
            base,
            site,
            crawl,
            retry,
            debug,
        }
    }

    /// 向前走一页
    ///
    /// 取页操作由重试策略包裹；重试耗尽即终止本分类的翻页，
    /// 已收集的URL保留在游标里。跨页不做自动重试，站点结构
    /// 变更需要运维介入而不是机器自愈。
    pub async fn advance(
        &self,
        category_url: &str,
        cursor: &mut PaginationCursor,
        visited: &mut VisitedSet,
    ) -> PageStep {
        if let Some(reason) = cursor.end_reason() {
            return PageStep::End(reason);
        }
        if cursor.page() > cursor.max_pages {
            cursor.finish(EndReason::MaxPages);
            return PageStep::End(EndReason::MaxPages);
        }

        let page_no = cursor.page();
        let page_url = url_utils::with_page_param(category_url, page_no);
        tracing::info!(page = page_no, url = %page_url, "loading listing page");

        let fetched = self
            .retry
            .run("listing page fetch", || self.fetch_listing(&page_url))
            .await;
        let (html, grid) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(page = page_no, error = %e, "listing page unreachable, category aborted");
                cursor.finish(EndReason::FetchFailed);
                return PageStep::End(EndReason::FetchFailed);
            }
        };

        if html.contains(&self.site.not_found_marker) {
            tracing::info!(page = page_no, "not-found marker present, end of category");
            cursor.finish(EndReason::NotFound);
            return PageStep::End(EndReason::NotFound);
        }

        let links = if grid.is_some() {
            self.harvest_links(visited).await
        } else {
            tracing::warn!(page = page_no, "no product grid appeared before timeout");
            Vec::new()
        };

        if links.is_empty() {
            // 真实目录结尾与站点结构变更在这里无法区分，转储页面交给人工判断
            if let Some(store) = self.debug {
                store
                    .dump_markup(&format!("page_debug_{}.html", page_no), &html)
                    .await;
            }
            tracing::info!(page = page_no, "no new qualifying links, end of category");
            cursor.finish(EndReason::NoNewLinks);
            return PageStep::End(EndReason::NoNewLinks);
        }

        tracing::info!(page = page_no, links = links.len(), "listing page harvested");
        cursor.advance_page(&links);
        PageStep::Links(links)
    }

    /// 走完整个分类并返回收集到的URL集合
    pub async fn list_products(
        &self,
        category_url: &str,
        max_pages: u32,
        visited: &mut VisitedSet,
    ) -> BTreeSet<String> {
        let mut cursor = PaginationCursor::new(max_pages);
        loop {
            match self.advance(category_url, &mut cursor, visited).await {
                PageStep::Links(_) => continue,
                PageStep::End(reason) => {
                    tracing::info!(?reason, pages = cursor.page() - 1, "pagination ended");
                    break;
                }
            }
        }
        cursor.into_collected()
    }

    async fn fetch_listing(&self, url: &str) -> Result<(String, Option<String>), SessionError> {
        self.session.navigate(url).await?;
        consent::dismiss_consent(self.session, self.crawl.consent_timeout(), self.debug).await;
        pacing::human_scroll(self.session).await;

        let grid = self
            .session
            .wait_for_any(&GRID_CANDIDATES, self.crawl.grid_timeout())
            .await?;
        if let Some(ref selector) = grid {
            tracing::debug!(selector = %selector, "product grid located");
        }

        let html = self.session.page_content().await?;
        Ok((html, grid))
    }

    /// 按候选链收割本页的商品链接
    ///
    /// 首个返回非空href集的选择器胜出；之后链接要入选还须
    /// 同时满足：含商品路径标记、未在已访问集合中出现过。
    async fn harvest_links(&self, visited: &mut VisitedSet) -> Vec<String> {
        for selector in LINK_CANDIDATES {
            let hrefs = match self.session.collect_attr(selector, "href").await {
                Ok(hrefs) => hrefs,
                Err(e) => {
                    tracing::debug!(selector, error = %e, "link probe failed");
                    continue;
                }
            };
            if hrefs.is_empty() {
                continue;
            }
            tracing::debug!(selector, count = hrefs.len(), "links found with selector");

            let mut fresh = Vec::new();
            for href in hrefs {
                let absolute = match url_utils::resolve_url(&self.base, &href) {
                    Ok(url) => url.to_string(),
                    Err(e) => {
                        tracing::debug!(href = %href, error = %e, "href not resolvable, ignored");
                        continue;
                    }
                };
                if !absolute.contains(&self.site.product_path_marker) {
                    continue;
                }
                if visited.insert(&absolute) {
                    tracing::debug!(url = %absolute, "new product link");
                    fresh.push(absolute);
                }
            }
            return fresh;
        }
        Vec::new()
    }
}
