// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

use sitevins::pipeline::extractor::ProductExtractor;
use sitevins::utils::errors::ScrapeError;

use crate::helpers::{detail_page, test_settings, FakeSession};

const BASE: &str = "https://shop.test";
const PRODUCT: &str = "https://shop.test/vin-a";

fn extractor<'a>(
    session: &'a FakeSession,
    settings: &'a sitevins::config::settings::Settings,
) -> ProductExtractor<'a, FakeSession> {
    ProductExtractor::new(
        session,
        Url::parse(BASE).unwrap(),
        &settings.crawl,
        settings.retry.to_policy(),
        None,
    )
}

#[tokio::test]
async fn test_fields_found_via_third_selector_candidate() {
    let settings = test_settings(BASE);
    let session =
        FakeSession::new().with_page(PRODUCT, &detail_page("Château Margaux 2018", "24,90 €"));

    let record = extractor(&session, &settings).extract(PRODUCT).await.unwrap();

    // 夹具页面上名称与价格都只在第三个候选选择器下可见
    assert_eq!(record.name.as_deref(), Some("Château Margaux 2018"));
    assert_eq!(record.price.as_deref(), Some("24,90 €"));
}

#[tokio::test]
async fn test_missing_fields_are_none_never_fatal() {
    let settings = test_settings(BASE);
    let session =
        FakeSession::new().with_page(PRODUCT, &detail_page("Château Margaux 2018", "24,90 €"));

    let record = extractor(&session, &settings).extract(PRODUCT).await.unwrap();

    assert_eq!(record.url, PRODUCT);
    assert!(record.region.is_none());
    assert!(record.grape.is_none());
    assert!(record.vintage.is_none());
    assert!(record.stock.is_none());
    // 记录定稿时间戳已敲定
    assert!(record.scraped_at.timestamp() > 0);
}

#[tokio::test]
async fn test_static_markup_pass_recovers_image_and_product_id() {
    let settings = test_settings(BASE);
    let session =
        FakeSession::new().with_page(PRODUCT, &detail_page("Château Margaux 2018", "24,90 €"));

    let record = extractor(&session, &settings).extract(PRODUCT).await.unwrap();

    assert_eq!(
        record.image_url.as_deref(),
        Some("https://shop.test/38721-thickbox_default/bottle.jpg")
    );
    assert_eq!(record.product_id.as_deref(), Some("38721"));
}

#[tokio::test]
async fn test_navigation_failure_surfaces_as_extraction_failed() {
    let settings = test_settings(BASE);
    let session = FakeSession::new().failing_navigation(PRODUCT, u32::MAX);

    let result = extractor(&session, &settings).extract(PRODUCT).await;

    match result {
        Err(ScrapeError::ExtractionFailed { url, .. }) => assert_eq!(url, PRODUCT),
        other => panic!("expected ExtractionFailed, got {:?}", other.map(|_| ())),
    }
    // 重试策略的边界：恰好3次导航尝试
    assert_eq!(session.nav_attempts(PRODUCT), 3);
}

#[tokio::test]
async fn test_consent_refusal_never_blocks_extraction() {
    let settings = test_settings(BASE);
    let session =
        FakeSession::new().with_page(PRODUCT, &detail_page("Château Margaux 2018", "24,90 €"));

    let record = extractor(&session, &settings).extract(PRODUCT).await.unwrap();

    // 所有同意定位策略都落空（click恒为false），提取仍然成功
    assert!(!session.click_log().is_empty());
    assert!(record.name.is_some());
}
