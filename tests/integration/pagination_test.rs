// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

use sitevins::domain::models::product::VisitedSet;
use sitevins::infrastructure::storage::OutputStore;
use sitevins::pipeline::paginator::{EndReason, ListingPaginator, PageStep, PaginationCursor};

use crate::helpers::{
    empty_listing_page, listing_page, not_found_page, test_settings, FakeSession,
};

const BASE: &str = "https://shop.test";
const CATEGORY: &str = "https://shop.test/vin-rouge";

fn paginator<'a>(
    session: &'a FakeSession,
    settings: &'a sitevins::config::settings::Settings,
) -> ListingPaginator<'a, FakeSession> {
    ListingPaginator::new(
        session,
        Url::parse(BASE).unwrap(),
        &settings.site,
        &settings.crawl,
        settings.retry.to_policy(),
        None,
    )
}

#[tokio::test]
async fn test_duplicate_hrefs_collapse_to_one_link() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a", "/vin-b", "/vin-a"]),
        )
        .with_page("https://shop.test/vin-rouge?page=2", &empty_listing_page());

    let mut visited = VisitedSet::new();
    let urls = paginator(&session, &settings)
        .list_products(CATEGORY, 10, &mut visited)
        .await;

    let collected: Vec<&str> = urls.iter().map(String::as_str).collect();
    assert_eq!(
        collected,
        vec!["https://shop.test/vin-a", "https://shop.test/vin-b"]
    );
}

#[tokio::test]
async fn test_pagination_stops_on_not_found_marker() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a", "/vin-b"]),
        )
        .with_page(
            "https://shop.test/vin-rouge?page=2",
            &listing_page(&["/vin-c"]),
        )
        .with_page(
            "https://shop.test/vin-rouge?page=3",
            &listing_page(&["/vin-d"]),
        )
        .with_page("https://shop.test/vin-rouge?page=4", &not_found_page());

    let mut visited = VisitedSet::new();
    let urls = paginator(&session, &settings)
        .list_products(CATEGORY, 10, &mut visited)
        .await;

    assert_eq!(urls.len(), 4);
    assert!(urls.contains("https://shop.test/vin-d"));

    // 终态在第4页触发，第5页从未被请求
    let log = session.nav_log();
    assert!(log.iter().any(|u| u.ends_with("page=4")));
    assert!(!log.iter().any(|u| u.ends_with("page=5")));
}

#[tokio::test]
async fn test_pagination_is_idempotent_over_fixed_fixtures() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a", "/vin-b"]),
        )
        .with_page("https://shop.test/vin-rouge?page=2", &not_found_page());

    let paginator = paginator(&session, &settings);

    let mut first_visited = VisitedSet::new();
    let first = paginator
        .list_products(CATEGORY, 10, &mut first_visited)
        .await;

    let mut second_visited = VisitedSet::new();
    let second = paginator
        .list_products(CATEGORY, 10, &mut second_visited)
        .await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pagination_respects_max_pages() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a"]),
        )
        .with_page(
            "https://shop.test/vin-rouge?page=2",
            &listing_page(&["/vin-b"]),
        );

    let mut visited = VisitedSet::new();
    let urls = paginator(&session, &settings)
        .list_products(CATEGORY, 2, &mut visited)
        .await;

    assert_eq!(urls.len(), 2);
    assert!(!session.nav_log().iter().any(|u| u.ends_with("page=3")));
}

#[tokio::test]
async fn test_already_visited_links_do_not_qualify() {
    let settings = test_settings(BASE);
    let session = FakeSession::new().with_page(
        "https://shop.test/vin-rouge?page=1",
        &listing_page(&["/vin-a"]),
    );

    let mut visited = VisitedSet::new();
    visited.insert("https://shop.test/vin-a");

    let pager = paginator(&session, &settings);
    let mut cursor = PaginationCursor::new(10);
    let step = pager.advance(CATEGORY, &mut cursor, &mut visited).await;

    // 页面加载成功但没有任何新的合格链接：翻页终止
    match step {
        PageStep::End(reason) => assert_eq!(reason, EndReason::NoNewLinks),
        PageStep::Links(links) => panic!("expected terminal step, got links {:?}", links),
    }
    assert!(cursor.is_finished());
}

#[tokio::test]
async fn test_non_product_hrefs_are_filtered_out() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a", "/actualites/foire-aux-vins", "/vin-b"]),
        )
        .with_page("https://shop.test/vin-rouge?page=2", &empty_listing_page());

    let mut visited = VisitedSet::new();
    let urls = paginator(&session, &settings)
        .list_products(CATEGORY, 10, &mut visited)
        .await;

    assert_eq!(urls.len(), 2);
    assert!(!urls.iter().any(|u| u.contains("actualites")));
}

#[tokio::test]
async fn test_fetch_failure_aborts_category_and_keeps_accumulated_urls() {
    let settings = test_settings(BASE);
    let session = FakeSession::new()
        .with_page(
            "https://shop.test/vin-rouge?page=1",
            &listing_page(&["/vin-a"]),
        )
        .failing_navigation("https://shop.test/vin-rouge?page=2", u32::MAX);

    let mut visited = VisitedSet::new();
    let urls = paginator(&session, &settings)
        .list_products(CATEGORY, 10, &mut visited)
        .await;

    // 第1页的收获保留，第2页重试耗尽后整个分类中止
    assert_eq!(urls.len(), 1);
    assert_eq!(
        session.nav_attempts("https://shop.test/vin-rouge?page=2"),
        3
    );
}

#[tokio::test]
async fn test_empty_page_writes_debug_dump() {
    let settings = test_settings(BASE);
    let dir = tempfile::tempdir().unwrap();
    let debug_store = OutputStore::new(dir.path());

    let session = FakeSession::new().with_page(
        "https://shop.test/vin-rouge?page=1",
        &empty_listing_page(),
    );

    let pager = ListingPaginator::new(
        &session,
        Url::parse(BASE).unwrap(),
        &settings.site,
        &settings.crawl,
        settings.retry.to_policy(),
        Some(&debug_store),
    );

    let mut visited = VisitedSet::new();
    let urls = pager.list_products(CATEGORY, 10, &mut visited).await;

    assert!(urls.is_empty());
    assert!(dir.path().join("page_debug_1.html").exists());
}
