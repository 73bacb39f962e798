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

use clap::Parser;
use tracing::info;

use sitevins::config::settings::Settings;
use sitevins::domain::models::category::{find_category, Category, CATALOG};
use sitevins::engines::chromium::ChromiumSession;
use sitevins::infrastructure::sink::RecordSink;
use sitevins::infrastructure::storage::OutputStore;
use sitevins::pipeline::runner::ScrapeRunner;
use sitevins::utils::telemetry;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "sitevins", version, about = "Vinatis catalogue scraper")]
struct Cli {
    /// 要抓取的分类，可重复传入；缺省抓取全部内置分类
    #[arg(long = "category")]
    categories: Vec<String>,

    /// 每个分类最多翻页数
    #[arg(long)]
    max_pages: Option<u32>,

    /// 每个分类最多提取商品数
    #[arg(long)]
    max_products: Option<u32>,

    /// 结果输出目录
    #[arg(long)]
    output_dir: Option<String>,

    /// 以带界面模式启动浏览器（排查反爬问题时使用）
    #[arg(long)]
    with_head: bool,
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并执行一次抓取运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting sitevins...");

    // 2. Load configuration, CLI flags override file/env settings
    let cli = Cli::parse();
    let mut settings = Settings::new()?;
    if let Some(max_pages) = cli.max_pages {
        settings.crawl.max_pages = max_pages;
    }
    if let Some(max_products) = cli.max_products {
        settings.crawl.max_products = max_products;
    }
    if let Some(ref output_dir) = cli.output_dir {
        settings.output.data_dir = output_dir.clone();
    }
    if cli.with_head {
        settings.browser.headless = false;
    }
    info!("Configuration loaded");

    // 3. Resolve categories
    let categories: Vec<Category> = if cli.categories.is_empty() {
        CATALOG.to_vec()
    } else {
        cli.categories
            .iter()
            .map(|name| {
                find_category(name).copied().ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown category '{}', expected one of: {}",
                        name,
                        CATALOG
                            .iter()
                            .map(|c| c.name)
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })
            })
            .collect::<Result<_, _>>()?
    };
    info!(count = categories.len(), "categories resolved");

    // 4. Launch browser session
    let session = ChromiumSession::launch(&settings.browser).await?;
    info!("Browser session ready");

    // 5. Wire pipeline components and run
    let store = OutputStore::new(settings.output.data_dir.as_str());
    let debug_store = OutputStore::new(settings.output.debug_dir.as_str());
    let sink = RecordSink::new(
        store,
        settings.output.csv_file.clone(),
        settings.output.json_file.clone(),
    );

    let result = {
        let mut runner = ScrapeRunner::new(&session, &settings, sink, Some(&debug_store));
        runner.run(&categories).await
    };
    session.close().await;

    let summary = result?;
    info!(
        pages = summary.pages_walked,
        products = summary.products_extracted,
        skipped = summary.products_skipped,
        "sitevins finished"
    );
    Ok(())
}
